use crate::math::{quad_area_3d, Point3};

/// Edges at or below this length make the aspect term zero.
const MIN_EDGE: f64 = 1e-9;

/// Areas at or below this make the area term zero.
const MIN_AREA: f64 = 1e-12;

const ASPECT_WEIGHT: f64 = 0.5;
const ORTHOGONALITY_WEIGHT: f64 = 0.4;
const AREA_WEIGHT: f64 = 0.1;

/// Breakdown of a quad quality score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityTerms {
    /// Shortest over longest edge.
    pub aspect: f64,
    /// Mean corner score, 1.0 for right angles.
    pub orthogonality: f64,
    /// 1.0 for non-degenerate area, else 0.0.
    pub area_validity: f64,
}

impl QualityTerms {
    /// Weighted score in `[0, 1]`.
    #[must_use]
    pub fn score(&self) -> f64 {
        (ASPECT_WEIGHT * self.aspect
            + ORTHOGONALITY_WEIGHT * self.orthogonality
            + AREA_WEIGHT * self.area_validity)
            .clamp(0.0, 1.0)
    }
}

/// Computes the individual quality terms of a quad.
#[must_use]
pub fn quality_terms(quad: &[Point3; 4]) -> QualityTerms {
    let edges = [
        quad[1] - quad[0],
        quad[2] - quad[1],
        quad[3] - quad[2],
        quad[0] - quad[3],
    ];
    let lengths = edges.map(|e| e.norm());

    let min_edge = lengths.iter().copied().fold(f64::INFINITY, f64::min);
    let max_edge = lengths.iter().copied().fold(0.0, f64::max);
    let aspect = if min_edge <= MIN_EDGE {
        0.0
    } else {
        min_edge / max_edge
    };

    let mut corner_sum = 0.0;
    for i in 0..4 {
        let incoming = edges[(i + 3) % 4];
        let outgoing = edges[i];
        let denom = lengths[(i + 3) % 4] * lengths[i];
        if denom > MIN_EDGE * MIN_EDGE {
            // Interior angle θ between -incoming and outgoing; |cos θ| is 0 at 90°.
            let cos = (-incoming).dot(&outgoing) / denom;
            corner_sum += 1.0 - cos.abs().min(1.0);
        }
    }
    let orthogonality = corner_sum / 4.0;

    let area = quad_area_3d(quad);
    let area_validity = if area > MIN_AREA { 1.0 } else { 0.0 };

    QualityTerms {
        aspect,
        orthogonality,
        area_validity,
    }
}

/// Scores a quad in `[0, 1]`.
///
/// `score = 0.5·aspect + 0.4·orthogonality + 0.1·areaValidity`.
#[must_use]
pub fn score_quad(quad: &[Point3; 4]) -> f64 {
    quality_terms(quad).score()
}

/// Scores a batch of quads.
///
/// Runs the same kernel as [`score_quad`], so results are identical.
#[must_use]
pub fn score_quads(quads: &[[Point3; 4]]) -> Vec<f64> {
    quads.iter().map(score_quad).collect()
}
