#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

use std::mem::size_of;
use std::thread;

use crate::geometry::{Polygon2D, PrismStructure};
use crate::mesh::{Quad, Triangle};
use crate::options::MesherOptions;

use super::mesh_prism::CapStrategy;

/// Faces meshed per millisecond on one thread.
const FACES_PER_MS: f64 = 2_000.0;

/// Faces per worker thread below which extra threads do not pay off.
const FACES_PER_THREAD: usize = 50_000;

/// Above this many faces a structure is better meshed as part of a batch.
const BATCH_THRESHOLD: usize = 200_000;

/// Share of a generic cap left as unpaired triangles.
const GENERIC_TRIANGLE_SHARE: f64 = 0.15;

/// Rough size and cost of meshing one structure, computed without meshing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexityEstimate {
    pub quads: usize,
    pub triangles: usize,
    pub memory_bytes: usize,
    pub time_ms: f64,
    pub recommended_parallelism: usize,
}

impl ComplexityEstimate {
    /// Estimates the output of meshing `structure` with `options`.
    ///
    /// Options are not validated; non-positive target lengths are treated as
    /// producing a single span.
    #[must_use]
    pub fn estimate(structure: &PrismStructure, options: &MesherOptions) -> Self {
        let xy = options.target_edge_length_xy();
        let height = structure.top_elevation() - structure.base_elevation();
        let feature_levels = structure.internal_surfaces().len()
            + structure.points().len()
            + 2 * structure.segments().len()
            + structure.constraint_segments().len();
        let level_pairs = spans(height, options.target_edge_length_z()) + feature_levels;

        let mut perimeter_spans = loop_spans(structure.footprint(), xy);
        perimeter_spans += structure
            .holes()
            .iter()
            .map(|h| loop_spans(h, xy))
            .sum::<usize>();
        let side_quads = perimeter_spans * level_pairs;

        let hole_area: f64 = structure.holes().iter().map(Polygon2D::area).sum();
        let cap_cells = cells(structure.footprint().area() - hole_area, xy);
        let cap_count =
            usize::from(options.generate_bottom_cap()) + usize::from(options.generate_top_cap());

        let (cap_quads, cap_triangles) = match CapStrategy::select(structure, options) {
            CapStrategy::AdaptiveGrid(_) => (cap_cells * cap_count, 0),
            CapStrategy::Generic => split_generic(cap_cells * cap_count),
        };

        let (internal_quads, internal_triangles) = structure
            .internal_surfaces()
            .iter()
            .map(|s| {
                let holes: f64 = s.holes.iter().map(Polygon2D::area).sum();
                split_generic(cells(s.outer.area() - holes, xy))
            })
            .fold((0, 0), |(q, t), (sq, st)| (q + sq, t + st));

        let quads = side_quads + cap_quads + internal_quads;
        let triangles = cap_triangles + internal_triangles;
        let faces = quads + triangles;

        let available = thread::available_parallelism().map_or(1, usize::from);
        Self {
            quads,
            triangles,
            memory_bytes: quads * size_of::<Quad>() + triangles * size_of::<Triangle>(),
            time_ms: faces as f64 / FACES_PER_MS,
            recommended_parallelism: (faces / FACES_PER_THREAD).clamp(1, available),
        }
    }

    /// Total estimated faces.
    #[must_use]
    pub fn faces(&self) -> usize {
        self.quads + self.triangles
    }

    /// Returns `true` when the structure is large enough that meshing it
    /// alongside others in a batch is worthwhile.
    #[must_use]
    pub fn prefers_batched(&self) -> bool {
        self.faces() > BATCH_THRESHOLD
    }
}

fn spans(length: f64, target: f64) -> usize {
    if target > 0.0 && length.is_finite() && length > 0.0 {
        ((length / target).ceil() as usize).max(1)
    } else {
        1
    }
}

fn loop_spans(polygon: &Polygon2D, target: f64) -> usize {
    polygon.edges().map(|(a, b)| spans((b - a).norm(), target)).sum()
}

fn cells(area: f64, target: f64) -> usize {
    if target > 0.0 && area > 0.0 {
        (area / (target * target)).ceil() as usize
    } else {
        0
    }
}

/// Splits a generic cap's cell count into quads and leftover triangles.
fn split_generic(cells: usize) -> (usize, usize) {
    let triangles = (cells as f64 * 2.0 * GENERIC_TRIANGLE_SHARE).round() as usize;
    let quads = cells.saturating_sub(triangles / 2);
    (quads, triangles)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cancel::CancellationToken;
    use crate::math::Point2;
    use crate::operations::MeshPrism;

    fn rect(w: f64, h: f64) -> Polygon2D {
        Polygon2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(w, 0.0),
            Point2::new(w, h),
            Point2::new(0.0, h),
        ])
        .unwrap()
    }

    #[test]
    fn rectangle_estimate_matches_mesh() {
        let s = PrismStructure::new(rect(20.0, 10.0), -5.0, 5.0).unwrap();
        let options = MesherOptions::default().with_target_edge_lengths(2.0, 2.0);
        let estimate = ComplexityEstimate::estimate(&s, &options);
        let out = MeshPrism::new(&s, &options)
            .execute(&CancellationToken::new())
            .unwrap();
        assert_eq!(estimate.quads, out.mesh.quads().len());
        assert_eq!(estimate.triangles, 0);
        assert_eq!(estimate.memory_bytes, 250 * size_of::<Quad>());
        assert!(estimate.recommended_parallelism >= 1);
        assert!(!estimate.prefers_batched());
    }

    #[test]
    fn finer_targets_cost_more() {
        let s = PrismStructure::new(rect(10.0, 10.0), 0.0, 10.0).unwrap();
        let coarse = ComplexityEstimate::estimate(&s, &MesherOptions::coarse());
        let fine = ComplexityEstimate::estimate(&s, &MesherOptions::fine());
        assert!(fine.faces() > coarse.faces());
        assert!(fine.time_ms > coarse.time_ms);
    }

    #[test]
    fn large_structure_prefers_batching() {
        let s = PrismStructure::new(rect(1000.0, 1000.0), 0.0, 10.0).unwrap();
        let options = MesherOptions::default().with_target_edge_lengths(1.0, 1.0);
        let estimate = ComplexityEstimate::estimate(&s, &options);
        assert!(estimate.prefers_batched());
    }
}
