//! Greedy pairing of edge-adjacent triangles into convex quads.

use std::collections::HashMap;

use crate::math::polygon_2d::{is_convex_quad, signed_area};
use crate::math::{lift, Point2};

use super::quad_quality::score_quad;

/// A quad formed from two triangles, as CCW vertex indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairedQuad {
    pub indices: [usize; 4],
    pub quality: f64,
}

/// Result of pairing a triangulation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairingOutcome {
    /// Accepted quads.
    pub quads: Vec<PairedQuad>,
    /// Indices of triangles that were not merged into a quad.
    pub leftover: Vec<usize>,
    /// Pairings rejected because neither vertex ordering was a convex CCW quad.
    pub rejected_pairings: usize,
    /// Convex pairings rejected for scoring below the minimum quality.
    pub low_quality: usize,
}

/// Pairs CCW triangles over shared edges.
///
/// Triangles are visited in input order; each unused triangle merges with the
/// unused neighbor giving the best acceptable quad (first wins on ties). Each
/// triangle is used at most once, so the result is deterministic and the
/// pass is linear in the number of triangles.
pub struct QuadPairing<'a> {
    positions: &'a [Point2],
    triangles: &'a [[usize; 3]],
    min_quality: f64,
}

impl<'a> QuadPairing<'a> {
    /// Creates a new `QuadPairing` over CCW `triangles` indexing `positions`.
    #[must_use]
    pub fn new(positions: &'a [Point2], triangles: &'a [[usize; 3]], min_quality: f64) -> Self {
        Self {
            positions,
            triangles,
            min_quality,
        }
    }

    /// Executes the pairing.
    #[must_use]
    pub fn execute(&self) -> PairingOutcome {
        let mut by_edge: HashMap<[usize; 2], Vec<usize>> = HashMap::new();
        for (t, tri) in self.triangles.iter().enumerate() {
            for k in 0..3 {
                by_edge.entry(edge_key(tri[k], tri[(k + 1) % 3])).or_default().push(t);
            }
        }

        let mut used = vec![false; self.triangles.len()];
        let mut outcome = PairingOutcome::default();

        for (i, tri) in self.triangles.iter().enumerate() {
            if used[i] {
                continue;
            }
            let mut best: Option<(usize, PairedQuad)> = None;
            for k in 0..3 {
                let Some(neighbors) = by_edge.get(&edge_key(tri[k], tri[(k + 1) % 3])) else {
                    continue;
                };
                for &j in neighbors {
                    if j == i || used[j] {
                        continue;
                    }
                    let Some(indices) = try_pair(self.positions, tri, &self.triangles[j]) else {
                        outcome.rejected_pairings += 1;
                        continue;
                    };
                    let quality = score_quad(&indices.map(|v| lift(&self.positions[v], 0.0)));
                    if quality < self.min_quality {
                        outcome.low_quality += 1;
                        continue;
                    }
                    let better = match &best {
                        Some((_, b)) => quality > b.quality,
                        None => true,
                    };
                    if better {
                        best = Some((j, PairedQuad { indices, quality }));
                    }
                }
            }

            used[i] = true;
            match best {
                Some((j, quad)) => {
                    used[j] = true;
                    outcome.quads.push(quad);
                }
                None => outcome.leftover.push(i),
            }
        }

        outcome
    }
}

fn edge_key(a: usize, b: usize) -> [usize; 2] {
    [a.min(b), a.max(b)]
}

/// Attempts to merge two triangles that share exactly two vertices.
///
/// The shared vertices follow the first triangle's winding; `wing0` belongs
/// to the first triangle and `wing1` to the second. The orderings
/// `(shared0, wing0, shared1, wing1)` and `(shared0, wing1, shared1, wing0)`
/// are tried in turn, and the first convex CCW one is returned.
#[must_use]
pub fn try_pair(positions: &[Point2], t0: &[usize; 3], t1: &[usize; 3]) -> Option<[usize; 4]> {
    if t0.iter().filter(|v| t1.contains(v)).count() != 2 {
        return None;
    }
    let k = (0..3).find(|&k| t1.contains(&t0[k]) && t1.contains(&t0[(k + 1) % 3]))?;
    let shared0 = t0[k];
    let shared1 = t0[(k + 1) % 3];
    let wing0 = t0[(k + 2) % 3];
    let wing1 = *t1.iter().find(|v| !t0.contains(v))?;

    [
        [shared0, wing0, shared1, wing1],
        [shared0, wing1, shared1, wing0],
    ]
    .into_iter()
    .find(|order| {
        let pts = order.map(|v| positions[v]);
        is_convex_quad(&pts) && signed_area(&pts) > 0.0
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    #[test]
    fn square_pairs_into_one_quad() {
        let pos = vec![p(0.0, 0.0), p(1.0, 0.0), p(1.0, 1.0), p(0.0, 1.0)];
        let tris = vec![[0, 1, 2], [0, 2, 3]];
        let out = QuadPairing::new(&pos, &tris, 0.5).execute();
        assert_eq!(out.quads.len(), 1);
        assert!(out.leftover.is_empty());
        let q = out.quads[0];
        assert!(signed_area(&q.indices.map(|i| pos[i])) > 0.0);
        assert!(q.quality >= 0.8);
    }

    #[test]
    fn reflex_pair_is_rejected() {
        // Dart: triangles share (1,2) but their union is not convex.
        let pos = vec![p(0.0, 0.0), p(2.0, 1.0), p(0.5, 1.0), p(0.0, 2.0)];
        let tris = vec![[0, 1, 2], [2, 1, 3]];
        assert!(try_pair(&pos, &tris[0], &tris[1]).is_none());
        let out = QuadPairing::new(&pos, &tris, 0.0).execute();
        assert!(out.quads.is_empty());
        assert_eq!(out.leftover, vec![0, 1]);
        assert_eq!(out.rejected_pairings, 1);
    }

    #[test]
    fn low_quality_pair_is_rejected() {
        let pos = vec![p(0.0, 0.0), p(100.0, 0.0), p(100.0, 0.5), p(0.0, 0.5)];
        let tris = vec![[0, 1, 2], [0, 2, 3]];
        let out = QuadPairing::new(&pos, &tris, 0.6).execute();
        assert!(out.quads.is_empty());
        assert_eq!(out.low_quality, 1);
        assert_eq!(out.leftover.len(), 2);

        let out = QuadPairing::new(&pos, &tris, 0.0).execute();
        assert_eq!(out.quads.len(), 1);
    }

    #[test]
    fn triangles_without_shared_edge_do_not_pair() {
        let pos = vec![p(0.0, 0.0), p(1.0, 0.0), p(0.0, 1.0), p(5.0, 5.0), p(6.0, 5.0)];
        assert!(try_pair(&pos, &[0, 1, 2], &[2, 3, 4]).is_none());
    }

    #[test]
    fn each_triangle_used_once() {
        // Fan of four triangles around the center of a square.
        let pos = vec![
            p(0.0, 0.0),
            p(2.0, 0.0),
            p(2.0, 2.0),
            p(0.0, 2.0),
            p(1.0, 1.0),
        ];
        let tris = vec![[0, 1, 4], [1, 2, 4], [2, 3, 4], [3, 0, 4]];
        let out = QuadPairing::new(&pos, &tris, 0.0).execute();
        let mut seen = out.leftover.clone();
        assert_eq!(out.quads.len() * 2 + out.leftover.len(), 4);
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), out.leftover.len());
    }

    #[test]
    fn pairing_is_deterministic() {
        let pos = vec![
            p(0.0, 0.0),
            p(1.0, 0.0),
            p(2.0, 0.0),
            p(0.0, 1.0),
            p(1.0, 1.0),
            p(2.0, 1.0),
        ];
        let tris = vec![[0, 1, 4], [0, 4, 3], [1, 2, 5], [1, 5, 4]];
        let a = QuadPairing::new(&pos, &tris, 0.5).execute();
        let b = QuadPairing::new(&pos, &tris, 0.5).execute();
        assert_eq!(a, b);
        assert_eq!(a.quads.len(), 2);
    }
}
