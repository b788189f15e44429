use crate::math::polygon_2d::subdivide_segment;
use crate::math::{lift, Point2};
use crate::mesh::Quad;

/// Which side of a boundary loop faces out of the solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopFacing {
    /// Footprint boundary: the solid is to the left of each CCW edge.
    Outward,
    /// Hole boundary: the solid is to the right of each CCW edge.
    Inward,
}

/// Sweeps a closed CCW loop across consecutive Z-levels into vertical quads.
pub struct SideFaces<'a> {
    loop_points: &'a [Point2],
    facing: LoopFacing,
    target_edge_length: f64,
}

impl<'a> SideFaces<'a> {
    /// Creates a new `SideFaces` generator.
    #[must_use]
    pub fn new(loop_points: &'a [Point2], facing: LoopFacing, target_edge_length: f64) -> Self {
        Self {
            loop_points,
            facing,
            target_edge_length,
        }
    }

    /// Generates one quad per edge span and level pair. Side quads carry no
    /// quality score.
    #[must_use]
    pub fn execute(&self, z_levels: &[f64]) -> Vec<Quad> {
        let n = self.loop_points.len();
        let mut quads = Vec::new();
        for i in 0..n {
            let a = &self.loop_points[i];
            let b = &self.loop_points[(i + 1) % n];
            let span_points = subdivide_segment(a, b, self.target_edge_length);
            for span in span_points.windows(2) {
                for zs in z_levels.windows(2) {
                    let (za, zb) = (zs[0], zs[1]);
                    let bottom_start = lift(&span[0], za);
                    let bottom_end = lift(&span[1], za);
                    let top_end = lift(&span[1], zb);
                    let top_start = lift(&span[0], zb);
                    let vertices = match self.facing {
                        LoopFacing::Outward => [bottom_start, bottom_end, top_end, top_start],
                        LoopFacing::Inward => [bottom_start, top_start, top_end, bottom_end],
                    };
                    quads.push(Quad::new(vertices));
                }
            }
        }
        quads
    }
}
