pub mod adaptive_grid;
pub mod quad_pairing;
pub mod quad_quality;
pub mod side_faces;
pub mod tessellate_cap;
pub mod z_levels;

pub use adaptive_grid::{AdaptiveGrid, AdaptiveGridBuilder};
pub use quad_pairing::{PairedQuad, PairingOutcome, QuadPairing};
pub use quad_quality::{quality_terms, score_quad, score_quads, QualityTerms};
pub use side_faces::{LoopFacing, SideFaces};
pub use tessellate_cap::{CapMesh, CapStats, CapTessellator};
pub use z_levels::ZLevelBuilder;

use crate::mesh::{Quad, Triangle};

/// Direction a horizontal cap faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapFacing {
    /// Normal +Z: top caps and internal surfaces. Keeps CCW winding.
    Up,
    /// Normal -Z: bottom caps. Mirrors the winding.
    Down,
}

impl CapFacing {
    /// Orients a CCW (seen from +Z) quad for this facing.
    #[must_use]
    pub fn orient_quad(self, quad: Quad) -> Quad {
        match self {
            Self::Up => quad,
            Self::Down => quad.flipped(),
        }
    }

    /// Orients a CCW (seen from +Z) triangle for this facing.
    #[must_use]
    pub fn orient_triangle(self, triangle: Triangle) -> Triangle {
        match self {
            Self::Up => triangle,
            Self::Down => triangle.flipped(),
        }
    }
}
