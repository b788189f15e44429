pub mod polygon;
pub mod structure;

pub use polygon::{Bounds2, Polygon2D, DEFAULT_POLYGON_TOLERANCE};
pub use structure::{ConstraintSegment, InternalSurface, PrismStructure};
