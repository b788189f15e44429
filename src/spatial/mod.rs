mod polygon_index;

pub use polygon_index::{CellClass, IndexCounters, SpatialPolygonIndex};
