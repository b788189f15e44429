pub mod cancel;
pub mod error;
pub mod geometry;
pub mod math;
pub mod mesh;
pub mod operations;
pub mod options;
pub mod spatial;
pub mod tessellation;

pub use cancel::CancellationToken;
pub use error::{MesherError, Result};
pub use geometry::{Polygon2D, PrismStructure};
pub use mesh::{ImmutableMesh, IndexedMesh};
pub use operations::{ComplexityEstimate, MeshBatch, MeshPrism, PrismMeshOutput};
pub use options::MesherOptions;
