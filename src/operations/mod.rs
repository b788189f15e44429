mod estimate_complexity;
mod mesh_batch;
mod mesh_prism;

pub use estimate_complexity::ComplexityEstimate;
pub use mesh_batch::MeshBatch;
pub use mesh_prism::{CapStrategy, MeshPrism, MeshingStats, PrismMeshOutput};
