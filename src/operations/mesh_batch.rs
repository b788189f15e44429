use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::{MesherError, Result};
use crate::geometry::PrismStructure;
use crate::options::MesherOptions;

use super::mesh_prism::{MeshPrism, PrismMeshOutput};

/// Meshes several structures with shared options on a bounded thread pool.
///
/// Results come back in input order, one per structure. A failure in one
/// structure does not stop the others; cancelling the shared token does.
pub struct MeshBatch<'a> {
    structures: &'a [PrismStructure],
    options: &'a MesherOptions,
    max_parallelism: Option<usize>,
}

impl<'a> MeshBatch<'a> {
    /// Creates a new `MeshBatch` operation using rayon's default thread count.
    #[must_use]
    pub fn new(structures: &'a [PrismStructure], options: &'a MesherOptions) -> Self {
        Self {
            structures,
            options,
            max_parallelism: None,
        }
    }

    /// Caps the number of worker threads (at least 1).
    #[must_use]
    pub fn with_max_parallelism(mut self, threads: usize) -> Self {
        self.max_parallelism = Some(threads.max(1));
        self
    }

    /// Executes the batch.
    ///
    /// # Errors
    ///
    /// Returns [`MesherError::EmptyBatch`] if there are no structures. Errors
    /// of individual structures are returned in their result slot.
    pub fn execute(&self, cancel: &CancellationToken) -> Result<Vec<Result<PrismMeshOutput>>> {
        if self.structures.is_empty() {
            return Err(MesherError::EmptyBatch);
        }

        let mut builder = ThreadPoolBuilder::new();
        if let Some(threads) = self.max_parallelism {
            builder = builder.num_threads(threads);
        }

        let run = || -> Vec<Result<PrismMeshOutput>> {
            self.structures
                .par_iter()
                .map(|structure| MeshPrism::new(structure, self.options).execute(cancel))
                .collect()
        };

        let results = match builder.build() {
            Ok(pool) => {
                debug!(
                    structures = self.structures.len(),
                    threads = pool.current_num_threads(),
                    "meshing batch"
                );
                pool.install(run)
            }
            Err(err) => {
                warn!(%err, "thread pool unavailable, meshing batch sequentially");
                self.structures
                    .iter()
                    .map(|structure| MeshPrism::new(structure, self.options).execute(cancel))
                    .collect()
            }
        };

        Ok(results)
    }
}
