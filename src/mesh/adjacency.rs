use std::collections::HashMap;

use super::IndexedMesh;

/// Edge incidence summary of an [`IndexedMesh`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdjacencyReport {
    /// Edges bordering exactly one face.
    pub boundary_edges: usize,
    /// Edges bordering exactly two faces.
    pub manifold_edges: usize,
    /// Edges bordering more than two faces.
    pub non_manifold_edges: usize,
}

impl AdjacencyReport {
    /// Returns `true` when every face edge borders exactly two faces.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.boundary_edges == 0 && self.non_manifold_edges == 0
    }
}

/// Counts face incidences per undirected edge.
pub struct MeshAdjacency<'a> {
    mesh: &'a IndexedMesh,
}

impl<'a> MeshAdjacency<'a> {
    /// Creates a new `MeshAdjacency` query.
    #[must_use]
    pub fn new(mesh: &'a IndexedMesh) -> Self {
        Self { mesh }
    }

    /// Executes the analysis. Edges that only come from internal segments are
    /// not face edges and are ignored.
    #[must_use]
    pub fn execute(&self) -> AdjacencyReport {
        let mut incidence: HashMap<[u32; 2], usize> = HashMap::new();
        let mut count = |a: u32, b: u32| {
            if a != b {
                *incidence.entry([a.min(b), a.max(b)]).or_default() += 1;
            }
        };

        for q in &self.mesh.quads {
            for i in 0..4 {
                count(q[i], q[(i + 1) % 4]);
            }
        }
        for t in &self.mesh.triangles {
            for i in 0..3 {
                count(t[i], t[(i + 1) % 3]);
            }
        }

        let mut report = AdjacencyReport::default();
        for &faces in incidence.values() {
            match faces {
                1 => report.boundary_edges += 1,
                2 => report.manifold_edges += 1,
                _ => report.non_manifold_edges += 1,
            }
        }
        report
    }
}
