use std::collections::{BTreeSet, HashMap};

use tracing::debug;

use crate::math::Point3;

use super::ImmutableMesh;

/// A deduplicated, index-based view of a mesh.
///
/// All indices are in range and no two vertices lie within the epsilon the
/// mesh was built with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexedMesh {
    /// Unique vertex positions.
    pub vertices: Vec<Point3>,
    /// Unique undirected edges as `[min, max]` index pairs, sorted.
    pub edges: Vec<[u32; 2]>,
    /// Quad faces as vertex index tuples.
    pub quads: Vec<[u32; 4]>,
    /// Triangle faces as vertex index tuples.
    pub triangles: Vec<[u32; 3]>,
}

impl IndexedMesh {
    /// Builds an indexed mesh, merging positions whose distance is at most
    /// `epsilon`.
    ///
    /// Edges are collected from quad and triangle boundaries and from the
    /// mesh's internal segments; standalone points become vertices without
    /// edges. Edges whose endpoints merge into one vertex are skipped.
    #[must_use]
    pub fn from_mesh(mesh: &ImmutableMesh, epsilon: f64) -> Self {
        let mut lookup = VertexLookup::new(epsilon);
        let mut edges = BTreeSet::new();
        let mut add_edge = |a: u32, b: u32| {
            if a != b {
                edges.insert([a.min(b), a.max(b)]);
            }
        };

        let mut quads = Vec::with_capacity(mesh.quads().len());
        for quad in mesh.quads() {
            let idx = quad.vertices.map(|p| lookup.find_or_add(p));
            for i in 0..4 {
                add_edge(idx[i], idx[(i + 1) % 4]);
            }
            quads.push(idx);
        }

        let mut triangles = Vec::with_capacity(mesh.triangles().len());
        for tri in mesh.triangles() {
            let idx = tri.vertices.map(|p| lookup.find_or_add(p));
            for i in 0..3 {
                add_edge(idx[i], idx[(i + 1) % 3]);
            }
            triangles.push(idx);
        }

        for seg in mesh.segments() {
            let a = lookup.find_or_add(seg.start);
            let b = lookup.find_or_add(seg.end);
            add_edge(a, b);
        }

        for &p in mesh.points() {
            lookup.find_or_add(p);
        }

        let indexed = Self {
            vertices: lookup.vertices,
            edges: edges.into_iter().collect(),
            quads,
            triangles,
        };
        debug!(
            vertices = indexed.vertices.len(),
            edges = indexed.edges.len(),
            quads = indexed.quads.len(),
            triangles = indexed.triangles.len(),
            "built indexed mesh"
        );
        indexed
    }

    /// Number of faces (quads plus triangles).
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.quads.len() + self.triangles.len()
    }
}

type BucketKey = (i64, i64, i64);

/// Find-or-add vertex table backed by a hash grid of epsilon-sized buckets.
///
/// A position within epsilon of a stored vertex always lies in the same or an
/// adjacent bucket, so a lookup inspects at most 27 buckets.
struct VertexLookup {
    epsilon_sq: f64,
    inv_cell: f64,
    vertices: Vec<Point3>,
    buckets: HashMap<BucketKey, Vec<u32>>,
}

impl VertexLookup {
    fn new(epsilon: f64) -> Self {
        let epsilon = epsilon.abs().max(f64::MIN_POSITIVE);
        Self {
            epsilon_sq: epsilon * epsilon,
            inv_cell: 1.0 / epsilon,
            vertices: Vec::new(),
            buckets: HashMap::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn key(&self, p: &Point3) -> BucketKey {
        (
            (p.x * self.inv_cell).floor() as i64,
            (p.y * self.inv_cell).floor() as i64,
            (p.z * self.inv_cell).floor() as i64,
        )
    }

    #[allow(clippy::cast_possible_truncation)]
    fn find_or_add(&mut self, p: Point3) -> u32 {
        let (kx, ky, kz) = self.key(&p);
        for dx in -1..=1_i64 {
            for dy in -1..=1_i64 {
                for dz in -1..=1_i64 {
                    let neighbor = (
                        kx.saturating_add(dx),
                        ky.saturating_add(dy),
                        kz.saturating_add(dz),
                    );
                    let Some(bucket) = self.buckets.get(&neighbor) else {
                        continue;
                    };
                    for &idx in bucket {
                        if (self.vertices[idx as usize] - p).norm_squared() <= self.epsilon_sq {
                            return idx;
                        }
                    }
                }
            }
        }

        let idx = self.vertices.len() as u32;
        self.vertices.push(p);
        self.buckets.entry((kx, ky, kz)).or_default().push(idx);
        idx
    }
}
