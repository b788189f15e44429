mod adjacency;
mod immutable;
mod indexed;

pub use adjacency::{AdjacencyReport, MeshAdjacency};
pub use immutable::ImmutableMesh;
pub use indexed::IndexedMesh;

use crate::math::Point3;

/// A four-sided face, vertices counter-clockwise seen from outside.
///
/// Only cap quads carry a quality score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub vertices: [Point3; 4],
    pub quality: Option<f64>,
}

impl Quad {
    /// Creates a quad without a quality score.
    #[must_use]
    pub fn new(vertices: [Point3; 4]) -> Self {
        Self {
            vertices,
            quality: None,
        }
    }

    /// Creates a quad carrying a quality score.
    #[must_use]
    pub fn scored(vertices: [Point3; 4], quality: f64) -> Self {
        Self {
            vertices,
            quality: Some(quality),
        }
    }

    /// The same quad with reversed winding (first vertex kept).
    #[must_use]
    pub fn flipped(&self) -> Self {
        let [a, b, c, d] = self.vertices;
        Self {
            vertices: [a, d, c, b],
            quality: self.quality,
        }
    }
}

/// A three-sided face.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub vertices: [Point3; 3],
}

impl Triangle {
    #[must_use]
    pub fn new(vertices: [Point3; 3]) -> Self {
        Self { vertices }
    }

    /// The same triangle with reversed winding (first vertex kept).
    #[must_use]
    pub fn flipped(&self) -> Self {
        let [a, b, c] = self.vertices;
        Self {
            vertices: [a, c, b],
        }
    }
}

/// A straight segment in space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment3 {
    pub start: Point3,
    pub end: Point3,
}

impl Segment3 {
    #[must_use]
    pub fn new(start: Point3, end: Point3) -> Self {
        Self { start, end }
    }

    /// Segment length.
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}
