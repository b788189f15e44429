use std::sync::Arc;

use crate::math::Point3;

use super::{Quad, Segment3, Triangle};

/// A persistent surface mesh.
///
/// Each collection sits behind an [`Arc`]; every mutation returns a new
/// instance and copies only the collection it touches, so earlier instances
/// remain valid and can be shared across threads.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImmutableMesh {
    quads: Arc<Vec<Quad>>,
    triangles: Arc<Vec<Triangle>>,
    points: Arc<Vec<Point3>>,
    segments: Arc<Vec<Segment3>>,
}

impl ImmutableMesh {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn quads(&self) -> &[Quad] {
        &self.quads
    }

    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment3] {
        &self.segments
    }

    /// Returns `true` if the mesh holds no geometry at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quads.is_empty()
            && self.triangles.is_empty()
            && self.points.is_empty()
            && self.segments.is_empty()
    }

    /// Returns a new mesh with `quad` appended.
    #[must_use]
    pub fn with_quad(&self, quad: Quad) -> Self {
        self.with_quads(std::iter::once(quad))
    }

    /// Returns a new mesh with all `quads` appended.
    #[must_use]
    pub fn with_quads(&self, quads: impl IntoIterator<Item = Quad>) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.quads).extend(quads);
        next
    }

    /// Returns a new mesh with `triangle` appended.
    #[must_use]
    pub fn with_triangle(&self, triangle: Triangle) -> Self {
        self.with_triangles(std::iter::once(triangle))
    }

    /// Returns a new mesh with all `triangles` appended.
    #[must_use]
    pub fn with_triangles(&self, triangles: impl IntoIterator<Item = Triangle>) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.triangles).extend(triangles);
        next
    }

    /// Returns a new mesh with all standalone `points` appended.
    #[must_use]
    pub fn with_points(&self, points: impl IntoIterator<Item = Point3>) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.points).extend(points);
        next
    }

    /// Returns a new mesh with all internal `segments` appended.
    #[must_use]
    pub fn with_segments(&self, segments: impl IntoIterator<Item = Segment3>) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.segments).extend(segments);
        next
    }

    /// Returns a new mesh containing the geometry of both meshes.
    #[must_use]
    pub fn merged(&self, other: &Self) -> Self {
        self.with_quads(other.quads.iter().copied())
            .with_triangles(other.triangles.iter().copied())
            .with_points(other.points.iter().copied())
            .with_segments(other.segments.iter().copied())
    }
}
