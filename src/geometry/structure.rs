use crate::error::ValidationError;
use crate::math::{Point2, Point3};
use crate::mesh::Segment3;

use super::Polygon2D;

/// A flat horizontal surface inside a prism, with its own local holes.
#[derive(Debug, Clone, PartialEq)]
pub struct InternalSurface {
    pub outer: Polygon2D,
    pub holes: Vec<Polygon2D>,
    pub elevation: f64,
}

impl InternalSurface {
    /// Creates an internal surface without holes.
    #[must_use]
    pub fn new(outer: Polygon2D, elevation: f64) -> Self {
        Self {
            outer,
            holes: Vec::new(),
            elevation,
        }
    }

    /// Adds a local hole.
    #[must_use]
    pub fn with_hole(mut self, hole: Polygon2D) -> Self {
        self.holes.push(hole);
        self
    }
}

/// A 2D segment held at a fixed elevation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintSegment {
    pub start: Point2,
    pub end: Point2,
    pub elevation: f64,
}

impl ConstraintSegment {
    /// Creates a constraint segment.
    #[must_use]
    pub fn new(start: Point2, end: Point2, elevation: f64) -> Self {
        Self {
            start,
            end,
            elevation,
        }
    }

    /// The segment lifted to its elevation.
    #[must_use]
    pub fn to_segment3(&self) -> Segment3 {
        Segment3::new(
            Point3::new(self.start.x, self.start.y, self.elevation),
            Point3::new(self.end.x, self.end.y, self.elevation),
        )
    }
}

/// A footprint extruded between two elevations, with holes, internal
/// surfaces and auxiliary refinement hints.
#[derive(Debug, Clone, PartialEq)]
pub struct PrismStructure {
    footprint: Polygon2D,
    base_elevation: f64,
    top_elevation: f64,
    holes: Vec<Polygon2D>,
    internal_surfaces: Vec<InternalSurface>,
    points: Vec<Point3>,
    segments: Vec<Segment3>,
    constraint_segments: Vec<ConstraintSegment>,
}

impl PrismStructure {
    /// Creates a structure from a footprint and its elevation range.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidElevations`] unless both elevations
    /// are finite and `base_elevation < top_elevation`.
    pub fn new(
        footprint: Polygon2D,
        base_elevation: f64,
        top_elevation: f64,
    ) -> Result<Self, ValidationError> {
        check_elevations(base_elevation, top_elevation)?;
        Ok(Self {
            footprint,
            base_elevation,
            top_elevation,
            holes: Vec::new(),
            internal_surfaces: Vec::new(),
            points: Vec::new(),
            segments: Vec::new(),
            constraint_segments: Vec::new(),
        })
    }

    /// Adds a hole polygon.
    #[must_use]
    pub fn with_hole(mut self, hole: Polygon2D) -> Self {
        self.holes.push(hole);
        self
    }

    /// Adds an internal horizontal surface.
    #[must_use]
    pub fn with_internal_surface(mut self, surface: InternalSurface) -> Self {
        self.internal_surfaces.push(surface);
        self
    }

    /// Adds an auxiliary point.
    #[must_use]
    pub fn with_point(mut self, point: Point3) -> Self {
        self.points.push(point);
        self
    }

    /// Adds an auxiliary 3D segment.
    #[must_use]
    pub fn with_segment(mut self, segment: Segment3) -> Self {
        self.segments.push(segment);
        self
    }

    /// Adds a constraint segment at a fixed elevation.
    #[must_use]
    pub fn with_constraint_segment(mut self, segment: ConstraintSegment) -> Self {
        self.constraint_segments.push(segment);
        self
    }

    /// Checks every elevation and auxiliary coordinate.
    ///
    /// # Errors
    ///
    /// Returns the first violated rule: invalid elevation range, an internal
    /// surface not strictly between base and top, or a non-finite auxiliary
    /// coordinate.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let (base, top) = (self.base_elevation, self.top_elevation);
        check_elevations(base, top)?;

        for (index, surface) in self.internal_surfaces.iter().enumerate() {
            let z = surface.elevation;
            if !(z.is_finite() && z > base && z < top) {
                return Err(ValidationError::InternalSurfaceElevation {
                    index,
                    elevation: z,
                    base,
                    top,
                });
            }
        }

        let finite3 = |p: &Point3| p.iter().all(|c| c.is_finite());
        if !self.points.iter().all(finite3) {
            return Err(ValidationError::NonFinite { name: "points" });
        }
        if !self
            .segments
            .iter()
            .all(|s| finite3(&s.start) && finite3(&s.end))
        {
            return Err(ValidationError::NonFinite { name: "segments" });
        }
        let finite2 = |p: &Point2| p.x.is_finite() && p.y.is_finite();
        if !self
            .constraint_segments
            .iter()
            .all(|s| finite2(&s.start) && finite2(&s.end) && s.elevation.is_finite())
        {
            return Err(ValidationError::NonFinite {
                name: "constraint segments",
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn footprint(&self) -> &Polygon2D {
        &self.footprint
    }

    #[must_use]
    pub fn base_elevation(&self) -> f64 {
        self.base_elevation
    }

    #[must_use]
    pub fn top_elevation(&self) -> f64 {
        self.top_elevation
    }

    #[must_use]
    pub fn holes(&self) -> &[Polygon2D] {
        &self.holes
    }

    #[must_use]
    pub fn internal_surfaces(&self) -> &[InternalSurface] {
        &self.internal_surfaces
    }

    #[must_use]
    pub fn points(&self) -> &[Point3] {
        &self.points
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment3] {
        &self.segments
    }

    #[must_use]
    pub fn constraint_segments(&self) -> &[ConstraintSegment] {
        &self.constraint_segments
    }
}

fn check_elevations(base: f64, top: f64) -> Result<(), ValidationError> {
    if base.is_finite() && top.is_finite() && base < top {
        Ok(())
    } else {
        Err(ValidationError::InvalidElevations { base, top })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn square(size: f64) -> Polygon2D {
        Polygon2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(size, 0.0),
            Point2::new(size, size),
            Point2::new(0.0, size),
        ])
        .unwrap()
    }

    #[test]
    fn base_must_be_below_top() {
        assert!(PrismStructure::new(square(1.0), 0.0, 1.0).is_ok());
        let err = PrismStructure::new(square(1.0), 1.0, 1.0).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidElevations { .. }));
        assert!(PrismStructure::new(square(1.0), f64::NAN, 1.0).is_err());
    }

    #[test]
    fn internal_surface_must_be_strictly_inside() {
        let s = PrismStructure::new(square(4.0), 0.0, 3.0)
            .unwrap()
            .with_internal_surface(InternalSurface::new(square(2.0), 3.0));
        let err = s.validate().unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InternalSurfaceElevation { index: 0, .. }
        ));

        let s = PrismStructure::new(square(4.0), 0.0, 3.0)
            .unwrap()
            .with_internal_surface(InternalSurface::new(square(2.0), 1.5));
        assert!(s.validate().is_ok());
    }

    #[test]
    fn non_finite_points_rejected() {
        let s = PrismStructure::new(square(1.0), 0.0, 1.0)
            .unwrap()
            .with_point(Point3::new(0.0, f64::INFINITY, 0.5));
        assert_eq!(
            s.validate().unwrap_err(),
            ValidationError::NonFinite { name: "points" }
        );
    }

    #[test]
    fn constraint_segment_lifts_to_elevation() {
        let c = ConstraintSegment::new(Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), 2.5);
        let s = c.to_segment3();
        assert_eq!(s.start.z, 2.5);
        assert_eq!(s.end, Point3::new(1.0, 0.0, 2.5));
    }
}
