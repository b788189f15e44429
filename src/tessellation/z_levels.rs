use tracing::trace;

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::geometry::PrismStructure;

/// Computes the ordered elevations at which a prism is sliced.
pub struct ZLevelBuilder<'a> {
    structure: &'a PrismStructure,
    target_edge_length: f64,
    epsilon: f64,
}

impl<'a> ZLevelBuilder<'a> {
    /// Creates a new `ZLevelBuilder`.
    #[must_use]
    pub fn new(structure: &'a PrismStructure, target_edge_length: f64, epsilon: f64) -> Self {
        Self {
            structure,
            target_edge_length,
            epsilon,
        }
    }

    /// Builds the levels.
    ///
    /// The result starts at the base elevation, ends at the top elevation, is
    /// strictly increasing, and contains every feature elevation strictly
    /// between them; levels closer than epsilon collapse to the first one.
    ///
    /// # Errors
    ///
    /// Returns [`MesherError::Cancelled`](crate::MesherError::Cancelled) if
    /// `cancel` fires while feature elevations are collected.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn execute(&self, cancel: &CancellationToken) -> Result<Vec<f64>> {
        let z0 = self.structure.base_elevation();
        let z1 = self.structure.top_elevation();
        let eps = self.epsilon;

        let spans = ((z1 - z0) / self.target_edge_length).ceil().max(1.0) as usize;
        let mut levels = Vec::with_capacity(spans + 1);
        levels.push(z0);
        levels.push(z1);
        let step = (z1 - z0) / spans as f64;
        levels.extend((1..spans).map(|i| z0 + step * i as f64));

        let mut push_feature = |z: f64| {
            if z > z0 + eps && z < z1 - eps {
                levels.push(z);
            }
        };

        cancel.check()?;
        for seg in self.structure.constraint_segments() {
            push_feature(seg.elevation);
        }
        cancel.check()?;
        for p in self.structure.points() {
            push_feature(p.z);
        }
        cancel.check()?;
        for seg in self.structure.segments() {
            push_feature(seg.start.z);
            push_feature(seg.end.z);
        }
        cancel.check()?;
        for surface in self.structure.internal_surfaces() {
            push_feature(surface.elevation);
        }

        levels.sort_by(f64::total_cmp);
        let mut collapsed: Vec<f64> = Vec::with_capacity(levels.len());
        for z in levels {
            match collapsed.last() {
                Some(&last) if z - last < eps => {}
                _ => collapsed.push(z),
            }
        }
        // Collapsing keeps z0 first; pin the top so the range stays exact.
        if let Some(last) = collapsed.last_mut() {
            *last = z1;
        }

        trace!(count = collapsed.len(), "built z-levels");
        Ok(collapsed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{ConstraintSegment, InternalSurface, Polygon2D};
    use crate::math::{Point2, Point3};
    use crate::mesh::Segment3;
    use crate::MesherError;
    use approx::assert_relative_eq;

    fn square() -> Polygon2D {
        Polygon2D::new(vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(0.0, 1.0),
        ])
        .unwrap()
    }

    fn assert_well_formed(levels: &[f64], z0: f64, z1: f64, eps: f64) {
        assert_eq!(levels.first().copied(), Some(z0));
        assert_eq!(levels.last().copied(), Some(z1));
        for w in levels.windows(2) {
            assert!(w[1] > w[0], "not increasing: {levels:?}");
            assert!(w[1] - w[0] >= eps, "too close: {levels:?}");
        }
    }

    #[test]
    fn uniform_levels() {
        let s = PrismStructure::new(square(), 0.0, 10.0).unwrap();
        let levels = ZLevelBuilder::new(&s, 2.0, 1e-6)
            .execute(&CancellationToken::new())
            .unwrap();
        assert_eq!(levels.len(), 6);
        assert_relative_eq!(levels[1], 2.0);
        assert_well_formed(&levels, 0.0, 10.0, 1e-6);
    }

    #[test]
    fn target_larger_than_height_gives_two_levels() {
        let s = PrismStructure::new(square(), -1.0, 1.0).unwrap();
        let levels = ZLevelBuilder::new(&s, 100.0, 1e-6)
            .execute(&CancellationToken::new())
            .unwrap();
        assert_eq!(levels, vec![-1.0, 1.0]);
    }

    #[test]
    fn feature_elevations_are_inserted() {
        let s = PrismStructure::new(square(), 0.0, 4.0)
            .unwrap()
            .with_internal_surface(InternalSurface::new(square(), 1.3))
            .with_point(Point3::new(0.5, 0.5, 2.7))
            .with_segment(Segment3::new(
                Point3::new(0.0, 0.0, 0.5),
                Point3::new(1.0, 1.0, 9.0),
            ))
            .with_constraint_segment(ConstraintSegment::new(
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                3.25,
            ));
        let levels = ZLevelBuilder::new(&s, 2.0, 1e-6)
            .execute(&CancellationToken::new())
            .unwrap();
        for z in [0.5, 1.3, 2.0, 2.7, 3.25] {
            assert!(levels.iter().any(|&l| (l - z).abs() < 1e-12), "{z} missing from {levels:?}");
        }
        // Out-of-range endpoint is ignored.
        assert!(levels.iter().all(|&l| l <= 4.0));
        assert_well_formed(&levels, 0.0, 4.0, 1e-6);
    }

    #[test]
    fn near_duplicates_collapse() {
        let s = PrismStructure::new(square(), 0.0, 2.0)
            .unwrap()
            .with_point(Point3::new(0.0, 0.0, 1.0 + 1e-9))
            .with_point(Point3::new(0.0, 0.0, 2.0 - 1e-9))
            .with_internal_surface(InternalSurface::new(square(), 1.0 - 1e-9));
        let levels = ZLevelBuilder::new(&s, 1.0, 1e-6)
            .execute(&CancellationToken::new())
            .unwrap();
        assert_eq!(levels.len(), 3);
        assert_well_formed(&levels, 0.0, 2.0, 1e-6);
    }

    #[test]
    fn cancellation_is_reported() {
        let s = PrismStructure::new(square(), 0.0, 2.0).unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let err = ZLevelBuilder::new(&s, 1.0, 1e-6).execute(&token).unwrap_err();
        assert!(matches!(err, MesherError::Cancelled));
    }
}
