use crate::error::GeometryError;
use crate::math::polygon_2d::{point_in_polygon, segments_intersect, signed_area};
use crate::math::Point2;

/// Default tolerance used by [`Polygon2D::new`].
pub const DEFAULT_POLYGON_TOLERANCE: f64 = 1e-9;

/// A validated simple polygon with counter-clockwise winding.
///
/// Construction is the only robustness gate of the pipeline: once a
/// `Polygon2D` exists it is guaranteed to have at least 3 vertices, non-zero
/// area, no zero-length edges, no near-duplicate vertices and no intersecting
/// non-adjacent edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon2D {
    points: Vec<Point2>,
}

/// Axis-aligned 2D bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds2 {
    pub min: Point2,
    pub max: Point2,
}

impl Bounds2 {
    /// Computes the bounds of a non-empty point set.
    #[must_use]
    pub fn from_points(points: &[Point2]) -> Option<Self> {
        let first = points.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &points[1..] {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some(Self { min, max })
    }

    /// Width along X.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Height along Y.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    /// Returns these bounds grown by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min: Point2::new(self.min.x - margin, self.min.y - margin),
            max: Point2::new(self.max.x + margin, self.max.y + margin),
        }
    }

    /// Intersection with `other`, or `None` if they do not overlap.
    #[must_use]
    pub fn clipped_to(&self, other: &Self) -> Option<Self> {
        let min = Point2::new(self.min.x.max(other.min.x), self.min.y.max(other.min.y));
        let max = Point2::new(self.max.x.min(other.max.x), self.max.y.min(other.max.y));
        (min.x <= max.x && min.y <= max.y).then_some(Self { min, max })
    }

    /// Returns `true` if `p` lies inside or on these bounds.
    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

impl Polygon2D {
    /// Validates `points` with the default tolerance.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] naming the first violated rule.
    pub fn new(points: Vec<Point2>) -> Result<Self, GeometryError> {
        Self::with_tolerance(points, DEFAULT_POLYGON_TOLERANCE)
    }

    /// Validates `points` using `tolerance` for degeneracy checks.
    ///
    /// Clockwise input is reversed to counter-clockwise.
    ///
    /// # Errors
    ///
    /// Returns a [`GeometryError`] if the polygon has fewer than 3 vertices,
    /// non-finite coordinates, near-zero area, a zero-length edge, two
    /// vertices within `tolerance`, or intersecting non-adjacent edges.
    pub fn with_tolerance(mut points: Vec<Point2>, tolerance: f64) -> Result<Self, GeometryError> {
        let n = points.len();
        if n < 3 {
            return Err(GeometryError::TooFewVertices { count: n });
        }
        if let Some(index) = points
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(GeometryError::NonFiniteVertex { index });
        }

        let area = signed_area(&points);
        if area.abs() <= tolerance {
            return Err(GeometryError::DegenerateArea { area });
        }
        if area < 0.0 {
            points.reverse();
        }

        let tol_sq = tolerance * tolerance;
        for i in 0..n {
            let j = (i + 1) % n;
            if (points[j] - points[i]).norm_squared() <= tol_sq {
                return Err(GeometryError::ZeroLengthEdge { index: i });
            }
        }

        for i in 0..n {
            for j in (i + 1)..n {
                if (points[j] - points[i]).norm_squared() <= tol_sq {
                    return Err(GeometryError::DuplicateVertices {
                        first: i,
                        second: j,
                    });
                }
            }
        }

        for i in 0..n {
            let a0 = &points[i];
            let a1 = &points[(i + 1) % n];
            for j in (i + 2)..n {
                // Edge n-1 is adjacent to edge 0.
                if i == 0 && j == n - 1 {
                    continue;
                }
                let b0 = &points[j];
                let b1 = &points[(j + 1) % n];
                if segments_intersect(a0, a1, b0, b1) {
                    return Err(GeometryError::SelfIntersection {
                        first: i,
                        second: j,
                    });
                }
            }
        }

        Ok(Self { points })
    }

    /// The vertices in counter-clockwise order.
    #[must_use]
    pub fn points(&self) -> &[Point2] {
        &self.points
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; a valid polygon has at least 3 vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Iterates over the edges `(start, end)` in winding order.
    pub fn edges(&self) -> impl Iterator<Item = (&Point2, &Point2)> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| (&self.points[i], &self.points[(i + 1) % n]))
    }

    /// Enclosed area (always positive).
    #[must_use]
    pub fn area(&self) -> f64 {
        signed_area(&self.points)
    }

    /// Total boundary length.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        self.edges().map(|(a, b)| (b - a).norm()).sum()
    }

    /// Axis-aligned bounding box.
    #[must_use]
    pub fn bounds(&self) -> Bounds2 {
        // A validated polygon is never empty.
        Bounds2::from_points(&self.points).unwrap_or(Bounds2 {
            min: Point2::origin(),
            max: Point2::origin(),
        })
    }

    /// Exact inside test (boundary counts as inside).
    #[must_use]
    pub fn contains(&self, p: &Point2) -> bool {
        point_in_polygon(p, &self.points)
    }

    /// Returns the bounds if this polygon is an axis-aligned rectangle
    /// (exactly four vertices, every edge parallel to an axis).
    #[must_use]
    pub fn axis_aligned_rectangle(&self, tolerance: f64) -> Option<Bounds2> {
        if self.points.len() != 4 {
            return None;
        }
        let aligned = self
            .edges()
            .all(|(a, b)| (a.x - b.x).abs() <= tolerance || (a.y - b.y).abs() <= tolerance);
        aligned.then(|| self.bounds())
    }
}
