//! Grid-cached point-in-polygon accelerator.
//!
//! The padded bounding box of a polygon is split into an N×N grid. Cells that
//! lie entirely inside or outside answer queries directly; cells touched by
//! the boundary defer to exact ray casting, so the cache never contradicts the
//! exact predicate.

// Grid coordinates are small non-negative integers.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::geometry::{Bounds2, Polygon2D};
use crate::math::polygon_2d::{point_in_polygon, BOUNDARY_TOLERANCE};
use crate::math::Point2;
use crate::options::DEFAULT_INDEX_RESOLUTION;

/// Cached classification of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellClass {
    Inside,
    Outside,
    Boundary,
}

/// Diagnostic counters. They never influence query results.
#[derive(Debug, Default)]
pub struct IndexCounters {
    cached: AtomicUsize,
    exact: AtomicUsize,
}

impl IndexCounters {
    /// Queries answered from the cell cache.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cached.load(Ordering::Relaxed)
    }

    /// Queries that fell back to exact ray casting.
    #[must_use]
    pub fn exact(&self) -> usize {
        self.exact.load(Ordering::Relaxed)
    }
}

/// Grid-cached inside/outside index over one polygon.
#[derive(Debug)]
pub struct SpatialPolygonIndex {
    points: Vec<Point2>,
    bounds: Bounds2,
    resolution: usize,
    cell_w: f64,
    cell_h: f64,
    cells: Vec<CellClass>,
    counters: IndexCounters,
}

impl SpatialPolygonIndex {
    /// Builds an index with the default 64×64 grid.
    #[must_use]
    pub fn new(polygon: &Polygon2D) -> Self {
        Self::with_resolution(polygon, DEFAULT_INDEX_RESOLUTION)
    }

    /// Builds an index with a `resolution`×`resolution` grid (at least 1).
    #[must_use]
    pub fn with_resolution(polygon: &Polygon2D, resolution: usize) -> Self {
        let n = resolution.max(1);
        let points = polygon.points().to_vec();
        let raw = polygon.bounds();
        let pad = (raw.width().max(raw.height()) * 1e-3).max(BOUNDARY_TOLERANCE * 10.0);
        let bounds = raw.expanded(pad);
        let cell_w = bounds.width() / n as f64;
        let cell_h = bounds.height() / n as f64;

        let mut cells = vec![CellClass::Outside; n * n];

        // Cells overlapped by any edge's bounding box may contain boundary.
        let reach = BOUNDARY_TOLERANCE * 2.0;
        let m = points.len();
        for i in 0..m {
            let a = &points[i];
            let b = &points[(i + 1) % m];
            let (c0, r0) = locate(&bounds, cell_w, cell_h, n, a.x.min(b.x) - reach, a.y.min(b.y) - reach);
            let (c1, r1) = locate(&bounds, cell_w, cell_h, n, a.x.max(b.x) + reach, a.y.max(b.y) + reach);
            for row in r0..=r1 {
                for col in c0..=c1 {
                    cells[row * n + col] = CellClass::Boundary;
                }
            }
        }

        // Corner lattice, sampled once with the exact predicate.
        let stride = n + 1;
        let mut corners = Vec::with_capacity(stride * stride);
        for row in 0..=n {
            for col in 0..=n {
                let p = Point2::new(
                    bounds.min.x + col as f64 * cell_w,
                    bounds.min.y + row as f64 * cell_h,
                );
                corners.push(point_in_polygon(&p, &points));
            }
        }

        for row in 0..n {
            for col in 0..n {
                let cell = &mut cells[row * n + col];
                if *cell == CellClass::Boundary {
                    continue;
                }
                let samples = [
                    corners[row * stride + col],
                    corners[row * stride + col + 1],
                    corners[(row + 1) * stride + col],
                    corners[(row + 1) * stride + col + 1],
                ];
                *cell = if samples.iter().all(|&s| s) {
                    CellClass::Inside
                } else if samples.iter().all(|&s| !s) {
                    CellClass::Outside
                } else {
                    CellClass::Boundary
                };
            }
        }

        Self {
            points,
            bounds,
            resolution: n,
            cell_w,
            cell_h,
            cells,
            counters: IndexCounters::default(),
        }
    }

    /// Returns `true` if `p` lies inside or on the polygon.
    #[must_use]
    pub fn is_inside(&self, p: &Point2) -> bool {
        match self.classify_cell(p) {
            CellClass::Inside => {
                self.counters.cached.fetch_add(1, Ordering::Relaxed);
                true
            }
            CellClass::Outside => {
                self.counters.cached.fetch_add(1, Ordering::Relaxed);
                false
            }
            CellClass::Boundary => {
                self.counters.exact.fetch_add(1, Ordering::Relaxed);
                point_in_polygon(p, &self.points)
            }
        }
    }

    /// Cached class of the cell containing `p`; `Outside` beyond the grid.
    #[must_use]
    pub fn classify_cell(&self, p: &Point2) -> CellClass {
        if !self.bounds.contains(p) {
            return CellClass::Outside;
        }
        let (col, row) = locate(
            &self.bounds,
            self.cell_w,
            self.cell_h,
            self.resolution,
            p.x,
            p.y,
        );
        self.cells[row * self.resolution + col]
    }

    /// Grid resolution along each axis.
    #[must_use]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Query counters.
    #[must_use]
    pub fn counters(&self) -> &IndexCounters {
        &self.counters
    }
}

/// Maps a coordinate to its clamped `(column, row)` cell.
fn locate(bounds: &Bounds2, cell_w: f64, cell_h: f64, n: usize, x: f64, y: f64) -> (usize, usize) {
    let max = (n - 1) as f64;
    let col = ((x - bounds.min.x) / cell_w).floor().clamp(0.0, max);
    let row = ((y - bounds.min.y) / cell_h).floor().clamp(0.0, max);
    (col as usize, row as usize)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point2 {
        Point2::new(x, y)
    }

    fn star() -> Polygon2D {
        let mut pts = Vec::new();
        for i in 0..10 {
            let angle = std::f64::consts::TAU * f64::from(i) / 10.0;
            let r = if i % 2 == 0 { 5.0 } else { 2.0 };
            pts.push(p(r * angle.cos(), r * angle.sin()));
        }
        Polygon2D::new(pts).unwrap()
    }

    #[test]
    fn agrees_with_exact_predicate_on_dense_samples() {
        let poly = star();
        let index = SpatialPolygonIndex::new(&poly);
        let b = poly.bounds().expanded(0.5);
        let steps = 200;
        for i in 0..=steps {
            for j in 0..=steps {
                let q = p(
                    b.min.x + b.width() * f64::from(i) / f64::from(steps),
                    b.min.y + b.height() * f64::from(j) / f64::from(steps),
                );
                assert_eq!(index.is_inside(&q), poly.contains(&q), "mismatch at {q:?}");
            }
        }
        assert!(index.counters().cached() > 0);
        assert!(index.counters().exact() > 0);
    }

    #[test]
    fn interior_cells_are_cached() {
        let poly = Polygon2D::new(vec![p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)]).unwrap();
        let index = SpatialPolygonIndex::with_resolution(&poly, 16);
        assert_eq!(index.classify_cell(&p(5.0, 5.0)), CellClass::Inside);
        assert_eq!(index.classify_cell(&p(0.0, 5.0)), CellClass::Boundary);
        assert_eq!(index.classify_cell(&p(50.0, 5.0)), CellClass::Outside);
    }

    #[test]
    fn boundary_points_count_inside() {
        let poly = Polygon2D::new(vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 4.0), p(0.0, 4.0)]).unwrap();
        let index = SpatialPolygonIndex::new(&poly);
        assert!(index.is_inside(&p(4.0, 2.0)));
        assert!(index.is_inside(&p(0.0, 0.0)));
        assert!(!index.is_inside(&p(4.01, 2.0)));
    }

    #[test]
    fn coarse_grid_still_exact() {
        let poly = star();
        let index = SpatialPolygonIndex::with_resolution(&poly, 1);
        assert_eq!(index.resolution(), 1);
        assert!(index.is_inside(&p(0.0, 0.0)));
        assert!(!index.is_inside(&p(4.0, 4.0)));
    }
}
