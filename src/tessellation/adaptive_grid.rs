//! Adaptive refinement grid for axis-aligned rectangular footprints.
//!
//! X and Y division arrays start uniform at the base target length. Around
//! each hole and auxiliary segment, extra uniform divisions at the refined
//! length are overlaid on both axes; the added lines run across the whole
//! grid, which keeps every cell rectangular. Cells whose center lies inside a
//! hole are carved out whole, so the smallest feature near a hole is bounded
//! by the local cell size.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]

use tracing::{debug, trace};

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::geometry::{Bounds2, PrismStructure};
use crate::math::{lift, Point2};
use crate::mesh::Quad;
use crate::options::{MesherOptions, Refinement};
use crate::spatial::SpatialPolygonIndex;

use super::quad_quality::score_quad;
use super::CapFacing;

/// Division lines of an adaptive rectangle grid.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveGrid {
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
}

impl AdaptiveGrid {
    /// Number of cells (before hole carving).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.xs.len().saturating_sub(1) * self.ys.len().saturating_sub(1)
    }
}

/// Builds the adaptive grid of a rectangular footprint and turns its cells
/// into cap quads.
pub struct AdaptiveGridBuilder<'a> {
    domain: Bounds2,
    structure: &'a PrismStructure,
    options: &'a MesherOptions,
}

impl<'a> AdaptiveGridBuilder<'a> {
    /// Creates a builder over `domain`, the footprint rectangle.
    #[must_use]
    pub fn new(domain: Bounds2, structure: &'a PrismStructure, options: &'a MesherOptions) -> Self {
        Self {
            domain,
            structure,
            options,
        }
    }

    /// Computes the refined division arrays.
    ///
    /// # Errors
    ///
    /// Returns [`MesherError::Cancelled`](crate::MesherError::Cancelled) if
    /// `cancel` fires; it is polled once per hole and per segment.
    pub fn build_grid(&self, cancel: &CancellationToken) -> Result<AdaptiveGrid> {
        let d = &self.domain;
        let target = self.options.target_edge_length_xy();
        let mut xs = uniform_divisions(d.min.x, d.max.x, target);
        let mut ys = uniform_divisions(d.min.y, d.max.y, target);

        if let Some(refinement) = self.options.hole_refinement() {
            for hole in self.structure.holes() {
                cancel.check()?;
                self.refine_around(hole.bounds(), refinement, &mut xs, &mut ys);
            }
        }

        if let Some(refinement) = self.options.segment_refinement() {
            for seg in self.structure.segments() {
                cancel.check()?;
                let start = Point2::new(seg.start.x, seg.start.y);
                let end = Point2::new(seg.end.x, seg.end.y);
                if let Some(b) = Bounds2::from_points(&[start, end]) {
                    self.refine_around(b, refinement, &mut xs, &mut ys);
                }
            }
            for seg in self.structure.constraint_segments() {
                cancel.check()?;
                if let Some(b) = Bounds2::from_points(&[seg.start, seg.end]) {
                    self.refine_around(b, refinement, &mut xs, &mut ys);
                }
            }
        }

        let eps = self.options.epsilon();
        let grid = AdaptiveGrid {
            xs: merge_divisions(xs, eps),
            ys: merge_divisions(ys, eps),
        };
        debug!(
            columns = grid.xs.len() - 1,
            rows = grid.ys.len() - 1,
            "built adaptive grid"
        );
        Ok(grid)
    }

    fn refine_around(
        &self,
        feature: Bounds2,
        refinement: Refinement,
        xs: &mut Vec<f64>,
        ys: &mut Vec<f64>,
    ) {
        let Some(band) = feature.expanded(refinement.band).clipped_to(&self.domain) else {
            trace!("refinement band outside domain");
            return;
        };
        xs.extend(uniform_divisions(band.min.x, band.max.x, refinement.edge_length));
        ys.extend(uniform_divisions(band.min.y, band.max.y, refinement.edge_length));
    }

    /// Emits one cap quad per grid cell whose center is not inside a hole.
    ///
    /// # Errors
    ///
    /// Returns [`MesherError::Cancelled`](crate::MesherError::Cancelled) if
    /// `cancel` fires.
    pub fn cap_quads(
        &self,
        grid: &AdaptiveGrid,
        hole_indices: &[SpatialPolygonIndex],
        z: f64,
        facing: CapFacing,
        cancel: &CancellationToken,
    ) -> Result<Vec<Quad>> {
        let mut quads = Vec::with_capacity(grid.cell_count());
        for ys in grid.ys.windows(2) {
            cancel.check()?;
            for xs in grid.xs.windows(2) {
                let center = Point2::new(0.5 * (xs[0] + xs[1]), 0.5 * (ys[0] + ys[1]));
                if hole_indices.iter().any(|h| h.is_inside(&center)) {
                    continue;
                }
                let vertices = [
                    lift(&Point2::new(xs[0], ys[0]), z),
                    lift(&Point2::new(xs[1], ys[0]), z),
                    lift(&Point2::new(xs[1], ys[1]), z),
                    lift(&Point2::new(xs[0], ys[1]), z),
                ];
                let quad = Quad::scored(vertices, score_quad(&vertices));
                quads.push(facing.orient_quad(quad));
            }
        }
        Ok(quads)
    }
}

/// `max(1, ceil(len / target))` equal divisions of `[lo, hi]`, endpoints
/// included.
fn uniform_divisions(lo: f64, hi: f64, target: f64) -> Vec<f64> {
    let spans = ((hi - lo) / target).ceil().max(1.0) as usize;
    let step = (hi - lo) / spans as f64;
    let mut out: Vec<f64> = (0..spans).map(|i| lo + step * i as f64).collect();
    out.push(hi);
    out
}

/// Sorts division values and drops any within `eps` of the previous one.
fn merge_divisions(mut values: Vec<f64>, eps: f64) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    let Some(&hi) = values.last() else {
        return values;
    };
    let mut merged: Vec<f64> = Vec::with_capacity(values.len());
    for v in values {
        match merged.last() {
            Some(&last) if v - last < eps => {}
            _ => merged.push(v),
        }
    }
    if let Some(last) = merged.last_mut() {
        *last = hi;
    }
    merged
}
