//! Meshing options.
//!
//! [`MesherOptions`] controls target edge lengths, refinement near holes and
//! segments, cap generation and quad-pairing quality. Fields are set through
//! `with_*` builders; validation runs once and is cached until the next
//! builder call.
//!
//! # Example
//!
//! ```
//! use prism_mesher::MesherOptions;
//!
//! let options = MesherOptions::default()
//!     .with_target_edge_lengths(0.5, 1.0)
//!     .with_hole_refinement(0.25, 1.0)
//!     .with_min_cap_quad_quality(0.6);
//! assert!(options.validate().is_ok());
//! ```

use std::sync::OnceLock;

use crate::error::ValidationError;

/// Default grid resolution of the spatial polygon index.
pub const DEFAULT_INDEX_RESOLUTION: usize = 64;

/// Refined edge length applied within `band` of a feature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Refinement {
    pub edge_length: f64,
    pub band: f64,
}

/// Options controlling a prism meshing run.
#[derive(Debug, Clone)]
pub struct MesherOptions {
    target_edge_length_xy: f64,
    target_edge_length_z: f64,
    hole_refinement: Option<Refinement>,
    segment_refinement: Option<Refinement>,
    generate_bottom_cap: bool,
    generate_top_cap: bool,
    min_cap_quad_quality: f64,
    emit_rejected_triangles: bool,
    cap_interior_points: bool,
    epsilon: f64,
    index_resolution: usize,
    validation: OnceLock<Result<(), ValidationError>>,
}

impl Default for MesherOptions {
    fn default() -> Self {
        Self {
            target_edge_length_xy: 1.0,
            target_edge_length_z: 1.0,
            hole_refinement: None,
            segment_refinement: None,
            generate_bottom_cap: true,
            generate_top_cap: true,
            min_cap_quad_quality: 0.5,
            emit_rejected_triangles: true,
            cap_interior_points: true,
            epsilon: 1e-6,
            index_resolution: DEFAULT_INDEX_RESOLUTION,
            validation: OnceLock::new(),
        }
    }
}

impl MesherOptions {
    /// Large elements for previews.
    #[must_use]
    pub fn coarse() -> Self {
        Self::default()
            .with_target_edge_lengths(5.0, 5.0)
            .with_min_cap_quad_quality(0.3)
    }

    /// Small elements with refinement around holes.
    #[must_use]
    pub fn fine() -> Self {
        Self::default()
            .with_target_edge_lengths(0.25, 0.25)
            .with_hole_refinement(0.1, 0.5)
            .with_min_cap_quad_quality(0.6)
    }

    /// Sets the XY and Z target edge lengths.
    #[must_use]
    pub fn with_target_edge_lengths(mut self, xy: f64, z: f64) -> Self {
        self.target_edge_length_xy = xy;
        self.target_edge_length_z = z;
        self.invalidated()
    }

    /// Sets the XY target edge length.
    #[must_use]
    pub fn with_target_edge_length_xy(mut self, xy: f64) -> Self {
        self.target_edge_length_xy = xy;
        self.invalidated()
    }

    /// Sets the Z target edge length.
    #[must_use]
    pub fn with_target_edge_length_z(mut self, z: f64) -> Self {
        self.target_edge_length_z = z;
        self.invalidated()
    }

    /// Refines the rectangle grid to `edge_length` within `band` of each hole.
    #[must_use]
    pub fn with_hole_refinement(mut self, edge_length: f64, band: f64) -> Self {
        self.hole_refinement = Some(Refinement { edge_length, band });
        self.invalidated()
    }

    /// Refines the rectangle grid to `edge_length` within `band` of each
    /// auxiliary segment.
    #[must_use]
    pub fn with_segment_refinement(mut self, edge_length: f64, band: f64) -> Self {
        self.segment_refinement = Some(Refinement { edge_length, band });
        self.invalidated()
    }

    /// Enables or disables the bottom and top caps.
    #[must_use]
    pub fn with_caps(mut self, bottom: bool, top: bool) -> Self {
        self.generate_bottom_cap = bottom;
        self.generate_top_cap = top;
        self.invalidated()
    }

    /// Sets the minimum quality for a paired cap quad to be kept.
    #[must_use]
    pub fn with_min_cap_quad_quality(mut self, quality: f64) -> Self {
        self.min_cap_quad_quality = quality;
        self.invalidated()
    }

    /// Chooses whether triangles left over from pairing are emitted.
    #[must_use]
    pub fn with_emit_rejected_triangles(mut self, emit: bool) -> Self {
        self.emit_rejected_triangles = emit;
        self.invalidated()
    }

    /// Chooses whether generic caps receive interior lattice points.
    #[must_use]
    pub fn with_cap_interior_points(mut self, enabled: bool) -> Self {
        self.cap_interior_points = enabled;
        self.invalidated()
    }

    /// Sets the merge/collapse epsilon.
    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self.invalidated()
    }

    /// Sets the grid resolution of spatial polygon indices.
    #[must_use]
    pub fn with_index_resolution(mut self, resolution: usize) -> Self {
        self.index_resolution = resolution;
        self.invalidated()
    }

    fn invalidated(mut self) -> Self {
        self.validation = OnceLock::new();
        self
    }

    /// Validates the options, caching the outcome.
    ///
    /// # Errors
    ///
    /// Returns the first violated constraint: non-positive or non-finite
    /// lengths, negative bands, quality outside `[0, 1]`, a non-positive
    /// epsilon, or a zero index resolution.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validation.get_or_init(|| self.check()).clone()
    }

    /// Returns `true` once a validation outcome has been cached.
    #[must_use]
    pub fn is_validation_cached(&self) -> bool {
        self.validation.get().is_some()
    }

    fn check(&self) -> Result<(), ValidationError> {
        positive("target_edge_length_xy", self.target_edge_length_xy)?;
        positive("target_edge_length_z", self.target_edge_length_z)?;
        if let Some(r) = self.hole_refinement {
            positive("hole refinement edge length", r.edge_length)?;
            non_negative("hole refinement band", r.band)?;
        }
        if let Some(r) = self.segment_refinement {
            positive("segment refinement edge length", r.edge_length)?;
            non_negative("segment refinement band", r.band)?;
        }
        if !(0.0..=1.0).contains(&self.min_cap_quad_quality) {
            return Err(ValidationError::QualityOutOfRange {
                value: self.min_cap_quad_quality,
            });
        }
        positive("epsilon", self.epsilon)?;
        if self.index_resolution == 0 {
            return Err(ValidationError::InvalidResolution {
                value: self.index_resolution,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn target_edge_length_xy(&self) -> f64 {
        self.target_edge_length_xy
    }

    #[must_use]
    pub fn target_edge_length_z(&self) -> f64 {
        self.target_edge_length_z
    }

    #[must_use]
    pub fn hole_refinement(&self) -> Option<Refinement> {
        self.hole_refinement
    }

    #[must_use]
    pub fn segment_refinement(&self) -> Option<Refinement> {
        self.segment_refinement
    }

    #[must_use]
    pub fn generate_bottom_cap(&self) -> bool {
        self.generate_bottom_cap
    }

    #[must_use]
    pub fn generate_top_cap(&self) -> bool {
        self.generate_top_cap
    }

    #[must_use]
    pub fn min_cap_quad_quality(&self) -> f64 {
        self.min_cap_quad_quality
    }

    #[must_use]
    pub fn emit_rejected_triangles(&self) -> bool {
        self.emit_rejected_triangles
    }

    #[must_use]
    pub fn cap_interior_points(&self) -> bool {
        self.cap_interior_points
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[must_use]
    pub fn index_resolution(&self) -> usize {
        self.index_resolution
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveLength { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NegativeBand { name, value })
    }
}
