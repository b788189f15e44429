use std::fmt;

use thiserror::Error;

/// Top-level error type for the prism mesher.
#[derive(Debug, Clone, Error)]
pub enum MesherError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Tessellation(#[from] TessellationError),

    /// A failure raised inside a pipeline stage, tagged with that stage.
    #[error("[{}] stage {stage} failed: {message}", stage.code())]
    Processing { stage: MeshingStage, message: String },

    /// Cooperative cancellation was requested.
    #[error("meshing cancelled")]
    Cancelled,

    /// A batch call was made with zero structures.
    #[error("batch contains no structures")]
    EmptyBatch,
}

impl MesherError {
    /// Returns `true` if this error reports a cancellation rather than a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the stage a processing failure was raised in, if any.
    #[must_use]
    pub fn stage(&self) -> Option<MeshingStage> {
        match self {
            Self::Processing { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Errors raised while validating options or structure definitions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{name} must be finite and positive, got {value}")]
    NonPositiveLength { name: &'static str, value: f64 },

    #[error("{name} must be finite and non-negative, got {value}")]
    NegativeBand { name: &'static str, value: f64 },

    #[error("minimum cap quad quality {value} is outside [0, 1]")]
    QualityOutOfRange { value: f64 },

    #[error("spatial index resolution must be at least 1, got {value}")]
    InvalidResolution { value: usize },

    #[error("base elevation {base} must be finite and below top elevation {top}")]
    InvalidElevations { base: f64, top: f64 },

    #[error(
        "internal surface {index} elevation {elevation} is not strictly between {base} and {top}"
    )]
    InternalSurfaceElevation {
        index: usize,
        elevation: f64,
        base: f64,
        top: f64,
    },

    #[error("{name} contains a non-finite coordinate")]
    NonFinite { name: &'static str },
}

/// Errors raised when constructing a [`Polygon2D`](crate::geometry::Polygon2D).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    #[error("polygon needs at least 3 vertices, got {count}")]
    TooFewVertices { count: usize },

    #[error("polygon vertex {index} has a non-finite coordinate")]
    NonFiniteVertex { index: usize },

    #[error("polygon is degenerate: signed area {area} is below tolerance")]
    DegenerateArea { area: f64 },

    #[error("polygon edge {index} has zero length")]
    ZeroLengthEdge { index: usize },

    #[error("polygon vertices {first} and {second} coincide within tolerance")]
    DuplicateVertices { first: usize, second: usize },

    #[error("polygon edges {first} and {second} intersect")]
    SelfIntersection { first: usize, second: usize },
}

/// Errors related to cap tessellation.
#[derive(Debug, Clone, Error)]
pub enum TessellationError {
    #[error("invalid tessellation input: {0}")]
    InvalidInput(String),

    #[error("tessellation failed: {0}")]
    Failed(String),
}

/// The pipeline stages of a single prism meshing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshingStage {
    Validate,
    BuildZLevels,
    GenerateSides,
    GenerateCaps,
    GenerateInternalSurfaces,
    Accumulate,
}

impl MeshingStage {
    /// Stable identifier for this stage, used in error reports.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::Validate => "PM-VALIDATE",
            Self::BuildZLevels => "PM-ZLEVELS",
            Self::GenerateSides => "PM-SIDES",
            Self::GenerateCaps => "PM-CAPS",
            Self::GenerateInternalSurfaces => "PM-INTERNAL",
            Self::Accumulate => "PM-ACCUMULATE",
        }
    }
}

impl fmt::Display for MeshingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validate => "validate",
            Self::BuildZLevels => "build z-levels",
            Self::GenerateSides => "generate sides",
            Self::GenerateCaps => "generate caps",
            Self::GenerateInternalSurfaces => "generate internal surfaces",
            Self::Accumulate => "accumulate",
        };
        f.write_str(name)
    }
}

/// Convenience type alias for results using [`MesherError`].
pub type Result<T> = std::result::Result<T, MesherError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn processing_error_carries_stage_code() {
        let err = MesherError::Processing {
            stage: MeshingStage::GenerateCaps,
            message: "boom".into(),
        };
        assert_eq!(err.stage(), Some(MeshingStage::GenerateCaps));
        let text = err.to_string();
        assert!(text.contains("PM-CAPS"), "{text}");
        assert!(text.contains("boom"), "{text}");
    }

    #[test]
    fn cancelled_is_distinct() {
        assert!(MesherError::Cancelled.is_cancelled());
        assert!(!MesherError::EmptyBatch.is_cancelled());
        assert_eq!(MesherError::Cancelled.stage(), None);
    }

    #[test]
    fn nested_errors_convert() {
        let err: MesherError = GeometryError::TooFewVertices { count: 2 }.into();
        assert!(matches!(err, MesherError::Geometry(_)));
        let err: MesherError = ValidationError::QualityOutOfRange { value: 2.0 }.into();
        assert!(err.to_string().contains("outside [0, 1]"));
    }
}
