//! Error types for layer resolution and interpolation.

use grib_common::GribIndexError;
use projection::ProjectionError;
use thiserror::Error;

/// Errors that can occur while resolving layers into surfaces.
#[derive(Error, Debug)]
pub enum GridProcessorError {
    /// The source file could not be opened.
    #[error("failed to open {locator}: {message}")]
    OpenFailed { locator: String, message: String },

    /// The requested layer does not exist in the source file.
    #[error("layer {index} out of range for {locator} (1..={count})")]
    LayerOutOfRange {
        locator: String,
        index: usize,
        count: usize,
    },

    /// U and V components do not describe the same grid.
    #[error("vector components differ: {0}")]
    VectorMismatch(String),

    /// The layer's grid metadata cannot be projected.
    #[error("projection error: {0}")]
    Projection(#[from] ProjectionError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A vector pair key was used where a single surface is required.
    #[error("not a single-surface key: {0}")]
    NotScalar(String),

    /// Error raised by a decoder or catalog collaborator.
    #[error(transparent)]
    Index(#[from] GribIndexError),
}

impl GridProcessorError {
    /// Create an OpenFailed error.
    pub fn open_failed(locator: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::OpenFailed {
            locator: locator.into(),
            message: msg.into(),
        }
    }

    /// Whether the failure is confined to one source or layer.
    pub fn is_unavailable(&self) -> bool {
        match self {
            Self::OpenFailed { .. } | Self::LayerOutOfRange { .. } => true,
            Self::Index(e) => matches!(e, GribIndexError::ResourceUnavailable { .. }),
            _ => false,
        }
    }
}

impl From<GridProcessorError> for GribIndexError {
    fn from(err: GridProcessorError) -> Self {
        match err {
            GridProcessorError::OpenFailed { locator, message } => {
                GribIndexError::unavailable(locator, message)
            }
            GridProcessorError::LayerOutOfRange { ref locator, .. } => {
                GribIndexError::unavailable(locator.clone(), err.to_string())
            }
            GridProcessorError::VectorMismatch(msg) => GribIndexError::MalformedLayer(msg),
            GridProcessorError::Projection(e) => e.into(),
            GridProcessorError::ConfigError(msg) => GribIndexError::Configuration(msg),
            GridProcessorError::NotScalar(msg) => GribIndexError::InvalidQuery(msg),
            GridProcessorError::Index(e) => e,
        }
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
