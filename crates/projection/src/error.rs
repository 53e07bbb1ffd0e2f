//! Error types for projection setup.

use grib_common::GribIndexError;
use thiserror::Error;

/// Errors raised while deriving a grid projection from layer metadata.
///
/// All of them are configuration errors: the metadata shape is unsupported or
/// malformed and retrying cannot help.
#[derive(Error, Debug)]
pub enum ProjectionError {
    /// The proj parameters name a projection we do not implement.
    #[error("unsupported projection: {0}")]
    Unsupported(String),

    /// A required metadata key (or all of its aliases) is absent.
    #[error("missing grid metadata key: {0}")]
    MissingKey(String),

    /// Metadata is present but describes an unusable grid.
    #[error("invalid grid definition: {0}")]
    InvalidGrid(String),
}

impl From<ProjectionError> for GribIndexError {
    fn from(err: ProjectionError) -> Self {
        GribIndexError::Configuration(err.to_string())
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
