//! Error types for the GRIB layer index.

use thiserror::Error;

/// Result type alias using GribIndexError.
pub type GribResult<T> = Result<T, GribIndexError>;

/// Primary error type for indexing and lookup operations.
///
/// A missing time bracket and a degenerate (zero-length) bracket are not
/// errors; they are handled by omission and value passthrough respectively.
#[derive(Debug, Error)]
pub enum GribIndexError {
    // === Construction Errors ===
    #[error("Unsupported grid configuration: {0}")]
    Configuration(String),

    // === Resource Errors ===
    #[error("Resource unavailable: {locator}: {message}")]
    ResourceUnavailable { locator: String, message: String },

    // === Query Errors ===
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    // === Data Errors ===
    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Malformed layer: {0}")]
    MalformedLayer(String),

    // === Infrastructure Errors ===
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GribIndexError {
    /// Create a Configuration error.
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a ResourceUnavailable error for a source locator.
    pub fn unavailable(locator: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::ResourceUnavailable {
            locator: locator.into(),
            message: msg.into(),
        }
    }

    /// Create a Catalog error.
    pub fn catalog(msg: impl Into<String>) -> Self {
        Self::Catalog(msg.into())
    }

    /// Whether repeating the same call could succeed.
    ///
    /// Configuration and malformed-data errors are permanent for a given input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GribIndexError::ResourceUnavailable { .. }
                | GribIndexError::Catalog(_)
                | GribIndexError::Io(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_is_not_retryable() {
        let err = GribIndexError::configuration("proj=foo");
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Unsupported grid configuration: proj=foo");
    }

    #[test]
    fn test_unavailable_message() {
        let err = GribIndexError::unavailable("/data/a.grib", "layer 7 out of range");
        assert!(err.is_retryable());
        assert!(err.to_string().contains("/data/a.grib"));
        assert!(err.to_string().contains("layer 7"));
    }
}
