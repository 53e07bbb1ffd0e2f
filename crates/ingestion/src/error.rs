//! Error types for the ingestion crate.

use grib_common::{GribIndexError, LayerRef};
use thiserror::Error;

/// Errors that can occur during ingestion.
#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Failed to open source {locator}: {message}")]
    SourceOpen { locator: String, message: String },

    #[error("Failed to decode layer {layer}: {message}")]
    LayerDecode { layer: LayerRef, message: String },

    #[error("Failed to extract coverage of layer {layer}: {source}")]
    Coverage {
        layer: LayerRef,
        #[source]
        source: GribIndexError,
    },

    #[error("Failed to register in catalog: {0}")]
    CatalogRegister(#[source] GribIndexError),
}

impl IngestionError {
    /// Locator of the source the failure belongs to, if known.
    pub fn locator(&self) -> Option<&str> {
        match self {
            Self::SourceOpen { locator, .. } => Some(locator),
            Self::LayerDecode { layer, .. } | Self::Coverage { layer, .. } => Some(&layer.source),
            Self::CatalogRegister(_) => None,
        }
    }
}

impl From<IngestionError> for GribIndexError {
    fn from(err: IngestionError) -> Self {
        match err {
            IngestionError::SourceOpen { locator, message } => {
                GribIndexError::unavailable(locator, message)
            }
            IngestionError::LayerDecode { ref layer, .. } => {
                GribIndexError::unavailable(layer.source.clone(), err.to_string())
            }
            IngestionError::Coverage { source, .. } => source,
            IngestionError::CatalogRegister(source) => source,
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestionError>;
