//! Decoder seam: how the cache reaches GRIB files.
//!
//! The decoding library is an external collaborator. It is modelled as a
//! [`LayerSource`] that opens locators into [`GribFile`] handles, each of
//! which decodes layers by their 1-based position.

use grib_common::{DecodedLayer, GribResult};

/// An open source file.
pub trait GribFile: Send {
    /// Locator the file was opened from.
    fn locator(&self) -> &str;

    /// Number of layers in the file.
    fn layer_count(&self) -> usize;

    /// Decode the layer at 1-based `index`.
    fn layer(&mut self, index: usize) -> GribResult<DecodedLayer>;

    /// Release the underlying handle. Called once, on cache eviction.
    fn close(&mut self) {}
}

/// Opens source files by locator (file path or URL).
pub trait LayerSource: Send + Sync {
    fn open(&self, locator: &str) -> GribResult<Box<dyn GribFile>>;
}
