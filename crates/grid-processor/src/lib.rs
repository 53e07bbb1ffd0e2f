//! Layer resolution and bracketed spatiotemporal interpolation.
//!
//! This crate turns catalog layer records into values at a point and time:
//!
//! - **Resource cache**: bounded LRU tiers of open source files and fitted
//!   cubic surfaces
//! - **Vector synthesis**: magnitude/azimuth fields from U/V component pairs
//! - **Bracket lookup**: nearest layers before and after a timestamp, per
//!   measurement
//! - **Temporal interpolation**: spatial cubic interpolation in each bracket
//!   layer, then linear interpolation in time
//!
//! # Architecture
//!
//! ```text
//! interpolate_at_time(point, t, filters)
//!      │
//!      ├─► BracketLookup::bracket ──► Catalog::query_layers (before / after)
//!      │         │
//!      │         └─► resolve_vector_siblings (U/V -> magnitude, azimuth)
//!      │
//!      ├─► ResourceCache::surface for each bracket layer
//!      │         │
//!      │         └─► LayerSource::open / GribFile::layer on a miss
//!      │
//!      └─► Surface::value_at, then linear in time
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod interpolation;
pub mod query;
pub mod service;
pub mod source;
pub mod surface;
pub mod vector;

// Re-export commonly used types at crate root
pub use cache::{
    CacheStats, CachedSurface, ResourceCache, ResourceCacheStats, SurfaceKey, VectorSurface,
};
pub use config::CacheConfig;
pub use error::{GridProcessorError, Result};
pub use interpolation::{bilinear_interpolate, cubic_interpolate, interpolate_time};
pub use query::{Bracket, BracketLayer, BracketLookup};
pub use service::{InterpolatedValue, Interpolation, MeasurementFailure, TemporalInterpolator};
pub use source::{GribFile, LayerSource};
pub use surface::Surface;
pub use vector::{
    bearing, resolve_vector_siblings, vector_quantity, VectorComponent, VectorField,
    VectorFieldSynthesizer, VectorSibling,
};
