//! Common types and utilities shared across the GRIB layer index crates.

pub mod error;
pub mod keys;
pub mod layer;
pub mod measurement;
pub mod time;

pub use error::{GribIndexError, GribResult};
pub use keys::{GribKeys, KeyValue, ProjParams};
pub use layer::{DecodedLayer, ParameterInfo};
pub use measurement::{GridId, LayerRecord, LayerRef, MeasurementKey, VerticalAxis};
pub use time::{epoch_seconds, parse_timestamp};
