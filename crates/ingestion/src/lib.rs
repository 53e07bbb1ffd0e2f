//! Ingestion of decoded GRIB layers into the layer catalog.
//!
//! Each layer's coverage polygon is extracted and hashed into a gridid,
//! then stored together with a measurement and layer record through the
//! [`storage::Catalog`] interface.

pub mod error;
pub mod ingester;
pub mod parameters;

pub use error::{IngestionError, Result};
pub use ingester::{BatchSummary, IngestFailure, IngestOptions, IngestionResult, Ingester};
pub use parameters::{ParameterMap, ParameterName};
