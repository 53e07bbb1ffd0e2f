//! Layer catalog for the GRIB layer index.
//!
//! Provides:
//! - the [`Catalog`] interface used by ingestion and lookup
//! - the [`LayerQuery`] filter model with bracket ordering and relative
//!   level rules
//! - [`MemoryCatalog`], an in-process implementation with JSON snapshots

pub mod catalog;
pub mod memory;
pub mod query;

pub use catalog::{Catalog, PolygonRecord};
pub use memory::{CatalogStats, MemoryCatalog};
pub use query::{
    apply_level_rule, sort_records, FieldValue, LayerField, LayerQuery, LevelFilter, LevelMode,
    TimeDirection, TimeFilter,
};
