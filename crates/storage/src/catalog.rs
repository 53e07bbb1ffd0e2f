//! The catalog collaborator: persistent store of coverage polygons,
//! measurements and layer records.

use geo::{Contains, MultiPolygon, Point};
use grib_common::{GribResult, GridId, LayerRecord, MeasurementKey};
use serde::{Deserialize, Serialize};

use crate::query::{FieldValue, LayerField, LayerQuery};

/// A stored coverage polygon, shared by every layer with the same footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonRecord {
    pub gridid: GridId,
    /// Well-known text of `geometry`
    pub wkt: String,
    pub geometry: MultiPolygon<f64>,
    /// Proj parameters of the grid the polygon was derived from
    pub projparams: serde_json::Value,
}

impl PolygonRecord {
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.geometry.contains(&Point::new(lon, lat))
    }
}

/// Catalog operations used by ingestion and lookup.
///
/// Writes are idempotent: inserting something already present is a no-op.
/// Implementations provide their own consistency for concurrent callers.
pub trait Catalog: Send + Sync {
    /// Store a polygon unless one with the same gridid exists.
    ///
    /// Returns `true` when the polygon was newly created.
    fn find_or_create_polygon(&self, polygon: &PolygonRecord) -> GribResult<bool>;

    fn polygon(&self, gridid: &GridId) -> GribResult<Option<PolygonRecord>>;

    fn insert_measurement(&self, measurement: &MeasurementKey) -> GribResult<()>;

    fn insert_layer_record(&self, record: &LayerRecord) -> GribResult<()>;

    /// Layer records matching `query`.
    ///
    /// With a time filter, records are ordered newest first for
    /// [`AtOrBefore`](crate::TimeDirection::AtOrBefore) and oldest first for
    /// [`AtOrAfter`](crate::TimeDirection::AtOrAfter).
    fn query_layers(&self, query: &LayerQuery) -> GribResult<Vec<LayerRecord>>;

    /// Distinct values of `field` over the records matching `query`, ascending.
    fn query_distinct_field(&self, field: LayerField, query: &LayerQuery) -> GribResult<Vec<FieldValue>>;

    /// Whether a source locator has been indexed.
    fn has_source(&self, locator: &str) -> GribResult<bool>;

    /// Mark a source locator as indexed.
    fn register_source(&self, locator: &str) -> GribResult<()>;
}
