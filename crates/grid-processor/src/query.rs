//! Bracket lookup: nearest layers before and after a timestamp.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use grib_common::{GribResult, LayerRecord, MeasurementKey};
use storage::{Catalog, FieldValue, LayerField, LayerQuery, TimeDirection, TimeFilter};
use tracing::debug;

use crate::cache::SurfaceKey;
use crate::vector::resolve_vector_siblings;

/// One side of a bracket for one measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct BracketLayer {
    /// Surface holding the measurement's values
    pub surface: SurfaceKey,
    pub valid_time: DateTime<Utc>,
}

impl BracketLayer {
    fn from_record(record: &LayerRecord) -> Self {
        Self {
            surface: SurfaceKey::scalar(record.layer.clone()),
            valid_time: record.valid_time,
        }
    }

    pub fn valid_epoch(&self) -> i64 {
        self.valid_time.timestamp()
    }
}

/// Nearest layers at-or-before and at-or-after a timestamp, per measurement.
///
/// Both sides include the magnitude/azimuth measurements derived from any
/// U/V component pair present on that side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bracket {
    pub before: BTreeMap<MeasurementKey, BracketLayer>,
    pub after: BTreeMap<MeasurementKey, BracketLayer>,
}

impl Bracket {
    /// Measurements present on both sides, in key order.
    pub fn pairs(&self) -> impl Iterator<Item = (&MeasurementKey, &BracketLayer, &BracketLayer)> {
        self.before
            .iter()
            .filter_map(|(key, before)| self.after.get(key).map(|after| (key, before, after)))
    }

    /// Measurements missing one side of the bracket.
    pub fn unpaired(&self) -> impl Iterator<Item = &MeasurementKey> {
        let before = self.before.keys().filter(|k| !self.after.contains_key(*k));
        let after = self.after.keys().filter(|k| !self.before.contains_key(*k));
        before.chain(after)
    }
}

/// Catalog lookups used by interpolation and by callers listing layers.
#[derive(Clone)]
pub struct BracketLookup {
    catalog: Arc<dyn Catalog>,
}

impl BracketLookup {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Layer records matching `query`, ordered nearest first when the query
    /// carries a time filter.
    pub fn lookup(&self, query: &LayerQuery) -> GribResult<Vec<LayerRecord>> {
        self.catalog.query_layers(query)
    }

    /// Distinct values of `field` among the layers matching `query`.
    pub fn distinct(&self, field: LayerField, query: &LayerQuery) -> GribResult<Vec<FieldValue>> {
        self.catalog.query_distinct_field(field, query)
    }

    /// The nearest layer in `direction` from `timestamp`, per measurement.
    pub fn nearest(
        &self,
        query: &LayerQuery,
        timestamp: DateTime<Utc>,
        direction: TimeDirection,
    ) -> GribResult<BTreeMap<MeasurementKey, LayerRecord>> {
        let query = query.clone().with_time(Some(TimeFilter {
            timestamp,
            direction,
        }));
        let mut nearest = BTreeMap::new();
        for record in self.catalog.query_layers(&query)? {
            nearest
                .entry(record.measurement.clone())
                .or_insert(record);
        }
        Ok(nearest)
    }

    /// Bracket `timestamp` among the layers covering `(lon, lat)` that match
    /// `filters`. Any point or time filter in `filters` is replaced.
    pub fn bracket(
        &self,
        lon: f64,
        lat: f64,
        timestamp: DateTime<Utc>,
        filters: &LayerQuery,
    ) -> GribResult<Bracket> {
        let query = filters.clone().at_point(lon, lat);
        let before = self.nearest(&query, timestamp, TimeDirection::AtOrBefore)?;
        let after = self.nearest(&query, timestamp, TimeDirection::AtOrAfter)?;
        Ok(Bracket {
            before: side(&before),
            after: side(&after),
        })
    }
}

fn side(records: &BTreeMap<MeasurementKey, LayerRecord>) -> BTreeMap<MeasurementKey, BracketLayer> {
    let mut layers: BTreeMap<MeasurementKey, BracketLayer> = records
        .iter()
        .map(|(key, record)| (key.clone(), BracketLayer::from_record(record)))
        .collect();

    for sibling in resolve_vector_siblings(records.iter()) {
        // Components from different times do not form a vector
        if sibling.u.valid_time != sibling.v.valid_time {
            debug!(
                measurement = %sibling.measurement,
                u = %sibling.u.layer,
                v = %sibling.v.layer,
                "Vector components valid at different times"
            );
            continue;
        }
        let layer = BracketLayer {
            surface: SurfaceKey::derived(
                sibling.u.layer.clone(),
                sibling.v.layer.clone(),
                sibling.component,
            ),
            valid_time: sibling.u.valid_time,
        };
        layers.insert(sibling.measurement, layer);
    }
    layers
}
