//! In-memory catalog with JSON snapshot persistence.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use grib_common::{GribIndexError, GribResult, GridId, LayerRecord, LayerRef, MeasurementKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{Catalog, PolygonRecord};
use crate::query::{apply_level_rule, sort_records, FieldValue, LayerField, LayerQuery};

#[derive(Debug, Default)]
struct CatalogState {
    polygons: BTreeMap<GridId, PolygonRecord>,
    measurements: BTreeSet<MeasurementKey>,
    layers: BTreeMap<LayerRef, LayerRecord>,
    sources: BTreeSet<String>,
}

/// On-disk form of a catalog.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    polygons: Vec<PolygonRecord>,
    measurements: Vec<MeasurementKey>,
    layers: Vec<LayerRecord>,
    sources: Vec<String>,
}

/// Entry counts of a catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub polygons: usize,
    pub measurements: usize,
    pub layers: usize,
    pub sources: usize,
}

/// Catalog kept in process memory behind a read/write lock.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: RwLock<CatalogState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> GribResult<RwLockReadGuard<'_, CatalogState>> {
        self.state
            .read()
            .map_err(|_| GribIndexError::catalog("catalog lock poisoned"))
    }

    fn write(&self) -> GribResult<RwLockWriteGuard<'_, CatalogState>> {
        self.state
            .write()
            .map_err(|_| GribIndexError::catalog("catalog lock poisoned"))
    }

    pub fn stats(&self) -> GribResult<CatalogStats> {
        let state = self.read()?;
        Ok(CatalogStats {
            polygons: state.polygons.len(),
            measurements: state.measurements.len(),
            layers: state.layers.len(),
            sources: state.sources.len(),
        })
    }

    /// Write a JSON snapshot of the catalog.
    pub fn save(&self, path: impl AsRef<Path>) -> GribResult<()> {
        let path = path.as_ref();
        let snapshot = {
            let state = self.read()?;
            Snapshot {
                polygons: state.polygons.values().cloned().collect(),
                measurements: state.measurements.iter().cloned().collect(),
                layers: state.layers.values().cloned().collect(),
                sources: state.sources.iter().cloned().collect(),
            }
        };
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(writer, &snapshot)?;
        info!(
            path = %path.display(),
            layers = snapshot.layers.len(),
            polygons = snapshot.polygons.len(),
            "Saved catalog snapshot"
        );
        Ok(())
    }

    /// Load a catalog from a JSON snapshot.
    pub fn load(path: impl AsRef<Path>) -> GribResult<Self> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let snapshot: Snapshot = serde_json::from_reader(reader)?;

        let state = CatalogState {
            polygons: snapshot
                .polygons
                .into_iter()
                .map(|p| (p.gridid.clone(), p))
                .collect(),
            measurements: snapshot.measurements.into_iter().collect(),
            layers: snapshot
                .layers
                .into_iter()
                .map(|r| (r.layer.clone(), r))
                .collect(),
            sources: snapshot.sources.into_iter().collect(),
        };
        info!(
            path = %path.display(),
            layers = state.layers.len(),
            polygons = state.polygons.len(),
            "Loaded catalog snapshot"
        );
        Ok(Self {
            state: RwLock::new(state),
        })
    }

    /// Records matching every filter, including the point and level rule.
    fn matching(&self, query: &LayerQuery) -> GribResult<Vec<LayerRecord>> {
        let state = self.read()?;
        let mut inside: HashMap<&GridId, bool> = HashMap::new();

        let mut records = Vec::new();
        for record in state.layers.values() {
            if !query.matches_attributes(record) {
                continue;
            }
            if let Some((lon, lat)) = query.point {
                let contained = *inside.entry(&record.gridid).or_insert_with(|| {
                    state
                        .polygons
                        .get(&record.gridid)
                        .map(|p| p.contains(lon, lat))
                        .unwrap_or(false)
                });
                if !contained {
                    continue;
                }
            }
            records.push(record.clone());
        }
        Ok(apply_level_rule(records, query.level))
    }
}

impl Catalog for MemoryCatalog {
    fn find_or_create_polygon(&self, polygon: &PolygonRecord) -> GribResult<bool> {
        let mut state = self.write()?;
        if state.polygons.contains_key(&polygon.gridid) {
            return Ok(false);
        }
        debug!(gridid = %polygon.gridid, "Created coverage polygon");
        state.polygons.insert(polygon.gridid.clone(), polygon.clone());
        Ok(true)
    }

    fn polygon(&self, gridid: &GridId) -> GribResult<Option<PolygonRecord>> {
        Ok(self.read()?.polygons.get(gridid).cloned())
    }

    fn insert_measurement(&self, measurement: &MeasurementKey) -> GribResult<()> {
        self.write()?.measurements.insert(measurement.clone());
        Ok(())
    }

    fn insert_layer_record(&self, record: &LayerRecord) -> GribResult<()> {
        let mut state = self.write()?;
        if !state.polygons.contains_key(&record.gridid) {
            return Err(GribIndexError::catalog(format!(
                "layer {} references unknown polygon {}",
                record.layer, record.gridid
            )));
        }
        state
            .layers
            .entry(record.layer.clone())
            .or_insert_with(|| record.clone());
        Ok(())
    }

    fn query_layers(&self, query: &LayerQuery) -> GribResult<Vec<LayerRecord>> {
        let mut records = self.matching(query)?;
        sort_records(&mut records, query.time.as_ref());
        Ok(records)
    }

    fn query_distinct_field(&self, field: LayerField, query: &LayerQuery) -> GribResult<Vec<FieldValue>> {
        let mut values: Vec<FieldValue> = self
            .matching(query)?
            .iter()
            .map(|r| field.value_of(&r.measurement))
            .collect();
        FieldValue::sort_dedup(&mut values);
        Ok(values)
    }

    fn has_source(&self, locator: &str) -> GribResult<bool> {
        Ok(self.read()?.sources.contains(locator))
    }

    fn register_source(&self, locator: &str) -> GribResult<()> {
        self.write()?.sources.insert(locator.to_string());
        Ok(())
    }
}
