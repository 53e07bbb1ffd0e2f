//! Catalog helpers shared by the integration tests.

use geo::{polygon, MultiPolygon};
use grib_common::{DecodedLayer, GridId, LayerRecord, LayerRef, MeasurementKey};
use storage::{Catalog, MemoryCatalog, PolygonRecord};
use test_utils::LatLonGrid;

/// Polygon covering the bounding box of a northward-scanning grid.
pub fn covering(gridid: &str, grid: &LatLonGrid) -> PolygonRecord {
    let (west, south) = (grid.lon0, grid.lat0);
    let (east, north) = (grid.last_lon(), grid.last_lat());
    PolygonRecord {
        gridid: GridId::new(gridid),
        wkt: String::new(),
        geometry: MultiPolygon::new(vec![polygon![
            (x: west, y: south),
            (x: east, y: south),
            (x: east, y: north),
            (x: west, y: north)
        ]]),
        projparams: serde_json::json!({"proj": "cyl"}),
    }
}

pub fn measurement(layer: &DecodedLayer) -> MeasurementKey {
    MeasurementKey::new(
        &layer.parameter.name,
        &layer.parameter.units,
        &layer.level_type,
        layer.level,
    )
}

/// Record every layer of `source` (1-based) under polygon `gridid`.
pub fn index(catalog: &MemoryCatalog, gridid: &str, source: &str, layers: &[DecodedLayer]) {
    for (i, layer) in layers.iter().enumerate() {
        let record = LayerRecord {
            layer: LayerRef::new(source, i + 1),
            measurement: measurement(layer),
            gridid: GridId::new(gridid),
            analysis_time: layer.analysis_time,
            valid_time: layer.valid_time,
        };
        catalog.insert_measurement(&record.measurement).unwrap();
        catalog.insert_layer_record(&record).unwrap();
    }
    catalog.register_source(source).unwrap();
}
