//! Ingestion into an in-memory catalog, then lookup and interpolation.

use std::sync::Arc;

use grib_common::{LayerRef, MeasurementKey, ParameterInfo};
use grid_processor::{CacheConfig, TemporalInterpolator};
use ingestion::{IngestOptions, Ingester, IngestionError, ParameterMap};
use storage::{Catalog, CatalogStats, LayerQuery, MemoryCatalog};
use test_utils::{
    assert_approx_eq, create_block_grid, grid, measurement_layer, temperature_layer, time,
    wind_layers, MemoryLayerSource,
};

fn pacific_files() -> MemoryLayerSource {
    let g = grid::PACIFIC;
    let (u0, v0) = wind_layers(&g, 3.0, 4.0, time::reference_time());
    let (u1, v1) = wind_layers(&g, 6.0, 8.0, time::at_offset(3600));
    MemoryLayerSource::new()
        .with_file(
            "t0.grib",
            vec![temperature_layer(&g, 280.0, time::reference_time()), u0, v0],
        )
        .with_file(
            "t1.grib",
            vec![temperature_layer(&g, 290.0, time::at_offset(3600)), u1, v1],
        )
}

fn ingester(catalog: &Arc<MemoryCatalog>, files: &MemoryLayerSource) -> Ingester {
    Ingester::new(catalog.clone(), Arc::new(files.clone()))
}

#[test]
fn index_source_writes_every_layer() {
    let catalog = Arc::new(MemoryCatalog::new());
    let files = pacific_files();

    let result = ingester(&catalog, &files).index_source("t0.grib").unwrap();
    assert!(!result.skipped);
    assert_eq!(result.layers_indexed, 3);
    assert_eq!(result.polygons_created, 1);

    assert_eq!(
        catalog.stats().unwrap(),
        CatalogStats {
            polygons: 1,
            measurements: 3,
            layers: 3,
            sources: 1,
        }
    );
    assert_eq!(files.close_count(), 1);
}

#[test]
fn layers_are_numbered_from_one() {
    let catalog = Arc::new(MemoryCatalog::new());
    let files = pacific_files();
    ingester(&catalog, &files).index_source("t0.grib").unwrap();

    let mut refs: Vec<LayerRef> = catalog
        .query_layers(&LayerQuery::new())
        .unwrap()
        .into_iter()
        .map(|r| r.layer)
        .collect();
    refs.sort();
    assert_eq!(
        refs,
        vec![
            LayerRef::new("t0.grib", 1),
            LayerRef::new("t0.grib", 2),
            LayerRef::new("t0.grib", 3),
        ]
    );
}

#[test]
fn indexed_source_is_skipped() {
    let catalog = Arc::new(MemoryCatalog::new());
    let files = pacific_files();
    let ingester = ingester(&catalog, &files);

    ingester.index_source("t0.grib").unwrap();
    let again = ingester.index_source("t0.grib").unwrap();

    assert!(again.skipped);
    assert_eq!(again.layers_indexed, 0);
    assert_eq!(files.open_count(), 1);
    assert_eq!(catalog.stats().unwrap().layers, 3);
}

#[test]
fn same_grid_shares_one_polygon() {
    let catalog = Arc::new(MemoryCatalog::new());
    let files = pacific_files();
    let ingester = ingester(&catalog, &files);

    let first = ingester.index_source("t0.grib").unwrap();
    let second = ingester.index_source("t1.grib").unwrap();

    assert_eq!(first.polygons_created, 1);
    assert_eq!(second.polygons_created, 0);
    assert_eq!(catalog.stats().unwrap().polygons, 1);

    let records = catalog.query_layers(&LayerQuery::new()).unwrap();
    assert_eq!(records.len(), 6);
    assert!(records.iter().all(|r| r.gridid == records[0].gridid));
}

#[test]
fn polygon_keeps_projection_parameters() {
    let catalog = Arc::new(MemoryCatalog::new());
    let files = pacific_files();
    let g = grid::PACIFIC;

    let gridid = ingester(&catalog, &files)
        .index_layer(&temperature_layer(&g, 280.0, time::reference_time()), "t0.grib", 1)
        .unwrap();

    let polygon = catalog.polygon(&gridid).unwrap().unwrap();
    assert_eq!(polygon.projparams["proj"], "cyl");
    assert!(polygon.wkt.starts_with("MULTIPOLYGON"));
    assert!(polygon.contains(-175.0, 0.0));
    assert!(polygon.contains(175.0, 0.0));
}

#[test]
fn distinct_coverages_get_distinct_gridids() {
    let catalog = Arc::new(MemoryCatalog::new());
    let files = MemoryLayerSource::new();
    let ingester = ingester(&catalog, &files);
    let g = grid::SIMPLE_10X10;
    let parameter = ParameterInfo::new("Precipitation", "kg m**-2");

    let full = measurement_layer(
        &g,
        vec![1.0; g.size()],
        parameter.clone(),
        "surface",
        0.0,
        time::reference_time(),
    );
    let block = measurement_layer(
        &g,
        create_block_grid(g.nx, g.ny, 2, 6, 1.0),
        parameter,
        "surface",
        0.0,
        time::reference_time(),
    );

    let a = ingester.index_layer(&full, "p.grib", 1).unwrap();
    let b = ingester.index_layer(&block, "p.grib", 2).unwrap();
    assert_ne!(a, b);
    assert_eq!(catalog.stats().unwrap().polygons, 2);
    assert_eq!(catalog.stats().unwrap().measurements, 1);
}

#[test]
fn parameter_map_renames_measurements() {
    let catalog = Arc::new(MemoryCatalog::new());
    let files = pacific_files();
    let options = IngestOptions {
        parameters: ParameterMap::new().with("0.0", "Air temperature", "K"),
        ..Default::default()
    };
    let ingester = Ingester::with_options(catalog.clone(), Arc::new(files.clone()), options);

    ingester.index_source("t0.grib").unwrap();

    let names = catalog
        .query_layers(&LayerQuery::new().parameter("Air temperature"))
        .unwrap();
    assert_eq!(names.len(), 1);
    assert_eq!(
        names[0].measurement,
        MeasurementKey::new("Air temperature", "K", "heightAboveGround", 2.0)
    );
    assert!(catalog
        .query_layers(&LayerQuery::new().parameter("Temperature"))
        .unwrap()
        .is_empty());
}

#[test]
fn batch_reports_failures_and_continues() {
    let catalog = Arc::new(MemoryCatalog::new());
    let files = pacific_files();
    let g = grid::PACIFIC;
    files.insert(
        "broken.grib",
        vec![
            temperature_layer(&g, 280.0, time::reference_time()),
            g.layer(vec![1.0; 5]),
        ],
    );

    let mut failures = Vec::new();
    let summary = ingester(&catalog, &files).index_sources(
        ["t0.grib", "missing.grib", "broken.grib", "t1.grib", "t0.grib"],
        |failure| failures.push(failure),
    );

    assert_eq!(summary.indexed, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.layers, 6);

    assert_eq!(failures.len(), 2);
    assert_eq!(failures[0].source, "missing.grib");
    assert!(matches!(failures[0].error, IngestionError::SourceOpen { .. }));
    assert_eq!(failures[1].source, "broken.grib");
    assert!(matches!(
        failures[1].error,
        IngestionError::Coverage { ref layer, .. } if layer.index == 2
    ));
    assert_eq!(failures[1].error.locator(), Some("broken.grib"));

    // The broken source was opened and closed despite the failure.
    assert_eq!(files.close_count(), 3);
}

#[test]
fn unreadable_source_is_not_registered() {
    let catalog = Arc::new(MemoryCatalog::new());
    let files = MemoryLayerSource::new();

    let err = ingester(&catalog, &files).index_source("nowhere.grib").unwrap_err();
    assert!(matches!(err, IngestionError::SourceOpen { .. }));
    assert!(!catalog.has_source("nowhere.grib").unwrap());
}

#[test]
fn failed_source_leaves_nothing_and_is_retried() {
    let catalog = Arc::new(MemoryCatalog::new());
    let g = grid::PACIFIC;
    let files = MemoryLayerSource::new().with_file(
        "broken.grib",
        vec![
            temperature_layer(&g, 280.0, time::reference_time()),
            g.layer(vec![1.0; 5]),
        ],
    );

    let err = ingester(&catalog, &files).index_source("broken.grib").unwrap_err();
    assert!(matches!(err, IngestionError::Coverage { ref layer, .. } if layer.index == 2));
    assert!(!catalog.has_source("broken.grib").unwrap());
    assert_eq!(catalog.stats().unwrap(), CatalogStats::default());
    assert_eq!(files.close_count(), 1);

    // The file is repaired upstream and shows up again
    let (u, v) = wind_layers(&g, 3.0, 4.0, time::reference_time());
    files.insert(
        "broken.grib",
        vec![temperature_layer(&g, 280.0, time::reference_time()), u, v],
    );
    let result = ingester(&catalog, &files).index_source("broken.grib").unwrap();
    assert!(!result.skipped);
    assert_eq!(result.layers_indexed, 3);
    assert!(catalog.has_source("broken.grib").unwrap());
    assert_eq!(catalog.stats().unwrap().layers, 3);
}

#[test]
fn ingested_catalog_interpolates_across_the_antimeridian() {
    let catalog = Arc::new(MemoryCatalog::new());
    let files = pacific_files();
    let summary = ingester(&catalog, &files).index_sources(["t0.grib", "t1.grib"], |failure| {
        panic!("unexpected failure: {:?}", failure)
    });
    assert_eq!(summary.indexed, 2);

    let interpolator = TemporalInterpolator::new(
        catalog.clone(),
        Arc::new(files.clone()),
        &CacheConfig::default(),
    )
    .unwrap();
    let values = interpolator
        .interpolate_at_time(-175.0, 0.0, time::at_offset(1800), &LayerQuery::new())
        .unwrap();

    let temperature = values
        .iter()
        .find(|v| v.measurement.name == "Temperature")
        .unwrap();
    assert_approx_eq!(temperature.value, 285.0, 1e-9);

    let magnitude = values
        .iter()
        .find(|v| v.measurement.name == "Magnitude component of wind")
        .unwrap();
    assert_approx_eq!(magnitude.value, 7.5, 1e-9);
}

#[test]
fn snapshot_of_ingested_catalog_round_trips() {
    let catalog = Arc::new(MemoryCatalog::new());
    let files = pacific_files();
    ingester(&catalog, &files).index_source("t0.grib").unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.json");
    catalog.save(&path).unwrap();

    let loaded = MemoryCatalog::load(&path).unwrap();
    assert_eq!(loaded.stats().unwrap(), catalog.stats().unwrap());
    assert!(loaded.has_source("t0.grib").unwrap());
    assert_eq!(
        loaded.query_layers(&LayerQuery::new().at_point(-175.0, 0.0)).unwrap().len(),
        3
    );
}
