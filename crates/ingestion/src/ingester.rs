//! Indexing of decoded layers and whole sources into the catalog.

use std::sync::Arc;

use coverage::{ExtractOptions, GridShapeExtractor};
use grib_common::{DecodedLayer, GridId, LayerRecord, LayerRef, MeasurementKey};
use grid_processor::{GribFile, LayerSource};
use storage::{Catalog, PolygonRecord};
use tracing::{debug, info, warn};

use crate::error::{IngestionError, Result};
use crate::parameters::ParameterMap;

/// Options for ingestion operations.
#[derive(Debug, Clone, Default)]
pub struct IngestOptions {
    /// Coverage polygon extraction settings
    pub extract: ExtractOptions,
    /// Remapping of parameter codes to catalog names
    pub parameters: ParameterMap,
}

/// Result of indexing one source.
#[derive(Debug, Clone, PartialEq)]
pub struct IngestionResult {
    /// Source locator
    pub source: String,
    /// Number of layers written to the catalog
    pub layers_indexed: usize,
    /// Coverage polygons created by this source (others were shared)
    pub polygons_created: usize,
    /// The source was already indexed and was left untouched
    pub skipped: bool,
}

/// A source that failed inside a batch.
#[derive(Debug)]
pub struct IngestFailure {
    pub source: String,
    pub error: IngestionError,
}

/// Totals of a batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub layers: usize,
}

/// Catalog rows of one layer, ready to be written.
#[derive(Debug)]
struct StagedLayer {
    polygon: PolygonRecord,
    record: LayerRecord,
}

/// Core ingester.
///
/// Pushes each decoded layer through coverage extraction and writes the
/// polygon, measurement and layer record through the catalog interface.
pub struct Ingester {
    catalog: Arc<dyn Catalog>,
    source: Arc<dyn LayerSource>,
    extractor: GridShapeExtractor,
    parameters: ParameterMap,
}

impl Ingester {
    pub fn new(catalog: Arc<dyn Catalog>, source: Arc<dyn LayerSource>) -> Self {
        Self::with_options(catalog, source, IngestOptions::default())
    }

    pub fn with_options(
        catalog: Arc<dyn Catalog>,
        source: Arc<dyn LayerSource>,
        options: IngestOptions,
    ) -> Self {
        Self {
            catalog,
            source,
            extractor: GridShapeExtractor::new(options.extract),
            parameters: options.parameters,
        }
    }

    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Catalog identity of a decoded layer after parameter remapping.
    pub fn measurement(&self, layer: &DecodedLayer) -> MeasurementKey {
        let (name, unit) = self.parameters.resolve(&layer.parameter);
        MeasurementKey::new(name, unit, layer.level_type.clone(), layer.level)
    }

    /// Index one layer found at `index` (1-based) of `locator`.
    ///
    /// Returns the gridid of the layer's coverage polygon.
    pub fn index_layer(&self, layer: &DecodedLayer, locator: &str, index: usize) -> Result<GridId> {
        let staged = self.stage_layer(layer, LayerRef::new(locator, index))?;
        self.commit_layer(staged).map(|(gridid, _)| gridid)
    }

    /// Extract coverage and build the catalog rows of a layer without
    /// writing anything.
    fn stage_layer(&self, layer: &DecodedLayer, layer_ref: LayerRef) -> Result<StagedLayer> {
        let polygon = self
            .extractor
            .extract(layer)
            .map_err(|source| IngestionError::Coverage {
                layer: layer_ref.clone(),
                source,
            })?;

        let record = LayerRecord {
            layer: layer_ref,
            measurement: self.measurement(layer),
            gridid: polygon.gridid.clone(),
            analysis_time: layer.analysis_time,
            valid_time: layer.valid_time,
        };
        let polygon = PolygonRecord {
            gridid: polygon.gridid.clone(),
            wkt: polygon.wkt(),
            geometry: polygon.geometry,
            projparams: layer.projparams.to_json(),
        };
        Ok(StagedLayer { polygon, record })
    }

    fn commit_layer(&self, staged: StagedLayer) -> Result<(GridId, bool)> {
        let StagedLayer { polygon, record } = staged;
        let created = self
            .catalog
            .find_or_create_polygon(&polygon)
            .map_err(IngestionError::CatalogRegister)?;
        self.catalog
            .insert_measurement(&record.measurement)
            .map_err(IngestionError::CatalogRegister)?;
        self.catalog
            .insert_layer_record(&record)
            .map_err(IngestionError::CatalogRegister)?;

        debug!(layer = %record.layer, gridid = %record.gridid, created, "Indexed layer");
        Ok((record.gridid, created))
    }

    /// Index every layer of a source.
    ///
    /// A source the catalog already knows is skipped. Every layer is decoded
    /// and its coverage extracted before the first catalog write, so a
    /// source that fails to decode leaves nothing behind and is retried on
    /// the next run. The source is registered only after all of its layers
    /// are written.
    pub fn index_source(&self, locator: &str) -> Result<IngestionResult> {
        let known = self
            .catalog
            .has_source(locator)
            .map_err(IngestionError::CatalogRegister)?;
        if known {
            info!(source = %locator, "Source already indexed");
            return Ok(IngestionResult {
                source: locator.to_string(),
                layers_indexed: 0,
                polygons_created: 0,
                skipped: true,
            });
        }

        let mut file = self
            .source
            .open(locator)
            .map_err(|e| IngestionError::SourceOpen {
                locator: locator.to_string(),
                message: e.to_string(),
            })?;
        let staged = self.stage_layers(file.as_mut(), locator);
        file.close();
        let staged = staged?;

        let mut result = IngestionResult {
            source: locator.to_string(),
            layers_indexed: 0,
            polygons_created: 0,
            skipped: false,
        };
        for layer in staged {
            let (_, created) = self.commit_layer(layer)?;
            result.layers_indexed += 1;
            result.polygons_created += usize::from(created);
        }
        self.catalog
            .register_source(locator)
            .map_err(IngestionError::CatalogRegister)?;

        info!(
            source = %locator,
            layers = result.layers_indexed,
            polygons = result.polygons_created,
            "Indexed source"
        );
        Ok(result)
    }

    fn stage_layers(&self, file: &mut dyn GribFile, locator: &str) -> Result<Vec<StagedLayer>> {
        (1..=file.layer_count())
            .map(|index| {
                let layer_ref = LayerRef::new(locator, index);
                let layer = file.layer(index).map_err(|e| IngestionError::LayerDecode {
                    layer: layer_ref.clone(),
                    message: e.to_string(),
                })?;
                self.stage_layer(&layer, layer_ref)
            })
            .collect()
    }

    /// Index many sources, reporting failures to `on_failure`.
    ///
    /// A failing source never stops the remaining ones.
    pub fn index_sources<I, F>(&self, locators: I, mut on_failure: F) -> BatchSummary
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        F: FnMut(IngestFailure),
    {
        let mut summary = BatchSummary::default();

        for locator in locators {
            let locator = locator.as_ref();
            match self.index_source(locator) {
                Ok(result) if result.skipped => summary.skipped += 1,
                Ok(result) => {
                    summary.indexed += 1;
                    summary.layers += result.layers_indexed;
                }
                Err(error) => {
                    warn!(source = %locator, error = %error, "Failed to index source");
                    summary.failed += 1;
                    on_failure(IngestFailure {
                        source: locator.to_string(),
                        error,
                    });
                }
            }
        }

        info!(
            indexed = summary.indexed,
            skipped = summary.skipped,
            failed = summary.failed,
            "Batch ingestion complete"
        );
        summary
    }
}
