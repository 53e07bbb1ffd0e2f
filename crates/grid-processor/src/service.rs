//! Point values at arbitrary times.
//!
//! The `TemporalInterpolator` combines catalog bracket lookups with the
//! resource cache:
//!
//! 1. find the nearest layer before and after the timestamp for every
//!    measurement covering the point (plus derived vector measurements)
//! 2. evaluate each bracket layer's cubic surface at the point
//! 3. interpolate linearly in time on Unix-epoch seconds
//!
//! # Example
//!
//! ```rust,ignore
//! let interpolator = TemporalInterpolator::new(catalog, source, &CacheConfig::from_env())?;
//!
//! let filters = LayerQuery::new().level_type("heightAboveGround");
//! for value in interpolator.interpolate_at_time(24.9, 60.2, timestamp, &filters)? {
//!     println!("{} = {}", value.measurement, value.value);
//! }
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use grib_common::{GribResult, LayerRef, MeasurementKey};
use serde::{Deserialize, Serialize};
use storage::{Catalog, LayerQuery};
use tracing::{debug, instrument, warn};

use crate::cache::{ResourceCache, SurfaceKey};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::interpolation::interpolate_time;
use crate::query::{BracketLayer, BracketLookup};
use crate::source::LayerSource;

/// Interpolated value of one measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedValue {
    pub measurement: MeasurementKey,
    pub value: f64,
}

/// A measurement left out because one of its bracket layers failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementFailure {
    pub measurement: MeasurementKey,
    /// The failing surface
    pub layer: String,
    /// The source or layer could not be resolved at all
    pub unavailable: bool,
    pub error: String,
}

/// Values and per-measurement failures of one interpolation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Interpolation {
    pub values: Vec<InterpolatedValue>,
    pub failures: Vec<MeasurementFailure>,
}

/// Spatial then temporal interpolation over indexed layers.
pub struct TemporalInterpolator {
    lookup: BracketLookup,
    cache: ResourceCache,
}

impl TemporalInterpolator {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        source: Arc<dyn LayerSource>,
        config: &CacheConfig,
    ) -> Result<Self> {
        Ok(Self {
            lookup: BracketLookup::new(catalog),
            cache: ResourceCache::new(source, config)?,
        })
    }

    pub fn lookup(&self) -> &BracketLookup {
        &self.lookup
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    /// Values at `(lon, lat)` and `timestamp` of every measurement matching
    /// `filters` that has a layer on both sides of the timestamp.
    ///
    /// Measurements missing a side, whose layers fail to resolve, or whose
    /// grid has no value at the point are left out. Use
    /// [`interpolate_with_failures`](Self::interpolate_with_failures) to see
    /// which measurements failed.
    pub fn interpolate_at_time(
        &self,
        lon: f64,
        lat: f64,
        timestamp: DateTime<Utc>,
        filters: &LayerQuery,
    ) -> GribResult<Vec<InterpolatedValue>> {
        self.interpolate_with_failures(lon, lat, timestamp, filters)
            .map(|interpolation| interpolation.values)
    }

    /// Like [`interpolate_at_time`](Self::interpolate_at_time), also
    /// reporting measurements whose layers could not be resolved.
    ///
    /// Only catalog failures abort the call; a layer failure affects its own
    /// measurement alone.
    #[instrument(skip(self, filters))]
    pub fn interpolate_with_failures(
        &self,
        lon: f64,
        lat: f64,
        timestamp: DateTime<Utc>,
        filters: &LayerQuery,
    ) -> GribResult<Interpolation> {
        let bracket = self.lookup.bracket(lon, lat, timestamp, filters)?;
        for key in bracket.unpaired() {
            debug!(measurement = %key, "No bracket on one side");
        }

        let t = timestamp.timestamp();
        let mut result = Interpolation::default();
        for (measurement, before, after) in bracket.pairs() {
            let sampled = self
                .sample(measurement, before, lon, lat)
                .and_then(|v0| Ok((v0, self.sample(measurement, after, lon, lat)?)));
            match sampled {
                Ok((Some(v0), Some(v1))) => {
                    let value =
                        interpolate_time(before.valid_epoch(), v0, after.valid_epoch(), v1, t);
                    result.values.push(InterpolatedValue {
                        measurement: measurement.clone(),
                        value,
                    });
                }
                Ok(_) => {}
                Err(failure) => result.failures.push(failure),
            }
        }
        Ok(result)
    }

    /// Value of one layer at a point, or `None` when the point lies outside
    /// the layer's grid or on missing data.
    pub fn interpolate_layer(
        &self,
        source: &str,
        index: usize,
        lon: f64,
        lat: f64,
    ) -> GribResult<Option<f64>> {
        let surface = self
            .cache
            .surface(&SurfaceKey::scalar(LayerRef::new(source, index)))?;
        Ok(surface.value_at(lon, lat))
    }

    /// Evaluate one bracket layer at a point.
    fn sample(
        &self,
        measurement: &MeasurementKey,
        layer: &BracketLayer,
        lon: f64,
        lat: f64,
    ) -> std::result::Result<Option<f64>, MeasurementFailure> {
        match self.cache.surface(&layer.surface) {
            Ok(surface) => {
                let value = surface.value_at(lon, lat);
                if value.is_none() {
                    debug!(measurement = %measurement, layer = %layer.surface, "No value at point");
                }
                Ok(value)
            }
            Err(e) => {
                warn!(
                    measurement = %measurement,
                    layer = %layer.surface,
                    error = %e,
                    unavailable = e.is_unavailable(),
                    "Skipping measurement"
                );
                Err(MeasurementFailure {
                    measurement: measurement.clone(),
                    layer: layer.surface.to_string(),
                    unavailable: e.is_unavailable(),
                    error: e.to_string(),
                })
            }
        }
    }
}
