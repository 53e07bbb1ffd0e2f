//! Common test fixtures: grid layouts, layer builders and an in-memory
//! layer source standing in for a GRIB decoder.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, TimeZone, Utc};
use grib_common::{DecodedLayer, GribIndexError, GribKeys, GribResult, ParameterInfo, ProjParams};
use grid_processor::{GribFile, LayerSource};

/// A regular latitude/longitude grid layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLonGrid {
    pub nx: usize,
    pub ny: usize,
    /// Longitude of the first grid point
    pub lon0: f64,
    /// Latitude of the first grid point
    pub lat0: f64,
    /// Longitude step along a row
    pub dlon: f64,
    /// Latitude step between rows (negative for north-to-south scanning)
    pub dlat: f64,
}

impl LatLonGrid {
    pub const fn new(nx: usize, ny: usize, lon0: f64, lat0: f64, dlon: f64, dlat: f64) -> Self {
        Self {
            nx,
            ny,
            lon0,
            lat0,
            dlon,
            dlat,
        }
    }

    /// Returns the total number of grid cells.
    pub fn size(&self) -> usize {
        self.nx * self.ny
    }

    pub fn last_lon(&self) -> f64 {
        self.lon0 + self.dlon * (self.nx - 1) as f64
    }

    pub fn last_lat(&self) -> f64 {
        self.lat0 + self.dlat * (self.ny - 1) as f64
    }

    /// GRIB keys describing this grid, using the `Ni`/`Nj` aliases.
    pub fn keys(&self) -> GribKeys {
        GribKeys::new()
            .with("Ni", self.nx as i64)
            .with("Nj", self.ny as i64)
            .with("latitudeOfFirstGridPointInDegrees", self.lat0)
            .with("longitudeOfFirstGridPointInDegrees", self.lon0)
            .with("latitudeOfLastGridPointInDegrees", self.last_lat())
            .with("longitudeOfLastGridPointInDegrees", self.last_lon())
            .with("iScansNegatively", 0i64)
            .with("jScansPositively", if self.dlat > 0.0 { 1i64 } else { 0i64 })
    }

    pub fn projparams(&self) -> ProjParams {
        ProjParams::new().with("proj", "cyl").with("a", 6371229.0)
    }

    /// A layer on this grid with the given values.
    pub fn layer(&self, values: Vec<f64>) -> DecodedLayer {
        DecodedLayer::new(values, self.nx, self.ny)
            .with_keys(self.keys())
            .with_projparams(self.projparams())
    }

    /// Latitude/longitude of grid point `(col, row)`.
    pub fn point(&self, col: usize, row: usize) -> (f64, f64) {
        (
            self.lon0 + self.dlon * col as f64,
            self.lat0 + self.dlat * row as f64,
        )
    }
}

/// Common grid layouts for testing.
pub mod grid {
    use super::LatLonGrid;

    /// Simple 10x10 one-degree grid starting at (0, 0), scanning northward
    pub const SIMPLE_10X10: LatLonGrid = LatLonGrid::new(10, 10, 0.0, 0.0, 1.0, 1.0);

    /// Five-degree global grid, north to south, longitudes 0..355
    pub const GLOBAL_5DEG: LatLonGrid = LatLonGrid::new(72, 37, 0.0, 90.0, 5.0, -5.0);

    /// Half-degree grid centred on the antimeridian (170E .. 170W)
    pub const PACIFIC: LatLonGrid = LatLonGrid::new(41, 21, 170.0, -10.0, 0.5, 1.0);

    /// Northern Europe, quarter degree
    pub const SCANDINAVIA: LatLonGrid = LatLonGrid::new(81, 61, 0.0, 55.0, 0.25, 0.25);
}

/// GRIB keys and proj parameters of a small HRRR-like Lambert conformal grid
/// with `spacing` metre cells.
pub fn lambert_grid(nx: usize, ny: usize, spacing: f64) -> (GribKeys, ProjParams) {
    let keys = GribKeys::new()
        .with("Nx", nx as i64)
        .with("Ny", ny as i64)
        .with("DxInMetres", spacing)
        .with("DyInMetres", spacing)
        .with("latitudeOfFirstGridPointInDegrees", 35.0)
        .with("longitudeOfFirstGridPointInDegrees", 260.0)
        .with("jScansPositively", 1i64);
    let params = ProjParams::new()
        .with("proj", "lcc")
        .with("lat_0", 38.5)
        .with("lat_1", 38.5)
        .with("lat_2", 38.5)
        .with("lon_0", 262.5)
        .with("a", 6371229.0)
        .with("b", 6371229.0);
    (keys, params)
}

/// Common time values for testing.
pub mod time {
    use super::*;

    /// A fixed reference time for tests (2024-01-15T12:00:00Z).
    pub fn reference_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
    }

    /// Reference time shifted by `seconds`.
    pub fn at_offset(seconds: i64) -> DateTime<Utc> {
        reference_time() + Duration::seconds(seconds)
    }
}

/// Build a layer with full measurement metadata.
///
/// The analysis time is the reference time; `valid` is the layer's valid
/// time.
pub fn measurement_layer(
    grid: &LatLonGrid,
    values: Vec<f64>,
    parameter: ParameterInfo,
    level_type: &str,
    level: f64,
    valid: DateTime<Utc>,
) -> DecodedLayer {
    grid.layer(values)
        .with_parameter(parameter)
        .with_level(level_type, level)
        .with_times(time::reference_time(), valid)
}

/// 2 m temperature layer filled with a constant value.
pub fn temperature_layer(grid: &LatLonGrid, value: f64, valid: DateTime<Utc>) -> DecodedLayer {
    measurement_layer(
        grid,
        vec![value; grid.size()],
        ParameterInfo::new("Temperature", "K").with_code(0, 0),
        "heightAboveGround",
        2.0,
        valid,
    )
}

/// 10 m wind component layers (U, V) filled with constant values.
pub fn wind_layers(
    grid: &LatLonGrid,
    u: f64,
    v: f64,
    valid: DateTime<Utc>,
) -> (DecodedLayer, DecodedLayer) {
    let u_layer = measurement_layer(
        grid,
        vec![u; grid.size()],
        ParameterInfo::new("U component of wind", "m s**-1").with_code(2, 2),
        "heightAboveGround",
        10.0,
        valid,
    );
    let v_layer = measurement_layer(
        grid,
        vec![v; grid.size()],
        ParameterInfo::new("V component of wind", "m s**-1").with_code(2, 3),
        "heightAboveGround",
        10.0,
        valid,
    );
    (u_layer, v_layer)
}

/// In-memory layer source keyed by locator.
///
/// Counts opens and closes so cache behaviour can be asserted.
#[derive(Debug, Clone, Default)]
pub struct MemoryLayerSource {
    files: Arc<RwLock<HashMap<String, Arc<Vec<DecodedLayer>>>>>,
    opens: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl MemoryLayerSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_file(self, locator: &str, layers: Vec<DecodedLayer>) -> Self {
        self.insert(locator, layers);
        self
    }

    pub fn insert(&self, locator: &str, layers: Vec<DecodedLayer>) {
        self.files
            .write()
            .expect("source lock poisoned")
            .insert(locator.to_string(), Arc::new(layers));
    }

    /// Make a locator unreadable.
    pub fn remove(&self, locator: &str) {
        self.files
            .write()
            .expect("source lock poisoned")
            .remove(locator);
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

impl LayerSource for MemoryLayerSource {
    fn open(&self, locator: &str) -> GribResult<Box<dyn GribFile>> {
        let layers = self
            .files
            .read()
            .expect("source lock poisoned")
            .get(locator)
            .cloned()
            .ok_or_else(|| GribIndexError::unavailable(locator, "no such file"))?;
        self.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryFile {
            locator: locator.to_string(),
            layers,
            closes: Arc::clone(&self.closes),
            closed: false,
        }))
    }
}

struct MemoryFile {
    locator: String,
    layers: Arc<Vec<DecodedLayer>>,
    closes: Arc<AtomicUsize>,
    closed: bool,
}

impl GribFile for MemoryFile {
    fn locator(&self) -> &str {
        &self.locator
    }

    fn layer_count(&self) -> usize {
        self.layers.len()
    }

    fn layer(&mut self, index: usize) -> GribResult<DecodedLayer> {
        if self.closed {
            return Err(GribIndexError::unavailable(&self.locator, "file closed"));
        }
        index
            .checked_sub(1)
            .and_then(|i| self.layers.get(i))
            .cloned()
            .ok_or_else(|| {
                GribIndexError::unavailable(
                    &self.locator,
                    format!("layer {} out of range 1..={}", index, self.layers.len()),
                )
            })
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latlon_keys() {
        let keys = grid::GLOBAL_5DEG.keys();
        assert_eq!(keys.get_f64("longitudeOfLastGridPointInDegrees"), Some(355.0));
        assert_eq!(keys.get_f64("latitudeOfLastGridPointInDegrees"), Some(-90.0));
        assert_eq!(keys.get_i64("jScansPositively"), Some(0));
    }

    #[test]
    fn test_memory_source_layers_are_one_based() {
        let grid = grid::SIMPLE_10X10;
        let source = MemoryLayerSource::new().with_file(
            "a.grib",
            vec![temperature_layer(&grid, 280.0, time::reference_time())],
        );
        let mut file = source.open("a.grib").unwrap();
        assert_eq!(file.layer_count(), 1);
        assert!(file.layer(0).is_err());
        assert!(file.layer(1).is_ok());
        assert!(file.layer(2).is_err());
        file.close();
        file.close();
        assert_eq!(source.open_count(), 1);
        assert_eq!(source.close_count(), 1);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = MemoryLayerSource::new().open("missing.grib").err().unwrap();
        assert!(err.is_retryable());
    }
}
