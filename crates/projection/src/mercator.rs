//! Mercator projection (GRIB template 3.10).

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::error::{ProjectionError, Result};
use crate::{normalize_longitude, MapProjection};

/// Spherical Mercator with a latitude of true scale.
#[derive(Debug, Clone)]
pub struct Mercator {
    /// Central meridian in radians
    pub lon0: f64,
    /// Earth radius (meters)
    pub earth_radius: f64,
    /// R * cos(lat_ts)
    k: f64,
}

impl Mercator {
    pub fn new(lon0_deg: f64, lat_ts_deg: f64, earth_radius: f64) -> Result<Self> {
        if lat_ts_deg.abs() >= 90.0 {
            return Err(ProjectionError::InvalidGrid(format!(
                "Mercator latitude of true scale {} must be off the poles",
                lat_ts_deg
            )));
        }
        Ok(Self {
            lon0: normalize_longitude(lon0_deg).to_radians(),
            earth_radius,
            k: earth_radius * lat_ts_deg.to_radians().cos(),
        })
    }
}

impl MapProjection for Mercator {
    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let x = self.k * (lon.to_radians() - self.lon0);
        let y = self.k * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        (x, y)
    }

    fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let lon = self.lon0 + x / self.k;
        let lat = 2.0 * (y / self.k).exp().atan() - FRAC_PI_2;
        (lon.to_degrees(), lat.to_degrees())
    }
}
