//! Polar Stereographic projection.
//!
//! Used by polar-region GRIB grids (template 3.20). The projection plane
//! touches the sphere at a pole, or cuts it at the latitude of true scale
//! `lat_ts`. Native coordinates are metres from the pole.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::error::{ProjectionError, Result};
use crate::{normalize_longitude, MapProjection};

/// Spherical polar stereographic projection.
#[derive(Debug, Clone)]
pub struct PolarStereographic {
    /// Central meridian (orientation of the grid) in radians
    pub lon0: f64,
    /// True for the north polar aspect
    pub north: bool,
    /// Earth radius (meters)
    pub earth_radius: f64,
    /// Scale factor applied to tan(colatitude / 2)
    scale: f64,
}

impl PolarStereographic {
    /// Create a polar stereographic projection.
    ///
    /// `lat0_deg` selects the pole and must be +90 or -90. `lat_ts_deg` is the
    /// latitude of true scale.
    pub fn new(lat0_deg: f64, lon0_deg: f64, lat_ts_deg: f64, earth_radius: f64) -> Result<Self> {
        if (lat0_deg.abs() - 90.0).abs() > 1e-9 {
            return Err(ProjectionError::InvalidGrid(format!(
                "oblique stereographic (lat_0={}) is not supported",
                lat0_deg
            )));
        }
        let north = lat0_deg > 0.0;

        // Work in the north aspect; the south aspect mirrors latitudes.
        let lat_ts = if north { lat_ts_deg } else { -lat_ts_deg }.to_radians();
        let scale = if (lat_ts - FRAC_PI_2).abs() < 1e-10 {
            2.0 * earth_radius
        } else {
            earth_radius * lat_ts.cos() / (FRAC_PI_4 - lat_ts / 2.0).tan()
        };
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ProjectionError::InvalidGrid(format!(
                "invalid latitude of true scale {}",
                lat_ts_deg
            )));
        }

        Ok(Self {
            lon0: normalize_longitude(lon0_deg).to_radians(),
            north,
            earth_radius,
            scale,
        })
    }
}

impl MapProjection for PolarStereographic {
    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lat = if self.north { lat } else { -lat }.to_radians();
        let dlon = lon.to_radians() - self.lon0;
        let rho = self.scale * (FRAC_PI_4 - lat / 2.0).tan();

        if self.north {
            (rho * dlon.sin(), -rho * dlon.cos())
        } else {
            (rho * dlon.sin(), rho * dlon.cos())
        }
    }

    fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let rho = (x * x + y * y).sqrt();
        let lat = FRAC_PI_2 - 2.0 * (rho / self.scale).atan();
        let theta = if self.north { x.atan2(-y) } else { x.atan2(y) };
        let lon = self.lon0 + theta;
        let lat = if self.north { lat } else { -lat };
        (lon.to_degrees(), lat.to_degrees())
    }
}
