//! Lambert Conformal Conic projection.
//!
//! This projection is commonly used for regional NWP grids (HRRR, AROME,
//! HARMONIE). It maps a cone tangent or secant to the Earth's surface onto a
//! flat plane.
//!
//! The projection parameters include:
//! - Reference latitude (lat0): The latitude of the false origin
//! - Reference longitude (lon0): The central meridian (LoV in GRIB2)
//! - Standard parallel(s): Latin1 and Latin2 (can be equal for tangent cone)

use std::f64::consts::PI;

use crate::error::{ProjectionError, Result};
use crate::{normalize_longitude, MapProjection};

/// Lambert Conformal Conic projection on a sphere.
///
/// Native coordinates are metres from the point (lon0, lat0).
#[derive(Debug, Clone)]
pub struct LambertConformal {
    /// Central meridian (LoV) in radians, normalized to (-pi, pi]
    pub lon0: f64,
    /// Reference latitude in radians
    pub lat0: f64,
    /// First standard parallel in radians
    pub latin1: f64,
    /// Second standard parallel in radians
    pub latin2: f64,
    /// Earth radius (meters)
    pub earth_radius: f64,
    /// Cone constant (n)
    n: f64,
    /// F constant
    f: f64,
    /// Rho at the reference latitude
    rho0: f64,
}

impl LambertConformal {
    /// Create a new Lambert Conformal projection.
    ///
    /// # Arguments
    /// * `lat0_deg` - Latitude of the false origin (degrees)
    /// * `lon0_deg` - Central meridian (degrees)
    /// * `latin1_deg` - First standard parallel (degrees)
    /// * `latin2_deg` - Second standard parallel (degrees)
    /// * `earth_radius` - Sphere radius (meters)
    pub fn new(
        lat0_deg: f64,
        lon0_deg: f64,
        latin1_deg: f64,
        latin2_deg: f64,
        earth_radius: f64,
    ) -> Result<Self> {
        let lat0 = lat0_deg.to_radians();
        let lon0 = normalize_longitude(lon0_deg).to_radians();
        let latin1 = latin1_deg.to_radians();
        let latin2 = latin2_deg.to_radians();

        // Compute cone constant n
        let n = if (latin1 - latin2).abs() < 1e-10 {
            // Tangent cone (single standard parallel)
            latin1.sin()
        } else {
            // Secant cone (two standard parallels)
            let ln_ratio = (latin1.cos() / latin2.cos()).ln();
            let tan_ratio =
                ((PI / 4.0 + latin2 / 2.0).tan() / (PI / 4.0 + latin1 / 2.0).tan()).ln();
            ln_ratio / tan_ratio
        };

        if n.abs() < 1e-10 || !n.is_finite() {
            return Err(ProjectionError::InvalidGrid(format!(
                "degenerate Lambert cone for standard parallels {} / {}",
                latin1_deg, latin2_deg
            )));
        }

        let f = (latin1.cos() * (PI / 4.0 + latin1 / 2.0).tan().powf(n)) / n;
        let rho0 = earth_radius * f / (PI / 4.0 + lat0 / 2.0).tan().powf(n);

        Ok(Self {
            lon0,
            lat0,
            latin1,
            latin2,
            earth_radius,
            n,
            f,
            rho0,
        })
    }

    /// Cone constant.
    pub fn cone_constant(&self) -> f64 {
        self.n
    }
}

impl MapProjection for LambertConformal {
    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lat = lat.to_radians();

        // Normalize longitude difference to [-π, π]
        let mut dlon = lon.to_radians() - self.lon0;
        while dlon > PI {
            dlon -= 2.0 * PI;
        }
        while dlon < -PI {
            dlon += 2.0 * PI;
        }

        let rho = self.earth_radius * self.f / (PI / 4.0 + lat / 2.0).tan().powf(self.n);
        let theta = self.n * dlon;

        (rho * theta.sin(), self.rho0 - rho * theta.cos())
    }

    fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        let sign = self.n.signum();
        let dy = self.rho0 - y;
        let rho = sign * (x * x + dy * dy).sqrt();
        let theta = (sign * x).atan2(sign * dy);

        let lat = if rho == 0.0 {
            sign * PI / 2.0
        } else {
            2.0 * ((self.earth_radius * self.f / rho).powf(1.0 / self.n)).atan() - PI / 2.0
        };
        let lon = self.lon0 + theta / self.n;

        (lon.to_degrees(), lat.to_degrees())
    }
}
