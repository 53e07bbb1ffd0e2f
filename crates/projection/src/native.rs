//! The native map projection of a grid, selected from proj parameters.

use grib_common::ProjParams;
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};
use crate::{Geographic, LambertConformal, Mercator, PolarStereographic};

/// Spherical earth radius used by GRIB shape-of-earth code 6 (metres).
pub const DEFAULT_EARTH_RADIUS: f64 = 6_371_229.0;

/// Forward and inverse transform between geographic and projected coordinates.
///
/// `unproject` never wraps longitudes into a canonical range: a grid that
/// runs across the antimeridian yields a continuous longitude sequence
/// (e.g. 170 .. 190) rather than a jump to -170.
pub trait MapProjection {
    /// (lon, lat) in degrees to native (x, y).
    fn project(&self, lon: f64, lat: f64) -> (f64, f64);

    /// Native (x, y) to (lon, lat) in degrees, longitude unwrapped.
    fn unproject(&self, x: f64, y: f64) -> (f64, f64);
}

/// Projection family of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionKind {
    /// Plain latitude/longitude grid; native units are degrees
    Cylindrical,
    LambertConformal,
    PolarStereographic,
    Mercator,
}

impl ProjectionKind {
    /// Whether native coordinates are degrees (as opposed to metres).
    pub fn is_cylindrical(&self) -> bool {
        matches!(self, ProjectionKind::Cylindrical)
    }
}

/// A concrete native projection.
#[derive(Debug, Clone)]
pub enum NativeProjection {
    Geographic(Geographic),
    Lambert(LambertConformal),
    Polar(PolarStereographic),
    Mercator(Mercator),
}

impl NativeProjection {
    /// Select and parameterize a projection from proj-style parameters.
    ///
    /// Recognized names: `cyl`/`longlat`/`latlong`, `lcc`, `stere`, `merc`.
    pub fn from_projparams(params: &ProjParams) -> Result<Self> {
        let name = params
            .proj()
            .ok_or_else(|| ProjectionError::MissingKey("proj".to_string()))?;
        let radius = earth_radius(params);

        match name {
            "cyl" | "longlat" | "latlong" | "lonlat" => Ok(Self::Geographic(Geographic)),
            "lcc" => {
                let lat_1 = required(params, "lat_1")?;
                let lat_2 = params.get_f64("lat_2").unwrap_or(lat_1);
                let lat_0 = params.get_f64("lat_0").unwrap_or(lat_1);
                let lon_0 = required(params, "lon_0")?;
                LambertConformal::new(lat_0, lon_0, lat_1, lat_2, radius).map(Self::Lambert)
            }
            "stere" => {
                let lat_0 = required(params, "lat_0")?;
                let lon_0 = required(params, "lon_0")?;
                let lat_ts = params.get_f64("lat_ts").unwrap_or(lat_0);
                PolarStereographic::new(lat_0, lon_0, lat_ts, radius).map(Self::Polar)
            }
            "merc" => {
                let lon_0 = params.get_f64("lon_0").unwrap_or(0.0);
                let lat_ts = params.get_f64("lat_ts").unwrap_or(0.0);
                Mercator::new(lon_0, lat_ts, radius).map(Self::Mercator)
            }
            other => Err(ProjectionError::Unsupported(other.to_string())),
        }
    }

    pub fn kind(&self) -> ProjectionKind {
        match self {
            Self::Geographic(_) => ProjectionKind::Cylindrical,
            Self::Lambert(_) => ProjectionKind::LambertConformal,
            Self::Polar(_) => ProjectionKind::PolarStereographic,
            Self::Mercator(_) => ProjectionKind::Mercator,
        }
    }
}

impl MapProjection for NativeProjection {
    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        match self {
            Self::Geographic(p) => p.project(lon, lat),
            Self::Lambert(p) => p.project(lon, lat),
            Self::Polar(p) => p.project(lon, lat),
            Self::Mercator(p) => p.project(lon, lat),
        }
    }

    fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            Self::Geographic(p) => p.unproject(x, y),
            Self::Lambert(p) => p.unproject(x, y),
            Self::Polar(p) => p.unproject(x, y),
            Self::Mercator(p) => p.unproject(x, y),
        }
    }
}

fn required(params: &ProjParams, name: &str) -> Result<f64> {
    params
        .get_f64(name)
        .ok_or_else(|| ProjectionError::MissingKey(format!("projparams.{}", name)))
}

fn earth_radius(params: &ProjParams) -> f64 {
    params
        .get_f64("R")
        .or_else(|| params.get_f64("a"))
        .filter(|r| *r > 0.0)
        .unwrap_or(DEFAULT_EARTH_RADIUS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cyl_selects_geographic() {
        let params = ProjParams::new().with("proj", "cyl").with("a", 6367470.0);
        let proj = NativeProjection::from_projparams(&params).unwrap();
        assert_eq!(proj.kind(), ProjectionKind::Cylindrical);
        assert_eq!(proj.project(12.5, -3.0), (12.5, -3.0));
    }

    #[test]
    fn test_lcc_requires_standard_parallel() {
        let params = ProjParams::new().with("proj", "lcc").with("lon_0", 15.0);
        let err = NativeProjection::from_projparams(&params).unwrap_err();
        assert!(matches!(err, ProjectionError::MissingKey(_)));
    }

    #[test]
    fn test_unknown_projection_is_unsupported() {
        let params = ProjParams::new().with("proj", "geos");
        let err = NativeProjection::from_projparams(&params).unwrap_err();
        assert!(matches!(err, ProjectionError::Unsupported(ref name) if name == "geos"));
    }

    #[test]
    fn test_missing_proj_name() {
        let err = NativeProjection::from_projparams(&ProjParams::new()).unwrap_err();
        assert!(matches!(err, ProjectionError::MissingKey(_)));
    }
}
