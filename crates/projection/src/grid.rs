//! Grid index <-> geographic coordinate mapping for one layer.
//!
//! A grid is a projection plus an affine map from grid indices to native
//! projected coordinates: `x = x0 + dx * i`, `y = y0 + dy * j`, where
//! `(x0, y0)` is the projection of the first grid point.

use grib_common::{DecodedLayer, GribKeys, ProjParams};
use serde::{Deserialize, Serialize};

use crate::error::{ProjectionError, Result};
use crate::{normalize_longitude, MapProjection, NativeProjection, ProjectionKind};

const NX_KEYS: &[&str] = &["Nx", "Ni"];
const NY_KEYS: &[&str] = &["Ny", "Nj"];
const DX_KEYS: &[&str] = &["DxInMetres", "DiInMetres"];
const DY_KEYS: &[&str] = &["DyInMetres", "DjInMetres"];
const LAT_FIRST: &str = "latitudeOfFirstGridPointInDegrees";
const LON_FIRST: &str = "longitudeOfFirstGridPointInDegrees";
const LAT_LAST: &str = "latitudeOfLastGridPointInDegrees";
const LON_LAST: &str = "longitudeOfLastGridPointInDegrees";

/// Spatial layout of a grid. Immutable once derived from a source layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDescriptor {
    pub kind: ProjectionKind,
    pub nx: usize,
    pub ny: usize,
    /// Cell spacing along i, degrees for cylindrical grids, metres otherwise
    pub dx: f64,
    /// Cell spacing along j, degrees for cylindrical grids, metres otherwise
    pub dy: f64,
    /// Longitude of grid index (0, 0), normalized to (-180, 180]
    pub origin_lon: f64,
    /// Latitude of grid index (0, 0)
    pub origin_lat: f64,
}

/// Maps fractional grid indices to longitude/latitude and back.
#[derive(Debug, Clone)]
pub struct GridProjection {
    projection: NativeProjection,
    nx: usize,
    ny: usize,
    dx: f64,
    dy: f64,
    x0: f64,
    y0: f64,
    origin_lon: f64,
    origin_lat: f64,
}

impl GridProjection {
    /// Derive the grid projection of a decoded layer.
    pub fn from_layer(layer: &DecodedLayer) -> Result<Self> {
        Self::from_keys(&layer.keys, &layer.projparams, (layer.nx, layer.ny))
    }

    /// Derive a grid projection from GRIB keys and proj parameters.
    ///
    /// `shape` is the decoded `(nx, ny)` and is used when the keys carry no
    /// `Nx`/`Ni` or `Ny`/`Nj`.
    pub fn from_keys(
        keys: &GribKeys,
        projparams: &ProjParams,
        shape: (usize, usize),
    ) -> Result<Self> {
        let projection = NativeProjection::from_projparams(projparams)?;

        let nx = dimension(keys, NX_KEYS, shape.0)?;
        let ny = dimension(keys, NY_KEYS, shape.1)?;
        let lat_first = required(keys, LAT_FIRST)?;
        let lon_first = required(keys, LON_FIRST)?;

        let (dx, dy) = if projection.kind().is_cylindrical() {
            if nx < 2 || ny < 2 {
                return Err(ProjectionError::InvalidGrid(format!(
                    "cannot derive spacing of a {}x{} latitude/longitude grid",
                    nx, ny
                )));
            }
            let lat_last = required(keys, LAT_LAST)?;
            let mut lon_last = required(keys, LON_LAST)?;
            // Grids crossing the antimeridian may declare e.g. 170 .. -170
            if lon_last < lon_first && keys.get_i64("iScansNegatively") != Some(1) {
                lon_last += 360.0;
            }
            (
                (lon_last - lon_first) / (nx - 1) as f64,
                (lat_last - lat_first) / (ny - 1) as f64,
            )
        } else {
            let mut dx = keys
                .first_f64(DX_KEYS)
                .ok_or_else(|| ProjectionError::MissingKey(DX_KEYS.join("/")))?;
            let mut dy = keys
                .first_f64(DY_KEYS)
                .ok_or_else(|| ProjectionError::MissingKey(DY_KEYS.join("/")))?;
            if keys.get_i64("iScansNegatively") == Some(1) {
                dx = -dx;
            }
            if keys.get_i64("jScansPositively") == Some(0) {
                dy = -dy;
            }
            (dx, dy)
        };

        if dx == 0.0 || dy == 0.0 || !dx.is_finite() || !dy.is_finite() {
            return Err(ProjectionError::InvalidGrid(format!(
                "degenerate cell spacing dx={} dy={}",
                dx, dy
            )));
        }

        let origin_lon = normalize_longitude(lon_first);
        let (x0, y0) = projection.project(origin_lon, lat_first);

        Ok(Self {
            projection,
            nx,
            ny,
            dx,
            dy,
            x0,
            y0,
            origin_lon,
            origin_lat: lat_first,
        })
    }

    /// Native projected coordinates of fractional grid index `(gx, gy)`.
    pub fn scale(&self, gx: f64, gy: f64) -> (f64, f64) {
        (self.x0 + self.dx * gx, self.y0 + self.dy * gy)
    }

    /// Longitude/latitude of fractional grid index `(gx, gy)`.
    ///
    /// Longitudes are not wrapped: a grid spanning the antimeridian gives a
    /// continuous sequence past 180.
    pub fn to_geographic(&self, gx: f64, gy: f64) -> (f64, f64) {
        let (x, y) = self.scale(gx, gy);
        self.projection.unproject(x, y)
    }

    /// Fractional grid index of a longitude/latitude.
    pub fn to_grid(&self, lon: f64, lat: f64) -> (f64, f64) {
        let lon = if self.kind().is_cylindrical() {
            // Pick the longitude branch closest to the grid's centre column
            let center = self.x0 + self.dx * (self.nx as f64 - 1.0) / 2.0;
            lon + 360.0 * ((center - lon) / 360.0).round()
        } else {
            lon
        };
        let (x, y) = self.projection.project(lon, lat);
        ((x - self.x0) / self.dx, (y - self.y0) / self.dy)
    }

    /// Whether a fractional grid index lies within the grid, allowing
    /// `margin` cells of slack on every side.
    pub fn contains(&self, gx: f64, gy: f64, margin: f64) -> bool {
        gx >= -margin
            && gy >= -margin
            && gx <= self.nx as f64 - 1.0 + margin
            && gy <= self.ny as f64 - 1.0 + margin
    }

    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        self.projection.project(lon, lat)
    }

    pub fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        self.projection.unproject(x, y)
    }

    pub fn kind(&self) -> ProjectionKind {
        self.projection.kind()
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// Cell spacing `(dx, dy)` in native units.
    pub fn spacing(&self) -> (f64, f64) {
        (self.dx, self.dy)
    }

    pub fn descriptor(&self) -> GridDescriptor {
        GridDescriptor {
            kind: self.kind(),
            nx: self.nx,
            ny: self.ny,
            dx: self.dx,
            dy: self.dy,
            origin_lon: self.origin_lon,
            origin_lat: self.origin_lat,
        }
    }
}

fn required(keys: &GribKeys, name: &str) -> Result<f64> {
    keys.get_f64(name)
        .ok_or_else(|| ProjectionError::MissingKey(name.to_string()))
}

fn dimension(keys: &GribKeys, aliases: &[&str], fallback: usize) -> Result<usize> {
    match keys.first_i64(aliases) {
        Some(n) if n > 0 => Ok(n as usize),
        Some(n) => Err(ProjectionError::InvalidGrid(format!(
            "{} = {}",
            aliases.join("/"),
            n
        ))),
        None if fallback > 0 => Ok(fallback),
        None => Err(ProjectionError::MissingKey(aliases.join("/"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global_half_degree() -> GridProjection {
        let keys = GribKeys::new()
            .with("Ni", 720i64)
            .with("Nj", 361i64)
            .with(LAT_FIRST, 90.0)
            .with(LON_FIRST, 0.0)
            .with(LAT_LAST, -90.0)
            .with(LON_LAST, 359.5);
        let params = ProjParams::new().with("proj", "cyl");
        GridProjection::from_keys(&keys, &params, (720, 361)).unwrap()
    }

    fn hrrr() -> GridProjection {
        let keys = GribKeys::new()
            .with("Nx", 1799i64)
            .with("Ny", 1059i64)
            .with("DxInMetres", 3000.0)
            .with("DyInMetres", 3000.0)
            .with(LAT_FIRST, 21.138123)
            .with(LON_FIRST, 237.280472);
        let params = ProjParams::new()
            .with("proj", "lcc")
            .with("lat_1", 38.5)
            .with("lat_2", 38.5)
            .with("lat_0", 38.5)
            .with("lon_0", 262.5)
            .with("a", 6371229.0)
            .with("b", 6371229.0);
        GridProjection::from_keys(&keys, &params, (1799, 1059)).unwrap()
    }

    #[test]
    fn test_cylindrical_spacing_from_first_and_last_points() {
        let grid = global_half_degree();
        assert_eq!(grid.spacing(), (0.5, -0.5));
        assert_eq!(grid.to_geographic(2.0, 2.0), (1.0, 89.0));
    }

    #[test]
    fn test_cylindrical_to_grid_wraps_to_grid_branch() {
        let grid = global_half_degree();
        let (gx, gy) = grid.to_grid(-0.5, 0.0);
        assert!((gx - 719.0).abs() < 1e-9, "gx = {}", gx);
        assert!((gy - 180.0).abs() < 1e-9, "gy = {}", gy);
    }

    #[test]
    fn test_antimeridian_grid_is_unwrapped() {
        let keys = GribKeys::new()
            .with("Nx", 41i64)
            .with("Ny", 21i64)
            .with(LAT_FIRST, -10.0)
            .with(LON_FIRST, 170.0)
            .with(LAT_LAST, 0.0)
            .with(LON_LAST, -170.0);
        let params = ProjParams::new().with("proj", "cyl");
        let grid = GridProjection::from_keys(&keys, &params, (41, 21)).unwrap();
        assert_eq!(grid.spacing(), (0.5, 0.5));
        assert_eq!(grid.to_geographic(40.0, 0.0), (190.0, -10.0));
        let (gx, _) = grid.to_grid(-175.0, -5.0);
        assert!((gx - 30.0).abs() < 1e-9);
    }

    #[test]
    fn test_origin_longitude_is_normalized() {
        let grid = hrrr();
        let desc = grid.descriptor();
        assert!((desc.origin_lon + 122.719528).abs() < 1e-9);
        assert_eq!(desc.kind, ProjectionKind::LambertConformal);
        let (lon, lat) = grid.to_geographic(0.0, 0.0);
        assert!((lon + 122.719528).abs() < 1e-6, "lon = {}", lon);
        assert!((lat - 21.138123).abs() < 1e-6, "lat = {}", lat);
    }

    #[test]
    fn test_projected_grid_roundtrip() {
        let grid = hrrr();
        let (lon, lat) = grid.to_geographic(900.5, 530.25);
        assert!(lon > -110.0 && lon < -85.0, "lon = {}", lon);
        assert!(lat > 30.0 && lat < 45.0, "lat = {}", lat);
        let (gx, gy) = grid.to_grid(lon, lat);
        assert!((gx - 900.5).abs() < 1e-6);
        assert!((gy - 530.25).abs() < 1e-6);
    }

    #[test]
    fn test_metre_spacing_aliases() {
        let keys = GribKeys::new()
            .with("Ni", 10i64)
            .with("Nj", 10i64)
            .with("DiInMetres", 2500.0)
            .with("DjInMetres", 2500.0)
            .with(LAT_FIRST, 50.0)
            .with(LON_FIRST, 0.0);
        let params = ProjParams::new()
            .with("proj", "lcc")
            .with("lat_1", 63.3)
            .with("lon_0", 15.0);
        let grid = GridProjection::from_keys(&keys, &params, (10, 10)).unwrap();
        assert_eq!(grid.spacing(), (2500.0, 2500.0));
    }

    #[test]
    fn test_missing_spacing_is_error() {
        let keys = GribKeys::new().with(LAT_FIRST, 50.0).with(LON_FIRST, 0.0);
        let params = ProjParams::new()
            .with("proj", "lcc")
            .with("lat_1", 63.3)
            .with("lon_0", 15.0);
        let err = GridProjection::from_keys(&keys, &params, (10, 10)).unwrap_err();
        assert!(matches!(err, ProjectionError::MissingKey(_)));
    }

    #[test]
    fn test_single_column_cylindrical_grid_rejected() {
        let keys = GribKeys::new()
            .with("Nx", 1i64)
            .with("Ny", 5i64)
            .with(LAT_FIRST, 0.0)
            .with(LON_FIRST, 0.0)
            .with(LAT_LAST, 4.0)
            .with(LON_LAST, 0.0);
        let params = ProjParams::new().with("proj", "cyl");
        assert!(GridProjection::from_keys(&keys, &params, (1, 5)).is_err());
    }
}
