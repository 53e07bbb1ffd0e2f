//! Magnitude and azimuth fields from orthogonal vector components.
//!
//! Components are taken along the grid's own x/y axes, so the azimuth is
//! found by stepping along the vector in projected units and measuring the
//! geodesic bearing to the endpoint. This accounts for grid rotation and
//! shear instead of assuming U points east and V points north.

use std::fmt;

use geo::{Bearing, Geodesic, Point};
use grib_common::{DecodedLayer, MeasurementKey};
use projection::GridProjection;
use serde::{Deserialize, Serialize};

use crate::error::{GridProcessorError, Result};

const U_PREFIX: &str = "U component of ";
const V_PREFIX: &str = "V component of ";

/// A quantity derived from a U/V pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VectorComponent {
    Magnitude,
    Azimuth,
}

impl VectorComponent {
    pub const ALL: [VectorComponent; 2] = [VectorComponent::Magnitude, VectorComponent::Azimuth];

    /// Parameter name of this component of quantity `quantity` (e.g. "wind").
    pub fn parameter_name(&self, quantity: &str) -> String {
        format!("{} component of {}", self, quantity)
    }
}

impl fmt::Display for VectorComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorComponent::Magnitude => write!(f, "Magnitude"),
            VectorComponent::Azimuth => write!(f, "Azimuth"),
        }
    }
}

/// The quantity named by a U component parameter: "U component of wind" -> "wind".
pub fn vector_quantity(name: &str) -> Option<&str> {
    name.strip_prefix(U_PREFIX)
}

/// Measurement of the V sibling of a U component measurement.
pub fn v_sibling(u: &MeasurementKey) -> Option<MeasurementKey> {
    vector_quantity(&u.name).map(|q| u.renamed(format!("{}{}", V_PREFIX, q)))
}

/// A derived measurement backed by a U/V pair.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorSibling<T> {
    /// Measurement of the derived quantity
    pub measurement: MeasurementKey,
    pub component: VectorComponent,
    pub u: T,
    pub v: T,
}

/// Derived magnitude/azimuth measurements for every U component in
/// `items` whose V sibling (same unit, level type and level) is also
/// present.
///
/// This is the only place that knows the "U/V component of X" naming
/// convention.
pub fn resolve_vector_siblings<'a, T, I>(items: I) -> Vec<VectorSibling<T>>
where
    T: Clone + 'a,
    I: IntoIterator<Item = (&'a MeasurementKey, &'a T)> + Clone,
{
    let mut siblings = Vec::new();
    for (u_key, u) in items.clone() {
        let Some(quantity) = vector_quantity(&u_key.name) else {
            continue;
        };
        let Some(v_key) = v_sibling(u_key) else {
            continue;
        };
        let Some((_, v)) = items.clone().into_iter().find(|(k, _)| **k == v_key) else {
            continue;
        };
        for component in VectorComponent::ALL {
            siblings.push(VectorSibling {
                measurement: u_key.renamed(component.parameter_name(quantity)),
                component,
                u: u.clone(),
                v: v.clone(),
            });
        }
    }
    siblings
}

/// Cellwise magnitude and azimuth of a vector field.
#[derive(Debug, Clone)]
pub struct VectorField {
    pub nx: usize,
    pub ny: usize,
    /// `sqrt(U² + V²)`, in the component units
    pub magnitude: Vec<f64>,
    /// Degrees clockwise from true north in [0, 360), see [`bearing`]
    pub azimuth: Vec<f64>,
}

/// Derives magnitude/azimuth fields from U/V component layers.
///
/// Azimuths are geodesic bearings on the WGS84 ellipsoid.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorFieldSynthesizer;

impl VectorFieldSynthesizer {
    pub fn new() -> Self {
        Self
    }

    /// Synthesize over the grid of the U layer.
    ///
    /// Cells where either component is outside its valid range are NaN in
    /// both outputs.
    pub fn synthesize(&self, u: &DecodedLayer, v: &DecodedLayer) -> Result<VectorField> {
        u.check_shape()?;
        v.check_shape()?;
        if (u.nx, u.ny) != (v.nx, v.ny) {
            return Err(GridProcessorError::VectorMismatch(format!(
                "U is {}x{}, V is {}x{}",
                u.nx, u.ny, v.nx, v.ny
            )));
        }
        let grid = GridProjection::from_layer(u)?;
        let mask = |layer: &DecodedLayer| -> Vec<f64> {
            layer
                .values
                .iter()
                .map(|&x| if layer.is_valid(x) { x } else { f64::NAN })
                .collect()
        };
        self.synthesize_on(&grid, &mask(u), &mask(v))
    }

    /// Synthesize from raw row-major component values on `grid`.
    pub fn synthesize_on(&self, grid: &GridProjection, u: &[f64], v: &[f64]) -> Result<VectorField> {
        let (nx, ny) = grid.dimensions();
        if u.len() != nx * ny || v.len() != nx * ny {
            return Err(GridProcessorError::VectorMismatch(format!(
                "{} U and {} V values for a {}x{} grid",
                u.len(),
                v.len(),
                nx,
                ny
            )));
        }
        let (dx, dy) = grid.spacing();
        let (dx, dy) = (dx.abs(), dy.abs());

        let mut magnitude = Vec::with_capacity(nx * ny);
        let mut azimuth = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                let k = j * nx + i;
                let (uu, vv) = (u[k], v[k]);
                if !uu.is_finite() || !vv.is_finite() {
                    magnitude.push(f64::NAN);
                    azimuth.push(f64::NAN);
                    continue;
                }
                let speed = uu.hypot(vv);
                magnitude.push(speed);
                if speed == 0.0 {
                    azimuth.push(0.0);
                    continue;
                }

                let (lon1, lat1) = grid.to_geographic(i as f64, j as f64);
                let (x1, y1) = grid.project(lon1, lat1);
                // Step at most one cell so endpoints stay on the grid near the poles
                let step = 1.0 / speed.max(1.0);
                let (x2, y2) = (x1 + uu * dx * step, y1 + vv * dy * step);
                let (lon2, lat2) = grid.unproject(x2, y2);
                azimuth.push(bearing(lon1, lat1, lon2, lat2));
            }
        }

        Ok(VectorField {
            nx,
            ny,
            magnitude,
            azimuth,
        })
    }
}

/// Geodesic forward azimuth from the first point to the second, degrees in
/// [0, 360) clockwise from true north.
///
/// The range is continuous through north-west headings but wraps at north,
/// so linear interpolation in time between azimuths on either side of 0
/// passes through south.
pub fn bearing(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let deg = Geodesic.bearing(Point::new(lon1, lat1), Point::new(lon2, lat2));
    if deg >= 360.0 {
        0.0
    } else {
        deg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grib_common::{GribKeys, ProjParams};

    fn equator_grid() -> GridProjection {
        let keys = GribKeys::new()
            .with("Ni", 3i64)
            .with("Nj", 3i64)
            .with("longitudeOfFirstGridPointInDegrees", 0.0)
            .with("latitudeOfFirstGridPointInDegrees", -1.0)
            .with("longitudeOfLastGridPointInDegrees", 2.0)
            .with("latitudeOfLastGridPointInDegrees", 1.0);
        GridProjection::from_keys(&keys, &ProjParams::new().with("proj", "cyl"), (3, 3)).unwrap()
    }

    fn uniform(u: f64, v: f64) -> VectorField {
        VectorFieldSynthesizer::default()
            .synthesize_on(&equator_grid(), &[u; 9], &[v; 9])
            .unwrap()
    }

    #[test]
    fn test_magnitude() {
        let field = uniform(3.0, 4.0);
        assert!(field.magnitude.iter().all(|m| (m - 5.0).abs() < 1e-12));
    }

    #[test]
    fn test_cardinal_azimuths_at_equator() {
        // Centre cell sits on the equator
        assert!(uniform(0.0, 10.0).azimuth[4].abs() < 1e-6);
        assert!((uniform(10.0, 0.0).azimuth[4] - 90.0).abs() < 1e-6);
        assert!((uniform(0.0, -10.0).azimuth[4] - 180.0).abs() < 1e-6);
        assert!((uniform(-10.0, 0.0).azimuth[4] - 270.0).abs() < 1e-6);
    }

    #[test]
    fn test_southward_scanning_grid_keeps_north_up() {
        let keys = GribKeys::new()
            .with("Ni", 3i64)
            .with("Nj", 3i64)
            .with("longitudeOfFirstGridPointInDegrees", 0.0)
            .with("latitudeOfFirstGridPointInDegrees", 1.0)
            .with("longitudeOfLastGridPointInDegrees", 2.0)
            .with("latitudeOfLastGridPointInDegrees", -1.0);
        let grid =
            GridProjection::from_keys(&keys, &ProjParams::new().with("proj", "cyl"), (3, 3)).unwrap();
        let field = VectorFieldSynthesizer::default()
            .synthesize_on(&grid, &[0.0; 9], &[5.0; 9])
            .unwrap();
        assert!(field.azimuth[4].abs() < 1e-6, "got {}", field.azimuth[4]);
    }

    #[test]
    fn test_bearing_range() {
        assert!((bearing(10.0, 0.0, 9.0, 0.0) - 270.0).abs() < 1e-9);
        assert!(bearing(10.0, 45.0, 10.0, 46.0).abs() < 1e-9);
        let north_west = bearing(10.0, 45.0, 9.999, 46.0);
        assert!(north_west > 359.0 && north_west < 360.0, "got {}", north_west);
    }

    #[test]
    fn test_calm_cell_has_zero_azimuth() {
        let field = uniform(0.0, 0.0);
        assert_eq!(field.magnitude[0], 0.0);
        assert_eq!(field.azimuth[0], 0.0);
    }

    #[test]
    fn test_missing_component_is_nan() {
        let mut u = [1.0; 9];
        u[2] = f64::NAN;
        let field = VectorFieldSynthesizer::default()
            .synthesize_on(&equator_grid(), &u, &[1.0; 9])
            .unwrap();
        assert!(field.magnitude[2].is_nan());
        assert!(field.azimuth[2].is_nan());
        assert!((field.magnitude[0] - 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let err = VectorFieldSynthesizer::default()
            .synthesize_on(&equator_grid(), &[1.0; 9], &[1.0; 4])
            .unwrap_err();
        assert!(matches!(err, GridProcessorError::VectorMismatch(_)));
    }

    #[test]
    fn test_vector_quantity() {
        assert_eq!(vector_quantity("U component of wind"), Some("wind"));
        assert_eq!(vector_quantity("V component of wind"), None);
        assert_eq!(vector_quantity("Temperature"), None);
        assert_eq!(
            VectorComponent::Azimuth.parameter_name("wind"),
            "Azimuth component of wind"
        );
    }

    #[test]
    fn test_resolve_vector_siblings() {
        let u = MeasurementKey::new("U component of wind", "m s**-1", "heightAboveGround", 10.0);
        let v = MeasurementKey::new("V component of wind", "m s**-1", "heightAboveGround", 10.0);
        let v_other_level = MeasurementKey::new("V component of wind", "m s**-1", "heightAboveGround", 100.0);
        let t = MeasurementKey::new("Temperature", "K", "heightAboveGround", 2.0);
        let items = vec![(u, "u"), (v, "v"), (v_other_level, "v100"), (t, "t")];

        let siblings = resolve_vector_siblings(items.iter().map(|(k, x)| (k, x)));
        assert_eq!(siblings.len(), 2);
        assert_eq!(siblings[0].measurement.name, "Magnitude component of wind");
        assert_eq!(siblings[1].measurement.name, "Azimuth component of wind");
        assert_eq!(siblings[1].measurement.level, 10.0);
        assert_eq!((siblings[0].u, siblings[0].v), ("u", "v"));
    }

    #[test]
    fn test_unpaired_u_is_ignored() {
        let u = MeasurementKey::new("U component of wind", "m s**-1", "heightAboveGround", 10.0);
        let items = vec![(u, 1)];
        assert!(resolve_vector_siblings(items.iter().map(|(k, x)| (k, x))).is_empty());
    }
}
