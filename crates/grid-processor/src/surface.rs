//! Interpolable surfaces built from decoded layers.

use grib_common::{epoch_seconds, DecodedLayer};
use projection::GridProjection;

use crate::error::{GridProcessorError, Result};
use crate::interpolation::cubic_interpolate;

/// A decoded layer with a cubic interpolant over its native grid mesh.
///
/// Values outside the layer's valid range are stored as NaN.
#[derive(Debug, Clone)]
pub struct Surface {
    grid: GridProjection,
    values: Vec<f64>,
    nx: usize,
    ny: usize,
    /// Valid time, Unix-epoch seconds
    valid_time: i64,
}

impl Surface {
    pub fn from_layer(layer: &DecodedLayer) -> Result<Self> {
        layer.check_shape()?;
        let grid = GridProjection::from_layer(layer)?;
        let values = layer
            .values
            .iter()
            .map(|&v| if layer.is_valid(v) { v } else { f64::NAN })
            .collect();
        Self::from_grid(grid, values, epoch_seconds(&layer.valid_time))
    }

    /// Surface over `grid` with row-major `values`.
    pub fn from_grid(grid: GridProjection, values: Vec<f64>, valid_time: i64) -> Result<Self> {
        let (nx, ny) = grid.dimensions();
        if values.len() != nx * ny {
            return Err(GridProcessorError::Index(
                grib_common::GribIndexError::MalformedLayer(format!(
                    "{} values for a {}x{} grid",
                    values.len(),
                    nx,
                    ny
                )),
            ));
        }
        Ok(Self {
            grid,
            values,
            nx,
            ny,
            valid_time,
        })
    }

    pub fn grid(&self) -> &GridProjection {
        &self.grid
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn valid_time(&self) -> i64 {
        self.valid_time
    }

    /// Value at fractional grid index `(gx, gy)`.
    ///
    /// Points up to half a cell outside the grid are clamped onto its edge;
    /// anything further out, or a missing value, gives `None`.
    pub fn value_at_index(&self, gx: f64, gy: f64) -> Option<f64> {
        if !self.grid.contains(gx, gy, 0.5) {
            return None;
        }
        let gx = gx.clamp(0.0, (self.nx - 1) as f64);
        let gy = gy.clamp(0.0, (self.ny - 1) as f64);
        let value = cubic_interpolate(&self.values, self.nx, self.ny, gx, gy);
        value.is_finite().then_some(value)
    }

    /// Value at a longitude/latitude.
    pub fn value_at(&self, lon: f64, lat: f64) -> Option<f64> {
        let (gx, gy) = self.grid.to_grid(lon, lat);
        self.value_at_index(gx, gy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use grib_common::{GribKeys, ProjParams};

    /// 5x4 one-degree grid at (10, 50) holding `lon + 10 * lat`.
    fn layer() -> DecodedLayer {
        let (nx, ny) = (5, 4);
        let mut values = Vec::with_capacity(nx * ny);
        for j in 0..ny {
            for i in 0..nx {
                values.push((10 + i) as f64 + 10.0 * (50 + j) as f64);
            }
        }
        let keys = GribKeys::new()
            .with("Ni", nx as i64)
            .with("Nj", ny as i64)
            .with("longitudeOfFirstGridPointInDegrees", 10.0)
            .with("latitudeOfFirstGridPointInDegrees", 50.0)
            .with("longitudeOfLastGridPointInDegrees", 14.0)
            .with("latitudeOfLastGridPointInDegrees", 53.0);
        DecodedLayer::new(values, nx, ny)
            .with_keys(keys)
            .with_projparams(ProjParams::new().with("proj", "cyl"))
            .with_times(
                Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap(),
            )
    }

    #[test]
    fn test_value_at_grid_point() {
        let surface = Surface::from_layer(&layer()).unwrap();
        let v = surface.value_at(12.0, 51.0).unwrap();
        assert!((v - 522.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_between_points() {
        let surface = Surface::from_layer(&layer()).unwrap();
        let v = surface.value_at(11.5, 51.25).unwrap();
        assert!((v - 524.0).abs() < 1e-9, "got {}", v);
    }

    #[test]
    fn test_outside_grid_is_none() {
        let surface = Surface::from_layer(&layer()).unwrap();
        assert!(surface.value_at(14.4, 52.0).is_some());
        assert!(surface.value_at(15.0, 52.0).is_none());
        assert!(surface.value_at(-100.0, 0.0).is_none());
    }

    #[test]
    fn test_valid_time_is_epoch_seconds() {
        let surface = Surface::from_layer(&layer()).unwrap();
        assert_eq!(surface.valid_time(), 1_704_088_800);
    }

    #[test]
    fn test_out_of_range_values_are_missing() {
        let layer = layer().with_valid_range(0.0, 540.0);
        let surface = Surface::from_layer(&layer).unwrap();
        // Node (0, 0) = 510 is valid, node (4, 3) = 544 is not
        assert!(surface.value_at_index(0.0, 0.0).is_some());
        assert!(surface.value_at_index(4.0, 3.0).is_none());
    }

    #[test]
    fn test_mismatched_values_rejected() {
        let grid = GridProjection::from_layer(&layer()).unwrap();
        assert!(Surface::from_grid(grid, vec![0.0; 3], 0).is_err());
    }
}
