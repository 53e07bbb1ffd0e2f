//! Plate carrée: native coordinates are longitude/latitude degrees.

use crate::MapProjection;

/// Identity projection for regular latitude/longitude grids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Geographic;

impl MapProjection for Geographic {
    fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        (lon, lat)
    }

    fn unproject(&self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }
}
