//! Coordinate reference system transformations.
//!
//! Implements the map projections used by GRIB grid templates from scratch,
//! plus the grid-index layer on top of them:
//!
//! - [`GridProjection`] maps grid indices to longitude/latitude and back
//! - [`NativeProjection`] is the projection named by a layer's proj parameters

pub mod error;
pub mod geographic;
pub mod grid;
pub mod lambert;
pub mod mercator;
pub mod native;
pub mod polar;

pub use error::{ProjectionError, Result};
pub use geographic::Geographic;
pub use grid::{GridDescriptor, GridProjection};
pub use lambert::LambertConformal;
pub use mercator::Mercator;
pub use native::{MapProjection, NativeProjection, ProjectionKind, DEFAULT_EARTH_RADIUS};
pub use polar::PolarStereographic;

/// Normalize a longitude in degrees to (-180, 180].
pub fn normalize_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}
