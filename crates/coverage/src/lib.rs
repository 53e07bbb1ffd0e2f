//! Valid-data coverage polygons for GRIB layers.
//!
//! The pipeline turns a decoded layer into a geographic footprint:
//!
//! 1. validity mask (value within the layer's valid range), optionally with
//!    enclosed holes filled
//! 2. marching-squares boundary rings in grid index space
//! 3. mapping through the layer's [`projection::GridProjection`]
//! 4. splitting at the antimeridian and unwrapping into (-180, 180]
//! 5. optional buffering and simplification
//!
//! The result is identified by [`polygon_id`], a hash of its WKB encoding,
//! so layers sharing a footprint share one stored polygon.

pub mod buffer;
pub mod contour;
pub mod dateline;
pub mod encoding;
pub mod extract;
pub mod mask;

pub use buffer::buffer;
pub use encoding::{polygon_id, to_wkb, to_wkt};
pub use extract::{CoveragePolygon, ExtractOptions, GridShapeExtractor};
pub use mask::ValidityMask;
