//! Coverage polygon extraction for decoded layers.

use bytes::Bytes;
use geo::{Area, Contains, Coord, CoordsIter, MapCoords, MultiPolygon, Point, Polygon, Simplify};
use grib_common::{DecodedLayer, GribIndexError, GribResult, GridId};
use projection::GridProjection;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::buffer::buffer;
use crate::contour::{assemble_polygons, trace_rings};
use crate::dateline::{clip_to_world, split_dateline, unwrap_dateline};
use crate::encoding::{polygon_id, to_wkb, to_wkt};
use crate::mask::ValidityMask;

/// Tuning of the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Treat invalid regions enclosed by valid data as valid
    pub fill_holes: bool,
    /// Douglas-Peucker tolerance in degrees, `None` to keep every vertex
    pub simplify_tolerance: Option<f64>,
    /// Planar buffer distance in degrees, `None` to skip buffering
    pub buffer_distance: Option<f64>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            fill_holes: true,
            simplify_tolerance: Some(0.01),
            buffer_distance: Some(0.3),
        }
    }
}

impl ExtractOptions {
    /// Outline only: holes filled, no buffering or simplification.
    pub fn exact() -> Self {
        Self {
            fill_holes: true,
            simplify_tolerance: None,
            buffer_distance: None,
        }
    }

    pub fn with_fill_holes(mut self, fill_holes: bool) -> Self {
        self.fill_holes = fill_holes;
        self
    }

    pub fn with_simplify_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.simplify_tolerance = tolerance;
        self
    }

    pub fn with_buffer_distance(mut self, distance: Option<f64>) -> Self {
        self.buffer_distance = distance;
        self
    }
}

/// Geographic footprint of a layer's valid data.
///
/// Longitudes lie within [-180, 180] and no part spans the antimeridian.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoveragePolygon {
    pub gridid: GridId,
    pub geometry: MultiPolygon<f64>,
}

impl CoveragePolygon {
    pub fn from_geometry(geometry: MultiPolygon<f64>) -> Self {
        Self {
            gridid: polygon_id(&geometry),
            geometry,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.geometry.0.is_empty()
    }

    /// Whether the point (lon, lat) lies inside the coverage.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.geometry.contains(&Point::new(lon, lat))
    }

    /// Area in square degrees.
    pub fn area(&self) -> f64 {
        self.geometry.unsigned_area()
    }

    pub fn wkb(&self) -> Bytes {
        to_wkb(&self.geometry)
    }

    pub fn wkt(&self) -> String {
        to_wkt(&self.geometry)
    }
}

/// Builds coverage polygons of grid layers.
#[derive(Debug, Clone, Default)]
pub struct GridShapeExtractor {
    options: ExtractOptions,
}

impl GridShapeExtractor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract the coverage polygon of a decoded layer.
    ///
    /// An all-invalid layer yields an empty polygon; that is not an error.
    #[instrument(skip(self, layer), fields(nx = layer.nx, ny = layer.ny))]
    pub fn extract(&self, layer: &DecodedLayer) -> GribResult<CoveragePolygon> {
        layer.check_shape()?;
        let grid = GridProjection::from_layer(layer)?;
        self.extract_mask(ValidityMask::from_layer(layer), &grid)
    }

    /// Extract the coverage of an explicit validity mask over `grid`.
    pub fn extract_mask(
        &self,
        mask: ValidityMask,
        grid: &GridProjection,
    ) -> GribResult<CoveragePolygon> {
        let native = self.trace(mask);

        let geographic = native.map_coords(|c| {
            let (lon, lat) = grid.to_geographic(c.x, c.y);
            Coord { x: lon, y: lat }
        });
        if geographic.coords_iter().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
            return Err(GribIndexError::Geometry(
                "grid outline does not map to finite coordinates".to_string(),
            ));
        }

        let pieces: Vec<Polygon<f64>> = split_dateline(&geographic)
            .into_iter()
            .map(unwrap_dateline)
            .collect();
        let split_count = pieces.len();
        let mut geometry = MultiPolygon::new(pieces);

        if let Some(distance) = self.options.buffer_distance {
            geometry = buffer(&geometry, distance);
        }
        if let Some(tolerance) = self.options.simplify_tolerance {
            geometry = geometry.simplify(&tolerance);
        }
        let geometry = discard_degenerate(clip_to_world(geometry));

        debug!(
            pieces = split_count,
            polygons = geometry.0.len(),
            vertices = geometry.coords_count(),
            "Extracted coverage"
        );
        Ok(CoveragePolygon::from_geometry(geometry))
    }

    /// Outline of the valid cells in grid index coordinates, before any
    /// projection.
    pub fn trace(&self, mut mask: ValidityMask) -> MultiPolygon<f64> {
        if self.options.fill_holes {
            mask.fill_holes();
        }
        assemble_polygons(trace_rings(&mask), !self.options.fill_holes)
    }
}

/// Drop rings that collapsed to fewer than four vertices or zero area.
fn discard_degenerate(geometry: MultiPolygon<f64>) -> MultiPolygon<f64> {
    geometry
        .into_iter()
        .filter(|p| p.exterior().0.len() >= 4 && p.unsigned_area() > 0.0)
        .map(|p| {
            let (exterior, interiors) = p.into_inner();
            let interiors = interiors.into_iter().filter(|r| r.0.len() >= 4).collect();
            Polygon::new(exterior, interiors)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = ExtractOptions::default();
        assert!(options.fill_holes);
        assert_eq!(options.simplify_tolerance, Some(0.01));
        assert_eq!(options.buffer_distance, Some(0.3));
    }

    #[test]
    fn test_trace_interior_block() {
        let extractor = GridShapeExtractor::new(ExtractOptions::exact());
        let mask = ValidityMask::from_fn(10, 10, |i, j| (1..=3).contains(&i) && (1..=3).contains(&j));
        let outline = extractor.trace(mask);
        assert_eq!(outline.0.len(), 1);
        assert!((outline.unsigned_area() - 8.5).abs() < 1e-12);
    }

    #[test]
    fn test_trace_keeps_holes_when_not_filling() {
        let extractor = GridShapeExtractor::new(ExtractOptions::exact().with_fill_holes(false));
        let mask = ValidityMask::from_fn(6, 6, |i, j| !(i == 2 && j == 2));
        let outline = extractor.trace(mask);
        assert_eq!(outline.0.len(), 1);
        assert_eq!(outline.0[0].interiors().len(), 1);
    }
}
