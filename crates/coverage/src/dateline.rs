//! Antimeridian handling of geographic polygons.
//!
//! Polygons mapped from grid space carry unwrapped longitudes (a grid over
//! the Pacific may run from 170 to 190). They are cut at the meridians
//! -540, -180, 180 and 540, and every piece is then shifted by a multiple of
//! 360 degrees so that it lies within (-180, 180].

use geo::{
    Area, BooleanOps, BoundingRect, Coord, CoordsIter, MapCoords, MultiPolygon, Polygon, Rect,
    Translate,
};

const SPLIT_MERIDIANS: [f64; 4] = [-540.0, -180.0, 180.0, 540.0];

/// Longitude far outside any real coordinate.
const FAR: f64 = 1.0e4;

/// Boolean operations round vertices to a fixed-point grid; cut coordinates
/// within this distance of a cutting line are snapped back onto it.
const SNAP: f64 = 1.0e-6;

fn snap(v: f64, targets: &[f64]) -> f64 {
    targets
        .iter()
        .copied()
        .find(|t| (v - t).abs() < SNAP)
        .unwrap_or(v)
}

/// Part of `polygon` between two meridians.
fn clip_band(polygon: &Polygon<f64>, bbox: Rect<f64>, west: f64, east: f64) -> Vec<Polygon<f64>> {
    // Keep the clip rectangle close to the polygon so the fixed-point scale
    // of the boolean operation stays fine.
    let min = Coord {
        x: west.max(bbox.min().x - 1.0),
        y: bbox.min().y - 1.0,
    };
    let max = Coord {
        x: east.min(bbox.max().x + 1.0),
        y: bbox.max().y + 1.0,
    };
    let clipped = polygon.intersection(&Rect::new(min, max).to_polygon());
    clipped
        .into_iter()
        .map(|p| {
            p.map_coords(|c| Coord {
                x: snap(c.x, &[west, east]),
                y: c.y,
            })
        })
        .filter(|p| p.unsigned_area() > 0.0)
        .collect()
}

/// Cut every polygon at the split meridians.
///
/// Polygons lying between two adjacent split meridians are passed through
/// untouched.
pub fn split_dateline(geometry: &MultiPolygon<f64>) -> Vec<Polygon<f64>> {
    let mut edges = vec![-FAR];
    edges.extend(SPLIT_MERIDIANS);
    edges.push(FAR);

    let mut pieces = Vec::new();
    for polygon in geometry {
        let Some(bbox) = polygon.bounding_rect() else {
            continue;
        };
        let (min_lon, max_lon) = (bbox.min().x, bbox.max().x);

        let within_one_band = edges
            .windows(2)
            .any(|w| min_lon >= w[0] && max_lon <= w[1]);
        if within_one_band {
            pieces.push(polygon.clone());
            continue;
        }

        for w in edges.windows(2) {
            if max_lon <= w[0] || min_lon >= w[1] {
                continue;
            }
            pieces.extend(clip_band(polygon, bbox, w[0], w[1]));
        }
    }
    pieces
}

/// Longitude shift that brings `max_lon` into (-180, 180].
pub fn unwrap_offset(max_lon: f64) -> f64 {
    let shifted = max_lon + 180.0;
    let mut offset = -(shifted / 360.0).floor() * 360.0;
    if shifted.rem_euclid(360.0) == 0.0 {
        offset += 360.0;
    }
    offset
}

/// Translate a polygon so that its easternmost vertex lies in (-180, 180].
pub fn unwrap_dateline(polygon: Polygon<f64>) -> Polygon<f64> {
    let max_lon = polygon
        .exterior_coords_iter()
        .map(|c| c.x)
        .fold(f64::NEG_INFINITY, f64::max);
    if !max_lon.is_finite() {
        return polygon;
    }
    let offset = unwrap_offset(max_lon);
    if offset == 0.0 {
        polygon
    } else {
        polygon.translate(offset, 0.0)
    }
}

/// Clip to longitude [-180, 180] and latitude [-90, 90].
pub fn clip_to_world(geometry: MultiPolygon<f64>) -> MultiPolygon<f64> {
    let Some(bbox) = geometry.bounding_rect() else {
        return geometry;
    };
    let inside = bbox.min().x >= -180.0
        && bbox.max().x <= 180.0
        && bbox.min().y >= -90.0
        && bbox.max().y <= 90.0;
    if inside {
        return geometry;
    }
    let world = Rect::new(Coord { x: -180.0, y: -90.0 }, Coord { x: 180.0, y: 90.0 });
    geometry
        .intersection(&MultiPolygon::new(vec![world.to_polygon()]))
        .map_coords(|c| Coord {
            x: snap(c.x, &[-180.0, 180.0]).clamp(-180.0, 180.0),
            y: snap(c.y, &[-90.0, 90.0]).clamp(-90.0, 90.0),
        })
}

/// Whether any vertex lies outside longitude (-180, 180].
pub fn exceeds_longitude_range(geometry: &MultiPolygon<f64>) -> bool {
    geometry
        .coords_iter()
        .any(|c| c.x <= -180.0 - 1e-9 || c.x > 180.0 + 1e-9)
}
