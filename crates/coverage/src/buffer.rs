//! Planar outward buffering of coverage polygons.
//!
//! The buffer is the union of the input with a rectangle swept along every
//! ring edge and a disc at every vertex.

use std::f64::consts::TAU;

use geo::orient::Direction;
use geo::{unary_union, Coord, LineString, MultiPolygon, Orient, Polygon};

/// Vertices of the regular polygon standing in for each vertex disc.
pub const DEFAULT_SEGMENTS: usize = 16;

/// Grow `geometry` outward by `distance` in coordinate units.
///
/// Non-positive or non-finite distances return the input unchanged. Holes
/// narrower than twice the distance close up.
pub fn buffer(geometry: &MultiPolygon<f64>, distance: f64) -> MultiPolygon<f64> {
    buffer_with_segments(geometry, distance, DEFAULT_SEGMENTS)
}

/// [`buffer`] with an explicit vertex disc resolution (at least 4).
pub fn buffer_with_segments(
    geometry: &MultiPolygon<f64>,
    distance: f64,
    segments: usize,
) -> MultiPolygon<f64> {
    if !(distance > 0.0 && distance.is_finite()) || geometry.0.is_empty() {
        return geometry.clone();
    }
    let segments = segments.max(4);

    // Pieces must share one winding convention for the union's fill rule
    let mut pieces: Vec<Polygon<f64>> = geometry
        .iter()
        .map(|p| p.orient(Direction::Default))
        .collect();
    for polygon in geometry {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            for line in ring.lines() {
                if let Some(strip) = edge_strip(line.start, line.end, distance) {
                    pieces.push(strip.orient(Direction::Default));
                }
            }
            // Closed rings repeat the first vertex
            let open = ring.0.len().saturating_sub(1);
            for &vertex in ring.0.iter().take(open) {
                pieces.push(disc(vertex, distance, segments).orient(Direction::Default));
            }
        }
    }
    unary_union(&pieces)
}

/// Rectangle covering everything within `distance` of the segment's
/// interior, `None` for zero-length edges.
fn edge_strip(a: Coord<f64>, b: Coord<f64>, distance: f64) -> Option<Polygon<f64>> {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len = dx.hypot(dy);
    if len == 0.0 {
        return None;
    }
    let n = Coord {
        x: -dy / len * distance,
        y: dx / len * distance,
    };
    Some(Polygon::new(
        LineString::from(vec![a + n, b + n, b - n, a - n, a + n]),
        vec![],
    ))
}

/// Regular polygon circumscribing the circle of radius `distance`.
fn disc(center: Coord<f64>, distance: f64, segments: usize) -> Polygon<f64> {
    let radius = distance / (TAU / (2 * segments) as f64).cos();
    let mut ring: Vec<Coord<f64>> = (0..segments)
        .map(|i| {
            let theta = TAU * i as f64 / segments as f64;
            Coord {
                x: center.x + radius * theta.cos(),
                y: center.y + radius * theta.sin(),
            }
        })
        .collect();
    ring.push(ring[0]);
    Polygon::new(LineString::from(ring), vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, Area, BoundingRect, Contains, Point};

    fn unit_square() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 0.0),
            (x: 1.0, y: 1.0),
            (x: 0.0, y: 1.0)
        ]])
    }

    #[test]
    fn test_buffer_grows_square_by_distance() {
        let buffered = buffer(&unit_square(), 0.5);
        assert_eq!(buffered.0.len(), 1);

        // Square + four edge strips + rounded corners
        let expected = 1.0 + 4.0 * 0.5 + std::f64::consts::PI * 0.25;
        let area = buffered.unsigned_area();
        assert!((area - expected).abs() < 0.05, "area {area}");

        let bbox = buffered.bounding_rect().unwrap();
        assert!((bbox.min().x + 0.5).abs() < 0.05);
        assert!((bbox.max().y - 1.5).abs() < 0.05);
        assert!(buffered.contains(&Point::new(-0.4, 0.5)));
        assert!(!buffered.contains(&Point::new(-0.6, 0.5)));
    }

    #[test]
    fn test_buffer_merges_nearby_polygons() {
        let mut two = unit_square();
        two.0.push(polygon![
            (x: 1.5, y: 0.0),
            (x: 2.5, y: 0.0),
            (x: 2.5, y: 1.0),
            (x: 1.5, y: 1.0)
        ]);
        assert_eq!(buffer(&two, 0.1).0.len(), 2);
        assert_eq!(buffer(&two, 0.3).0.len(), 1);
    }

    #[test]
    fn test_buffer_closes_narrow_hole() {
        let with_hole = MultiPolygon::new(vec![polygon!(
            exterior: [
                (x: 0.0, y: 0.0),
                (x: 4.0, y: 0.0),
                (x: 4.0, y: 4.0),
                (x: 0.0, y: 4.0),
            ],
            interiors: [[
                (x: 1.8, y: 1.8),
                (x: 2.2, y: 1.8),
                (x: 2.2, y: 2.2),
                (x: 1.8, y: 2.2),
            ]],
        )]);
        let buffered = buffer(&with_hole, 0.5);
        assert!(buffered.0[0].interiors().is_empty());
        assert!(buffered.contains(&Point::new(2.0, 2.0)));
    }

    #[test]
    fn test_non_positive_distance_is_identity() {
        let square = unit_square();
        assert_eq!(buffer(&square, 0.0), square);
        assert_eq!(buffer(&square, -1.0), square);
        assert_eq!(buffer(&square, f64::NAN), square);
    }
}
