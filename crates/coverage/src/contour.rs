//! Boundary tracing of a validity mask using marching squares.
//!
//! Mask cells are treated as grid points. Every 2x2 block of points is a
//! square whose corners are classified as valid (1) or invalid (0); the
//! boundary at the 0.5 threshold crosses the square's edges at their
//! midpoints. Segments are emitted with the valid region on their left, so
//! closed rings around valid regions come out counter-clockwise (positive
//! signed area) and rings around enclosed invalid regions clockwise.
//!
//! Saddle squares (diagonal corners valid) keep the two valid corners
//! apart.

use std::collections::BTreeMap;

use geo::{Area, Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use tracing::warn;

use crate::mask::ValidityMask;

#[derive(Debug, Clone, Copy)]
enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

use Edge::*;

/// Doubled integer coordinates of an edge midpoint, exact and hashable.
type Key = (i64, i64);

fn edge_key(x: usize, y: usize, edge: Edge) -> Key {
    let (x, y) = (2 * x as i64, 2 * y as i64);
    match edge {
        Top => (x + 1, y),
        Right => (x + 2, y + 1),
        Bottom => (x + 1, y + 2),
        Left => (x, y + 1),
    }
}

/// Directed boundary segments for a square case.
///
/// The case index is `tl << 3 | tr << 2 | br << 1 | bl`.
fn cell_segments(case: u8) -> &'static [(Edge, Edge)] {
    match case {
        1 => &[(Left, Bottom)],
        2 => &[(Bottom, Right)],
        3 => &[(Left, Right)],
        4 => &[(Right, Top)],
        5 => &[(Left, Bottom), (Right, Top)],
        6 => &[(Bottom, Top)],
        7 => &[(Left, Top)],
        8 => &[(Top, Left)],
        9 => &[(Top, Bottom)],
        10 => &[(Top, Left), (Bottom, Right)],
        11 => &[(Top, Right)],
        12 => &[(Right, Left)],
        13 => &[(Right, Bottom)],
        14 => &[(Bottom, Left)],
        _ => &[],
    }
}

/// Trace all closed boundary rings of `mask`, in grid index coordinates.
///
/// The mask is padded with an invalid border first so rings close even when
/// valid cells touch the grid edge. Ring order and starting vertices are
/// deterministic.
pub fn trace_rings(mask: &ValidityMask) -> Vec<LineString<f64>> {
    let padded = mask.padded();
    let (w, h) = (padded.width(), padded.height());

    let mut segments: BTreeMap<Key, Key> = BTreeMap::new();
    for y in 0..h - 1 {
        for x in 0..w - 1 {
            let (xi, yi) = (x as isize, y as isize);
            let case = (padded.get(xi, yi) as u8) << 3
                | (padded.get(xi + 1, yi) as u8) << 2
                | (padded.get(xi + 1, yi + 1) as u8) << 1
                | padded.get(xi, yi + 1) as u8;
            for &(from, to) in cell_segments(case) {
                segments.insert(edge_key(x, y, from), edge_key(x, y, to));
            }
        }
    }

    let mut rings = Vec::new();
    while let Some((start, mut next)) = segments.pop_first() {
        let mut keys = vec![start];
        let closed = loop {
            if next == start {
                break true;
            }
            keys.push(next);
            match segments.remove(&next) {
                Some(after) => next = after,
                None => break false,
            }
        };
        if !closed {
            warn!(vertices = keys.len(), "Dropping open contour");
            continue;
        }
        rings.push(to_ring(&drop_collinear(&keys)));
    }
    rings
}

/// Remove vertices lying on a straight line between their neighbours.
fn drop_collinear(keys: &[Key]) -> Vec<Key> {
    let n = keys.len();
    if n < 4 {
        return keys.to_vec();
    }
    (0..n)
        .filter(|&i| {
            let a = keys[(i + n - 1) % n];
            let b = keys[i];
            let c = keys[(i + 1) % n];
            (b.0 - a.0) * (c.1 - b.1) - (b.1 - a.1) * (c.0 - b.0) != 0
        })
        .map(|i| keys[i])
        .collect()
}

/// Closed ring in unpadded grid index coordinates.
fn to_ring(keys: &[Key]) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = keys
        .iter()
        .map(|&(x, y)| Coord {
            x: x as f64 / 2.0 - 1.0,
            y: y as f64 / 2.0 - 1.0,
        })
        .collect();
    if let Some(&first) = coords.first() {
        coords.push(first);
    }
    LineString::new(coords)
}

/// Assemble traced rings into polygons.
///
/// Counter-clockwise rings become exteriors. Clockwise rings (enclosed
/// invalid regions) are attached as interiors of the smallest exterior that
/// contains them when `keep_holes` is set, and dropped otherwise.
pub fn assemble_polygons(rings: Vec<LineString<f64>>, keep_holes: bool) -> MultiPolygon<f64> {
    let mut exteriors: Vec<(Polygon<f64>, f64, Vec<LineString<f64>>)> = Vec::new();
    let mut holes = Vec::new();

    for ring in rings {
        let signed = Polygon::new(ring.clone(), vec![]).signed_area();
        if signed > 0.0 {
            exteriors.push((Polygon::new(ring, vec![]), signed, Vec::new()));
        } else if signed < 0.0 {
            holes.push(ring);
        }
    }

    if keep_holes {
        for hole in holes {
            let Some(&seed) = hole.0.first() else {
                continue;
            };
            let seed = Point::from(seed);
            let owner = exteriors
                .iter_mut()
                .filter(|(shell, _, _)| shell.contains(&seed))
                .min_by(|a, b| a.1.total_cmp(&b.1));
            match owner {
                Some((_, _, interiors)) => interiors.push(hole),
                None => warn!("Dropping hole outside every exterior ring"),
            }
        }
    }

    MultiPolygon::new(
        exteriors
            .into_iter()
            .map(|(shell, _, interiors)| {
                let (exterior, _) = shell.into_inner();
                Polygon::new(exterior, interiors)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::BoundingRect;

    fn block(width: usize, height: usize, lo: usize, hi: usize) -> ValidityMask {
        ValidityMask::from_fn(width, height, |i, j| {
            (lo..=hi).contains(&i) && (lo..=hi).contains(&j)
        })
    }

    #[test]
    fn test_single_cell_is_diamond() {
        let rings = trace_rings(&block(3, 3, 1, 1));
        assert_eq!(rings.len(), 1);
        let poly = Polygon::new(rings[0].clone(), vec![]);
        assert!((poly.signed_area() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_three_by_three_block() {
        let rings = trace_rings(&block(10, 10, 1, 3));
        assert_eq!(rings.len(), 1);
        let poly = Polygon::new(rings[0].clone(), vec![]);
        let rect = poly.bounding_rect().unwrap();
        assert_eq!((rect.min().x, rect.min().y), (0.5, 0.5));
        assert_eq!((rect.max().x, rect.max().y), (3.5, 3.5));
        assert!((poly.signed_area() - 8.5).abs() < 1e-12);
        // four straight sides and four corner cuts
        assert_eq!(rings[0].0.len(), 9);
    }

    #[test]
    fn test_empty_mask_has_no_rings() {
        let mask = ValidityMask::from_fn(4, 4, |_, _| false);
        assert!(trace_rings(&mask).is_empty());
    }

    #[test]
    fn test_diagonal_cells_stay_separate() {
        let mask = ValidityMask::from_fn(2, 2, |i, j| i == j);
        assert_eq!(trace_rings(&mask).len(), 2);
    }

    #[test]
    fn test_hole_ring_is_clockwise() {
        let mask = ValidityMask::from_fn(5, 5, |i, j| !(i == 2 && j == 2));
        let rings = trace_rings(&mask);
        assert_eq!(rings.len(), 2);
        let areas: Vec<f64> = rings
            .iter()
            .map(|r| Polygon::new(r.clone(), vec![]).signed_area())
            .collect();
        assert!(areas.iter().any(|&a| a > 0.0));
        assert!(areas.iter().any(|&a| a < 0.0));
    }

    #[test]
    fn test_assemble_keeps_or_drops_holes() {
        let mask = ValidityMask::from_fn(5, 5, |i, j| !(i == 2 && j == 2));

        let with_holes = assemble_polygons(trace_rings(&mask), true);
        assert_eq!(with_holes.0.len(), 1);
        assert_eq!(with_holes.0[0].interiors().len(), 1);

        let without = assemble_polygons(trace_rings(&mask), false);
        assert_eq!(without.0.len(), 1);
        assert!(without.0[0].interiors().is_empty());
    }
}
