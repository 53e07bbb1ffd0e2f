//! Canonical encodings of coverage geometry and its content hash.

use std::fmt::Write as _;

use bytes::{BufMut, Bytes, BytesMut};
use geo::{LineString, MultiPolygon, Polygon};
use grib_common::GridId;
use sha2::{Digest, Sha256};

const WKB_LITTLE_ENDIAN: u8 = 1;
const WKB_POLYGON: u32 = 3;
const WKB_MULTIPOLYGON: u32 = 6;

/// Little-endian well-known binary of a multipolygon.
///
/// Rings are written in stored order and vertex order, so two geometries
/// encode identically exactly when their coordinates and ring order match.
pub fn to_wkb(geometry: &MultiPolygon<f64>) -> Bytes {
    let mut buf = BytesMut::with_capacity(9 + wkb_body_len(geometry));
    buf.put_u8(WKB_LITTLE_ENDIAN);
    buf.put_u32_le(WKB_MULTIPOLYGON);
    buf.put_u32_le(geometry.0.len() as u32);
    for polygon in geometry {
        put_polygon(&mut buf, polygon);
    }
    buf.freeze()
}

fn wkb_body_len(geometry: &MultiPolygon<f64>) -> usize {
    geometry
        .iter()
        .map(|p| 9 + rings(p).map(|r| 4 + 16 * r.0.len()).sum::<usize>())
        .sum()
}

fn rings(polygon: &Polygon<f64>) -> impl Iterator<Item = &LineString<f64>> {
    std::iter::once(polygon.exterior()).chain(polygon.interiors())
}

fn put_polygon(buf: &mut BytesMut, polygon: &Polygon<f64>) {
    buf.put_u8(WKB_LITTLE_ENDIAN);
    buf.put_u32_le(WKB_POLYGON);
    buf.put_u32_le(1 + polygon.interiors().len() as u32);
    for ring in rings(polygon) {
        buf.put_u32_le(ring.0.len() as u32);
        for c in &ring.0 {
            buf.put_f64_le(c.x);
            buf.put_f64_le(c.y);
        }
    }
}

/// Well-known text of a multipolygon.
pub fn to_wkt(geometry: &MultiPolygon<f64>) -> String {
    if geometry.0.is_empty() {
        return "MULTIPOLYGON EMPTY".to_string();
    }
    let mut out = String::from("MULTIPOLYGON (");
    for (i, polygon) in geometry.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push('(');
        for (k, ring) in rings(polygon).enumerate() {
            if k > 0 {
                out.push_str(", ");
            }
            out.push('(');
            for (n, c) in ring.0.iter().enumerate() {
                if n > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{} {}", c.x, c.y);
            }
            out.push(')');
        }
        out.push(')');
    }
    out.push(')');
    out
}

/// Content hash of a coverage geometry: hex SHA-256 of its WKB.
pub fn polygon_id(geometry: &MultiPolygon<f64>) -> GridId {
    GridId::new(hex::encode(Sha256::digest(to_wkb(geometry))))
}
