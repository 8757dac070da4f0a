//! Ray casting against a triangle mesh.
//!
//! All queries share a single Moller-Trumbore ray-triangle primitive and
//! operate over the flat triangle buffer of a [`MeshGeometry`]. The two
//! public operations are the point-in-solid parity test and the
//! solid-path-length integration used for shielding estimates.

use crate::Point;
use crate::Vector;
use crate::error::{Error, Result};
use crate::geom::mesh::MeshGeometry;
use crate::geom::triangle::Triangle;

/// Inclusive tolerance on the intersection determinant and the
/// barycentric bounds.
pub const RAY_EPS: f64 = 1e-7;

/// Hits closer than this (in mm along the ray) are treated as one
/// crossing. Filters shared-edge and shared-vertex artifacts.
pub const HIT_MERGE_EPS: f64 = 1e-5;

/// Fixed probe direction for the parity test. Deliberately not
/// axis-aligned so grazing hits on axis-aligned geometry are unlikely.
const PROBE_DIR: (f64, f64, f64) = (0.5773502, 0.5773509, 0.5773497);

/// Moller-Trumbore ray-triangle intersection.
///
/// Returns the ray parameter `t` of the hit, or None. `dir` must be
/// normalized so that `t` is a distance. Intersections at or behind the
/// origin (`t <= RAY_EPS`) are ignored.
pub fn ray_triangle_intersection(origin: Point, dir: Vector, tri: &Triangle) -> Option<f64> {
    let edge1 = tri.b - tri.a;
    let edge2 = tri.c - tri.a;

    let pvec = dir.cross(&edge2);
    let det = edge1.dot(&pvec);
    if det.abs() < RAY_EPS {
        return None; // Ray parallel to the triangle plane
    }

    let inv_det = 1.0 / det;
    let tvec = origin - tri.a;
    let u = tvec.dot(&pvec) * inv_det;
    if !(-RAY_EPS..=1.0 + RAY_EPS).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(&edge1);
    let v = dir.dot(&qvec) * inv_det;
    if v < -RAY_EPS || u + v > 1.0 + RAY_EPS {
        return None;
    }

    let t = edge2.dot(&qvec) * inv_det;
    if t > RAY_EPS { Some(t) } else { None }
}

/// Collects all hit parameters of the ray against the mesh, sorted
/// ascending with near-duplicates merged.
fn collect_hits(mesh: &MeshGeometry, origin: Point, dir: Vector, max_t: f64) -> Vec<f64> {
    let mut hits: Vec<f64> = mesh
        .triangles()
        .iter()
        .filter_map(|tri| ray_triangle_intersection(origin, dir, tri))
        .filter(|&t| t <= max_t)
        .collect();
    hits.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let mut merged: Vec<f64> = Vec::with_capacity(hits.len());
    for t in hits {
        match merged.last() {
            Some(&last) if (t - last).abs() < HIT_MERGE_EPS => {}
            _ => merged.push(t),
        }
    }
    merged
}

/// Point-in-solid parity test.
///
/// Casts a probe ray along a fixed skew direction and counts boundary
/// crossings; an odd count means the point is inside.
pub fn is_point_inside(mesh: &MeshGeometry, point: Point) -> bool {
    let dir = Vector::new(PROBE_DIR.0, PROBE_DIR.1, PROBE_DIR.2)
        .normalize()
        .expect("probe direction is non-zero");
    let hits = collect_hits(mesh, point, dir, f64::INFINITY);
    hits.len() % 2 == 1
}

/// Total length of solid material the ray traverses within
/// `[0, max_distance]`, in millimeters.
///
/// Boundary crossings partition the ray into alternating solid/void
/// intervals. When the origin is inside the solid the first interval
/// starts at 0; an unmatched trailing crossing extends to the end of the
/// ray. Pass `origin_inside` when it is already known, otherwise it is
/// determined with [`is_point_inside`].
pub fn path_length_through(
    mesh: &MeshGeometry,
    origin: Point,
    dir: Vector,
    max_distance: f64,
    origin_inside: Option<bool>,
) -> Result<f64> {
    let dir = dir.normalize().ok_or(Error::ZeroLengthDirection)?;

    let hits = collect_hits(mesh, origin, dir, max_distance + RAY_EPS);
    if hits.is_empty() {
        return Ok(0.0);
    }

    let inside = origin_inside.unwrap_or_else(|| is_point_inside(mesh, origin));

    // Interval boundaries: entering/leaving alternates with each crossing.
    let mut boundaries: Vec<f64> = Vec::with_capacity(hits.len() + 1);
    if inside {
        boundaries.push(0.0);
    }
    boundaries.extend(hits);
    if boundaries.len() % 2 == 1 {
        // Unmatched trailing crossing: solid extends past the ray end
        boundaries.push(f64::INFINITY);
    }

    let mut total = 0.0;
    for pair in boundaries.chunks_exact(2) {
        let start = pair[0].clamp(0.0, max_distance);
        let end = pair[1].clamp(0.0, max_distance);
        if end > start {
            total += end - start;
        }
    }
    Ok(total)
}
