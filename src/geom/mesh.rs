//! Owned triangle soup with derived shielding-relevant metrics.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::geom::bboxes::bounding_box;
use crate::geom::point::Point;
use crate::geom::triangle::Triangle;

/// Vertices closer than 10^-6 mm per axis collapse to one index.
const VERTEX_QUANT_SCALE: f64 = 1e6;

/// A solid body as a flat, immutable triangle buffer.
///
/// Constructed once (normally by [`load_stl`](crate::io::stl::load_stl))
/// and validated immediately; all derived attributes are frozen afterwards.
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    triangles: Vec<Triangle>,
    vertex_count: usize,
    bbox_min: Point,
    bbox_max: Point,
    volume_mm3: f64,
    watertight: bool,
}

fn vertex_key(p: Point) -> (i64, i64, i64) {
    (
        (p.x * VERTEX_QUANT_SCALE).round() as i64,
        (p.y * VERTEX_QUANT_SCALE).round() as i64,
        (p.z * VERTEX_QUANT_SCALE).round() as i64,
    )
}

impl MeshGeometry {
    /// Builds the mesh and derives all metrics in a single pass.
    ///
    /// The watertight verdict holds iff every undirected edge (unordered
    /// pair of deduplicated vertex indices) is shared by exactly two
    /// triangles. Facet winding consistency is trusted, not verified, so
    /// the volume is reported as an absolute value.
    pub fn from_triangles(triangles: Vec<Triangle>) -> Result<Self> {
        if triangles.is_empty() {
            return Err(Error::InvalidFormat("no triangles".to_string()));
        }

        let mut vertex_index: HashMap<(i64, i64, i64), usize> = HashMap::new();
        let mut edge_counts: HashMap<(usize, usize), usize> = HashMap::new();
        let mut volume = 0.0;
        let mut vertices: Vec<Point> = Vec::with_capacity(triangles.len() * 3);

        let mut index_of = |p: Point, vertices: &mut Vec<Point>| -> usize {
            let key = vertex_key(p);
            if let Some(&idx) = vertex_index.get(&key) {
                return idx;
            }
            let idx = vertices.len();
            vertices.push(p);
            vertex_index.insert(key, idx);
            idx
        };

        for tri in &triangles {
            volume += tri.signed_volume();

            let i0 = index_of(tri.a, &mut vertices);
            let i1 = index_of(tri.b, &mut vertices);
            let i2 = index_of(tri.c, &mut vertices);
            for (a, b) in [(i0, i1), (i1, i2), (i2, i0)] {
                let edge = if a < b { (a, b) } else { (b, a) };
                *edge_counts.entry(edge).or_insert(0) += 1;
            }
        }

        let watertight = edge_counts.values().all(|&count| count == 2);

        let all_points: Vec<Point> = triangles
            .iter()
            .flat_map(|t| [t.a, t.b, t.c])
            .collect();
        let (bbox_min, bbox_max) = bounding_box(&all_points);

        Ok(Self {
            vertex_count: vertices.len(),
            triangles,
            bbox_min,
            bbox_max,
            volume_mm3: volume.abs(),
            watertight,
        })
    }

    /// Builds a closed axis-aligned box mesh (12 triangles, outward
    /// winding). Mainly useful for tests and quick experiments.
    pub fn from_box(dx: f64, dy: f64, dz: f64, origin: Option<(f64, f64, f64)>) -> Result<Self> {
        let (x0, y0, z0) = origin.unwrap_or((0., 0., 0.));
        let (x1, y1, z1) = (x0 + dx, y0 + dy, z0 + dz);
        let p = Point::new;
        let triangles = vec![
            // floor (z = z0)
            Triangle::new(p(x0, y0, z0), p(x1, y1, z0), p(x1, y0, z0)),
            Triangle::new(p(x0, y0, z0), p(x0, y1, z0), p(x1, y1, z0)),
            // ceiling (z = z1)
            Triangle::new(p(x0, y0, z1), p(x1, y0, z1), p(x1, y1, z1)),
            Triangle::new(p(x0, y0, z1), p(x1, y1, z1), p(x0, y1, z1)),
            // front (y = y0)
            Triangle::new(p(x0, y0, z0), p(x1, y0, z0), p(x1, y0, z1)),
            Triangle::new(p(x0, y0, z0), p(x1, y0, z1), p(x0, y0, z1)),
            // back (y = y1)
            Triangle::new(p(x0, y1, z0), p(x1, y1, z1), p(x1, y1, z0)),
            Triangle::new(p(x0, y1, z0), p(x0, y1, z1), p(x1, y1, z1)),
            // left (x = x0)
            Triangle::new(p(x0, y0, z0), p(x0, y0, z1), p(x0, y1, z1)),
            Triangle::new(p(x0, y0, z0), p(x0, y1, z1), p(x0, y1, z0)),
            // right (x = x1)
            Triangle::new(p(x1, y0, z0), p(x1, y1, z1), p(x1, y0, z1)),
            Triangle::new(p(x1, y0, z0), p(x1, y1, z0), p(x1, y1, z1)),
        ];
        Self::from_triangles(triangles)
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Number of unique vertices after 6-decimal quantization.
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn bbox_min(&self) -> Point {
        self.bbox_min
    }

    pub fn bbox_max(&self) -> Point {
        self.bbox_max
    }

    /// Bounding box extents (x, y, z) in millimeters.
    pub fn bbox_extents(&self) -> (f64, f64, f64) {
        (
            self.bbox_max.x - self.bbox_min.x,
            self.bbox_max.y - self.bbox_min.y,
            self.bbox_max.z - self.bbox_min.z,
        )
    }

    /// Enclosed volume in mm^3 (absolute value of the signed sum).
    pub fn volume_mm3(&self) -> f64 {
        self.volume_mm3
    }

    pub fn is_watertight(&self) -> bool {
        self.watertight
    }
}
