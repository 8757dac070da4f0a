use crate::Point;
use crate::Vector;

/// One oriented facet of a solid. Vertices are millimeters in a common
/// world frame, already unit-scaled and pose-transformed.
///
/// Triangles are stored by value in a contiguous buffer owned by
/// [`MeshGeometry`](crate::geom::mesh::MeshGeometry) so that ray iteration
/// stays cache-friendly.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Point,
    pub b: Point,
    pub c: Point,
}

impl Triangle {
    pub fn new(a: Point, b: Point, c: Point) -> Self {
        Self { a, b, c }
    }

    /// Signed volume of the tetrahedron spanned by this triangle and the
    /// origin. The sign depends on the facet winding.
    pub fn signed_volume(&self) -> f64 {
        let va = Vector::new(self.a.x, self.a.y, self.a.z);
        let vb = Vector::new(self.b.x, self.b.y, self.b.z);
        let vc = Vector::new(self.c.x, self.c.y, self.c.z);
        va.dot(&vb.cross(&vc)) / 6.0
    }
}
