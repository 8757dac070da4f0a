use crate::Point;
use ndarray as nd;
use serde::{Deserialize, Serialize};

/// Rigid-body transform applied to mesh vertices before any other
/// geometry processing.
///
/// Rotations are intrinsic, in degrees, applied about X, then Y, then Z.
/// Translation (millimeters) is applied after the rotations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pose {
    pub tx_mm: f64,
    pub ty_mm: f64,
    pub tz_mm: f64,
    pub rx_deg: f64,
    pub ry_deg: f64,
    pub rz_deg: f64,
}

impl Pose {
    pub fn identity() -> Self {
        Self {
            tx_mm: 0.,
            ty_mm: 0.,
            tz_mm: 0.,
            rx_deg: 0.,
            ry_deg: 0.,
            rz_deg: 0.,
        }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// Applies the pose to a single vertex: rotate about X, Y, Z, then translate.
    pub fn apply(&self, p: Point) -> Point {
        if self.is_identity() {
            return p;
        }
        let rot = self.rotation_matrix();
        let v = nd::arr1(&[p.x, p.y, p.z]);
        let r = rot.dot(&v);
        Point::new(r[0] + self.tx_mm, r[1] + self.ty_mm, r[2] + self.tz_mm)
    }

    /// Combined rotation matrix Rz * Ry * Rx for column vectors.
    ///
    /// Reference: https://en.wikipedia.org/wiki/Rotation_matrix#Basic_3D_rotations
    fn rotation_matrix(&self) -> nd::Array2<f64> {
        let (sx, cx) = self.rx_deg.to_radians().sin_cos();
        let (sy, cy) = self.ry_deg.to_radians().sin_cos();
        let (sz, cz) = self.rz_deg.to_radians().sin_cos();

        let rx: nd::Array2<f64> = nd::arr2(&[[1., 0., 0.], [0., cx, -sx], [0., sx, cx]]);
        let ry: nd::Array2<f64> = nd::arr2(&[[cy, 0., sy], [0., 1., 0.], [-sy, 0., cy]]);
        let rz: nd::Array2<f64> = nd::arr2(&[[cz, -sz, 0.], [sz, cz, 0.], [0., 0., 1.]]);

        rz.dot(&ry).dot(&rx)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passthrough() {
        let pose = Pose::identity();
        let p = Point::new(1., 2., 3.);
        assert!(pose.apply(p).is_close(&p));
    }

    #[test]
    fn test_translation_only() {
        let pose = Pose {
            tx_mm: 10.,
            ty_mm: -5.,
            tz_mm: 1.,
            ..Pose::identity()
        };
        let p = pose.apply(Point::new(1., 1., 1.));
        assert!(p.is_close(&Point::new(11., -4., 2.)));
    }

    #[test]
    fn test_rotation_about_z() {
        let pose = Pose {
            rz_deg: 90.,
            ..Pose::identity()
        };
        let p = pose.apply(Point::new(1., 0., 0.));
        assert!((p.x - 0.).abs() < 1e-12);
        assert!((p.y - 1.).abs() < 1e-12);
        assert!((p.z - 0.).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_order_x_then_z() {
        // (0, 1, 0) rotated 90 deg about X lands on (0, 0, 1);
        // the following 90 deg about Z leaves it unchanged.
        let pose = Pose {
            rx_deg: 90.,
            rz_deg: 90.,
            ..Pose::identity()
        };
        let p = pose.apply(Point::new(0., 1., 0.));
        assert!((p.x - 0.).abs() < 1e-12);
        assert!((p.y - 0.).abs() < 1e-12);
        assert!((p.z - 1.).abs() < 1e-12);
    }
}
