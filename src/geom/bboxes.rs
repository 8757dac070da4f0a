use crate::geom::point::Point;

/// Returns the min and max corners of the axis-aligned box holding `pts`.
///
/// # Panics
/// Panics if `pts` is empty.
pub fn bounding_box(pts: &[Point]) -> (Point, Point) {
    assert!(!pts.is_empty(), "bounding_box() requires at least one point");

    let mut pmin = pts[0];
    let mut pmax = pts[0];
    for p in pts.iter().skip(1) {
        if p.x < pmin.x {
            pmin.x = p.x;
        }
        if p.y < pmin.y {
            pmin.y = p.y;
        }
        if p.z < pmin.z {
            pmin.z = p.z;
        }
        if p.x > pmax.x {
            pmax.x = p.x;
        }
        if p.y > pmax.y {
            pmax.y = p.y;
        }
        if p.z > pmax.z {
            pmax.z = p.z;
        }
    }

    (pmin, pmax)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box() {
        let pts = vec![
            Point::new(1., -2., 3.),
            Point::new(-1., 2., 0.),
            Point::new(0., 0., 5.),
        ];
        let (pmin, pmax) = bounding_box(&pts);
        assert!(pmin.is_close(&Point::new(-1., -2., 0.)));
        assert!(pmax.is_close(&Point::new(1., 2., 5.)));
    }

    #[test]
    fn test_bounding_box_single_point() {
        let pts = vec![Point::new(7., 7., 7.)];
        let (pmin, pmax) = bounding_box(&pts);
        assert!(pmin.is_close(&pmax));
    }
}
