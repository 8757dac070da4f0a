pub mod bboxes;
pub mod mesh;
pub mod point;
pub mod raycast;
pub mod rotation;
pub mod triangle;
pub mod vector;

/// Geometric precision
pub(crate) const EPS: f64 = 1e-13;
