//! Analytic shielding estimator for collimator devices.
//!
//! Given a 3D solid (STL mesh) or a simplified 2D parametric stand-in plus
//! a source spectrum, this crate derives beam geometry metrics and boundary
//! dose rates used for a safety pass/fail decision. The computation is a
//! deterministic, single-pass analytic approximation - conservative
//! decision support, not a certified dosimetry engine.

pub mod error;
pub mod geom;
pub mod io;
pub mod materials;
pub mod sim;
pub mod spectrum;

// Prelude
pub use error::{Error, Result};
pub use geom::mesh::MeshGeometry;
pub use geom::point::Point;
pub use geom::triangle::Triangle;
pub use geom::vector::Vector;
pub use materials::MaterialDb;
pub use sim::pipeline::{ProjectResult, run_project};
pub use spectrum::Spectrum;
