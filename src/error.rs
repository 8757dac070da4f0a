use std::path::PathBuf;
use thiserror::Error;

/// Typed failures raised by the core pipeline.
///
/// Every fallible operation returns either a fully valid result or exactly
/// one of these kinds. Callers pattern-match on the variant instead of
/// inspecting message strings.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Unsupported input unit: {0}")]
    UnsupportedUnit(String),

    #[error("scale_to_mm must be > 0 (got {0})")]
    InvalidScale(f64),

    #[error("Mesh file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid STL content: {0}")]
    InvalidFormat(String),

    #[error("Mesh is not watertight (detected non-manifold/open edges)")]
    NonWatertightMesh,

    #[error("Direction vector has zero length")]
    ZeroLengthDirection,

    #[error("No {table} data for material '{material}'")]
    MissingMaterialData { table: &'static str, material: String },

    #[error("Invalid {table} interpolation for material '{material}'")]
    InvalidInterpolation { table: &'static str, material: String },

    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometryType(String),

    #[error("Unsupported energy type: {0}")]
    UnsupportedEnergyType(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
