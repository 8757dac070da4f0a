//! Project configuration consumed by the core pipeline.
//!
//! These structs describe an already-parsed, already-validated project:
//! YAML parsing, schema validation and CLI handling live outside this
//! crate and deserialize straight into these types via serde.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::io::stl::MeshConfig;
use crate::spectrum::EnergyConfig;

/// Beam shape of the collimator device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeamMode {
    FanBeam,
    PencilBeam,
}

/// Device geometry: either simplified parametric dimensions or a full
/// 3D mesh. Exhaustively matched everywhere, so adding a third kind is a
/// compile-time-checked exercise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GeometryConfig {
    #[serde(rename = "parametric_2d")]
    Parametric2d {
        /// Collimator slit width in mm.
        slit_mm: f64,
        /// Source-to-detector distance in mm.
        sdd_mm: f64,
        /// Absorber thickness in mm.
        thickness_mm: f64,
    },
    #[serde(rename = "mesh_3d")]
    Mesh3d {
        mesh: MeshConfig,
        #[serde(default)]
        aperture_equivalent_method: ApertureMethod,
    },
}

/// Tag names of the geometry variants, for glue layers that receive the
/// kind as a raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Parametric2d,
    Mesh3d,
}

impl FromStr for GeometryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "parametric_2d" => Ok(GeometryKind::Parametric2d),
            "mesh_3d" => Ok(GeometryKind::Mesh3d),
            other => Err(Error::UnsupportedGeometryType(other.to_string())),
        }
    }
}

/// Policy for deriving an aperture-equivalent opening from a mesh
/// bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApertureMethod {
    /// Diameter of the circle with the X-Y footprint area.
    ProjectedArea,
    /// Smallest of the three box extents.
    MinimumClearance,
    /// Smaller of the X and Y extents.
    #[default]
    MinXyExtent,
}

/// Radiation source description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Focal spot diameter in mm.
    pub diameter_mm: f64,
    /// Source position in meters, world frame. Defaults to the origin.
    #[serde(default)]
    pub position_m: [f64; 3],
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            diameter_mm: 1.0,
            position_m: [0.0, 0.0, 0.0],
        }
    }
}

/// Where boundary dose is evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BoundaryConfig {
    /// Horizontal ring sampled every 10 degrees.
    #[serde(rename = "ring")]
    Ring {
        radius_m: f64,
        #[serde(default)]
        height_m: f64,
    },
    /// Explicit sample points in meters.
    #[serde(rename = "points")]
    Points { points_m: Vec<[f64; 3]> },
}

/// Beam-on time pattern, for converting instantaneous to time-averaged
/// dose.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DutyCycle {
    pub beam_on_s: f64,
    pub scans_per_hour: f64,
}

/// Boundary dose check parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyConfig {
    /// Skip the boundary evaluation entirely when false.
    #[serde(default = "default_true")]
    pub enable_boundary: bool,
    pub boundary: BoundaryConfig,
    /// Shielding material name (must exist in the material database).
    pub material: String,
    pub density_g_cm3: f64,
    /// Fraction of the primary beam escaping as leakage.
    #[serde(default = "default_leakage_fraction")]
    pub leakage_fraction: f64,
    #[serde(default)]
    pub conservative_mode: bool,
    /// Multiplier applied when `conservative_mode` is on.
    #[serde(default = "default_one")]
    pub conservative_factor: f64,
    pub duty_cycle: DutyCycle,
    /// Regulatory limit for the time-averaged boundary dose, uSv/h.
    pub boundary_limit_usv_h: f64,
    /// Analytic dose scale constant. A calibrated placeholder for the
    /// MVP regime, deliberately tunable rather than hard-wired.
    #[serde(default = "default_dose_scale")]
    pub dose_scale: f64,
    /// Leakage path as a fraction of bulk shielding thickness.
    #[serde(default = "default_leakage_path_scale")]
    pub leakage_path_scale: f64,
}

fn default_true() -> bool {
    true
}

fn default_one() -> f64 {
    1.0
}

fn default_leakage_fraction() -> f64 {
    0.001
}

fn default_dose_scale() -> f64 {
    1e8
}

fn default_leakage_path_scale() -> f64 {
    0.02
}

/// Complete project description consumed by
/// [`run_project`](crate::sim::pipeline::run_project).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub mode: BeamMode,
    pub energy: EnergyConfig,
    pub geometry: GeometryConfig,
    pub source: SourceConfig,
    pub safety: SafetyConfig,
}
