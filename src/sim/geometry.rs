//! Beam geometry metrics engine.
//!
//! Derives beam-core width, FWHM, penumbra and a 1D fluence profile from
//! either parametric dimensions or a mesh-derived aperture equivalence.

use crate::error::Result;
use crate::geom::mesh::MeshGeometry;
use crate::io::stl::load_stl;
use crate::sim::config::{ApertureMethod, BeamMode, GeometryConfig, ProjectConfig};
use crate::sim::round_to;

/// Beam geometry metrics, one record per run.
///
/// Mesh-derived fields stay `None` in parametric mode; uniformity stays
/// `None` outside fan-beam mode. Flat structure, suitable for direct
/// tabular serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamMetrics {
    pub beam_core_width_mm: f64,
    pub fwhm_mm: f64,
    pub penumbra_10_90_mm: f64,
    pub integral_fluence_norm: f64,
    pub aperture_equivalent_mm: f64,
    pub uniformity_percent: Option<f64>,
    pub mesh_bbox_x_mm: Option<f64>,
    pub mesh_bbox_y_mm: Option<f64>,
    pub mesh_bbox_z_mm: Option<f64>,
    pub mesh_volume_mm3: Option<f64>,
}

/// One sample of the 1D fluence profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileRow {
    pub x_mm: f64,
    pub fluence_norm: f64,
}

/// Output of the beam metrics engine, including what the dose engine
/// needs downstream: a flat-thickness fallback and, in mesh mode, the
/// loaded solid.
#[derive(Debug, Clone)]
pub struct GeometryResult {
    pub metrics: BeamMetrics,
    pub profile: Vec<ProfileRow>,
    /// Bulk shielding thickness used when no mesh ray data is available.
    pub thickness_mm: f64,
    /// Loaded solid, present in mesh mode only.
    pub mesh: Option<MeshGeometry>,
}

/// Flat-top profile with Gaussian shoulders: 61 samples from -30 mm to
/// +30 mm in 1 mm steps.
fn make_profile(fwhm_mm: f64, core_mm: f64) -> Vec<ProfileRow> {
    let sigma = (fwhm_mm / 2.355).max(0.1);
    let half_core = core_mm / 2.0;
    (-30..=30)
        .map(|x| {
            let x = x as f64;
            let edge_distance = (x.abs() - half_core).max(0.0);
            let fluence = (-(edge_distance * edge_distance) / (2.0 * sigma * sigma)).exp();
            ProfileRow {
                x_mm: x,
                fluence_norm: round_to(fluence, 6),
            }
        })
        .collect()
}

/// Effective circular/rectangular opening size derived from the mesh
/// bounding box. Extents are floored at 1e-9 mm to keep downstream
/// divisions well-defined.
fn aperture_equivalent_mm(mesh: &MeshGeometry, method: ApertureMethod) -> f64 {
    let (x, y, z) = mesh.bbox_extents();
    match method {
        ApertureMethod::ProjectedArea => {
            let area = (x * y).max(1e-9);
            2.0 * (area / std::f64::consts::PI).sqrt()
        }
        ApertureMethod::MinimumClearance => x.min(y).min(z).max(1e-9),
        ApertureMethod::MinXyExtent => x.min(y).max(1e-9),
    }
}

/// Runs the beam metrics engine for the configured geometry.
pub fn run_geometry(config: &ProjectConfig) -> Result<GeometryResult> {
    let source_diameter = config.source.diameter_mm;
    let fan_beam = config.mode == BeamMode::FanBeam;

    match &config.geometry {
        GeometryConfig::Parametric2d {
            slit_mm,
            sdd_mm,
            thickness_mm,
        } => {
            // Pinhole magnification with the effective distance floored
            // at 1 mm
            let effective_distance = (sdd_mm - thickness_mm).max(1.0);
            let magnification = sdd_mm / effective_distance;
            let core = slit_mm * magnification;
            let penumbra = source_diameter * magnification;
            let fwhm = core + 0.5 * penumbra;

            let metrics = BeamMetrics {
                beam_core_width_mm: round_to(core, 6),
                fwhm_mm: round_to(fwhm, 6),
                penumbra_10_90_mm: round_to(penumbra, 6),
                integral_fluence_norm: 1.0,
                aperture_equivalent_mm: round_to(core, 6),
                uniformity_percent: fan_beam
                    .then(|| round_to((100.0 - penumbra * 0.3).max(0.0), 3)),
                mesh_bbox_x_mm: None,
                mesh_bbox_y_mm: None,
                mesh_bbox_z_mm: None,
                mesh_volume_mm3: None,
            };

            Ok(GeometryResult {
                profile: make_profile(fwhm, core),
                metrics,
                thickness_mm: *thickness_mm,
                mesh: None,
            })
        }
        GeometryConfig::Mesh3d {
            mesh,
            aperture_equivalent_method,
        } => {
            let solid = load_stl(mesh)?;
            let (bx, by, bz) = solid.bbox_extents();

            let aperture = aperture_equivalent_mm(&solid, *aperture_equivalent_method);
            let core = aperture;
            let penumbra = source_diameter * 0.8;
            let fwhm = core + penumbra * 0.35;

            let metrics = BeamMetrics {
                beam_core_width_mm: round_to(core, 6),
                fwhm_mm: round_to(fwhm, 6),
                penumbra_10_90_mm: round_to(penumbra, 6),
                integral_fluence_norm: 1.0,
                aperture_equivalent_mm: round_to(aperture, 6),
                uniformity_percent: fan_beam
                    .then(|| round_to((98.0 - penumbra * 0.25).max(0.0), 3)),
                mesh_bbox_x_mm: Some(round_to(bx, 6)),
                mesh_bbox_y_mm: Some(round_to(by, 6)),
                mesh_bbox_z_mm: Some(round_to(bz, 6)),
                mesh_volume_mm3: Some(round_to(solid.volume_mm3(), 6)),
            };

            Ok(GeometryResult {
                profile: make_profile(fwhm, core),
                metrics,
                thickness_mm: bz,
                mesh: Some(solid),
            })
        }
    }
}
