//! Boundary dose engine.
//!
//! Evaluates leakage dose at boundary sample positions around the device:
//! spectrum-weighted narrow-beam transmission with a buildup correction,
//! inverse-square falloff from the source, and a duty-cycle average
//! compared against the configured limit. Samples are independent, so the
//! per-sample work runs in parallel.

use rayon::prelude::*;

use crate::Point;
use crate::Vector;
use crate::error::Result;
use crate::geom::raycast::path_length_through;
use crate::materials::MaterialDb;
use crate::sim::config::{BoundaryConfig, ProjectConfig};
use crate::sim::geometry::GeometryResult;
use crate::sim::round_to;
use crate::spectrum::Spectrum;

/// Distances below 1 cm are clamped to keep the inverse-square term
/// finite.
const MIN_DISTANCE_M: f64 = 0.01;

/// Leakage paths below 1 um still attenuate as 1 um of material.
const MIN_THICKNESS_MM: f64 = 0.001;

/// One boundary evaluation position.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BoundarySample {
    angle_deg: f64,
    position_m: [f64; 3],
}

/// Dose at one boundary sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoseRow {
    pub angle_deg: f64,
    pub position_m: [f64; 3],
    pub distance_m: f64,
    /// Shielding thickness along the source-to-sample ray, mm.
    pub thickness_mm: f64,
    /// Spectrum-weighted broad-beam transmission factor.
    pub transmission: f64,
    pub instantaneous_usv_h: f64,
    pub average_usv_h: f64,
}

/// Aggregate verdict over all boundary samples.
///
/// The aggregate fields are `None` when no samples were evaluated
/// (boundary check disabled or an empty point list), so a skipped check
/// is distinguishable from a real all-zero evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafetySummary {
    pub max_instantaneous_usv_h: Option<f64>,
    pub max_average_usv_h: Option<f64>,
    /// Angle of the sample with the highest time-averaged dose.
    pub worst_angle_deg: Option<f64>,
    /// Whether the worst time-averaged dose stays within the configured
    /// limit; `None` when no samples were evaluated.
    pub pass: Option<bool>,
    pub duty_factor: f64,
    pub energy_bin_count: usize,
}

impl SafetySummary {
    fn empty(duty_factor: f64, energy_bin_count: usize) -> Self {
        Self {
            max_instantaneous_usv_h: None,
            max_average_usv_h: None,
            worst_angle_deg: None,
            pass: None,
            duty_factor,
            energy_bin_count,
        }
    }
}

/// Output of the boundary dose engine.
#[derive(Debug, Clone)]
pub struct SafetyResult {
    pub rows: Vec<DoseRow>,
    pub summary: SafetySummary,
}

fn boundary_samples(boundary: &BoundaryConfig) -> Vec<BoundarySample> {
    match boundary {
        BoundaryConfig::Ring { radius_m, height_m } => (0..360)
            .step_by(10)
            .map(|deg| {
                let theta = (deg as f64).to_radians();
                BoundarySample {
                    angle_deg: deg as f64,
                    position_m: [radius_m * theta.cos(), radius_m * theta.sin(), *height_m],
                }
            })
            .collect(),
        BoundaryConfig::Points { points_m } => points_m
            .iter()
            .map(|p| {
                let mut angle = p[1].atan2(p[0]).to_degrees();
                if angle < 0.0 {
                    angle += 360.0;
                }
                BoundarySample {
                    angle_deg: angle,
                    position_m: *p,
                }
            })
            .collect(),
    }
}

/// Spectrum-weighted transmission through `x_cm` of material, with the
/// buildup correction applied per energy bin.
fn transmission_factor(
    db: &MaterialDb,
    material: &str,
    density_g_cm3: f64,
    x_cm: f64,
    spectrum: &Spectrum,
) -> Result<f64> {
    let mut total = 0.0;
    for bin in spectrum.bins() {
        let mu_rho = db.mu_rho_cm2_per_g(material, bin.energy_mev)?;
        let mfp = mu_rho * density_g_cm3 * x_cm;
        let buildup = db.buildup_factor(material, bin.energy_mev, mfp)?;
        total += bin.weight * buildup * (-mfp).exp();
    }
    Ok(total)
}

/// Azimuthal leakage variation: collimator housings are not rotationally
/// symmetric, modeled as a three-lobe modulation floored at 0.2.
fn directional_factor(angle_deg: f64) -> f64 {
    (1.0 + 0.06 * (3.0 * angle_deg.to_radians()).sin()).max(0.2)
}

fn evaluate_sample(
    sample: &BoundarySample,
    config: &ProjectConfig,
    geometry: &GeometryResult,
    db: &MaterialDb,
    spectrum: &Spectrum,
    duty_factor: f64,
) -> Result<DoseRow> {
    let safety = &config.safety;
    let source = config.source.position_m;

    let dx = sample.position_m[0] - source[0];
    let dy = sample.position_m[1] - source[1];
    let dz = sample.position_m[2] - source[2];
    let raw_distance_m = (dx * dx + dy * dy + dz * dz).sqrt();
    let distance_m = raw_distance_m.max(MIN_DISTANCE_M);

    // In mesh mode the real solid path along the source-to-sample ray
    // replaces the bulk thickness. A sample within the distance floor has
    // no usable ray direction and falls back to the bulk thickness.
    let thickness_mm = match &geometry.mesh {
        Some(mesh) if raw_distance_m >= MIN_DISTANCE_M => path_length_through(
            mesh,
            Point::new(source[0] * 1000.0, source[1] * 1000.0, source[2] * 1000.0),
            Vector::new(dx, dy, dz),
            distance_m * 1000.0,
            None,
        )?,
        _ => geometry.thickness_mm,
    };

    let x_cm = (thickness_mm.max(MIN_THICKNESS_MM) / 10.0) * safety.leakage_path_scale;
    let transmission = transmission_factor(
        db,
        &safety.material,
        safety.density_g_cm3,
        x_cm,
        spectrum,
    )?;

    let conservative = if safety.conservative_mode {
        safety.conservative_factor
    } else {
        1.0
    };
    let source_factor = (config.source.diameter_mm / 4.0).max(0.2);

    let instantaneous = safety.dose_scale
        * safety.leakage_fraction
        * conservative
        * source_factor
        * (1.0 / (distance_m * distance_m))
        * transmission
        * directional_factor(sample.angle_deg);

    Ok(DoseRow {
        angle_deg: round_to(sample.angle_deg, 3),
        position_m: sample.position_m,
        distance_m: round_to(distance_m, 6),
        thickness_mm: round_to(thickness_mm, 6),
        transmission: round_to(transmission, 9),
        instantaneous_usv_h: round_to(instantaneous, 6),
        average_usv_h: round_to(instantaneous * duty_factor, 6),
    })
}

/// Runs the boundary dose evaluation.
///
/// Returns an empty result with `pass: None` when the boundary check is
/// disabled or the boundary has no sample points.
pub fn run_safety(
    config: &ProjectConfig,
    geometry: &GeometryResult,
    db: &MaterialDb,
) -> Result<SafetyResult> {
    let safety = &config.safety;
    let spectrum = Spectrum::from_energy(&config.energy);
    let duty = &safety.duty_cycle;
    let duty_factor = duty.beam_on_s * duty.scans_per_hour / 3600.0;

    if !safety.enable_boundary {
        return Ok(SafetyResult {
            rows: Vec::new(),
            summary: SafetySummary::empty(duty_factor, spectrum.len()),
        });
    }

    let samples = boundary_samples(&safety.boundary);
    let rows: Vec<DoseRow> = samples
        .par_iter()
        .map(|sample| evaluate_sample(sample, config, geometry, db, &spectrum, duty_factor))
        .collect::<Result<_>>()?;

    if rows.is_empty() {
        return Ok(SafetyResult {
            rows,
            summary: SafetySummary::empty(duty_factor, spectrum.len()),
        });
    }

    let mut max_instantaneous = f64::NEG_INFINITY;
    let mut max_average = f64::NEG_INFINITY;
    let mut worst_angle = 0.0;
    for row in &rows {
        max_instantaneous = max_instantaneous.max(row.instantaneous_usv_h);
        if row.average_usv_h > max_average {
            max_average = row.average_usv_h;
            worst_angle = row.angle_deg;
        }
    }

    Ok(SafetyResult {
        rows,
        summary: SafetySummary {
            max_instantaneous_usv_h: Some(max_instantaneous),
            max_average_usv_h: Some(max_average),
            worst_angle_deg: Some(worst_angle),
            pass: Some(max_average <= safety.boundary_limit_usv_h),
            duty_factor,
            energy_bin_count: spectrum.len(),
        },
    })
}
