//! End-to-end project evaluation.
//!
//! Chains the beam metrics engine and the boundary dose engine over one
//! project configuration and one material database.

use crate::error::Result;
use crate::materials::MaterialDb;
use crate::sim::config::ProjectConfig;
use crate::sim::geometry::{BeamMetrics, ProfileRow, run_geometry};
use crate::sim::safety::{DoseRow, SafetySummary, run_safety};

/// Complete result of one project evaluation.
#[derive(Debug, Clone)]
pub struct ProjectResult {
    pub metrics: BeamMetrics,
    pub profile: Vec<ProfileRow>,
    pub dose_rows: Vec<DoseRow>,
    pub safety: SafetySummary,
}

/// Evaluates a project: beam metrics first, then the boundary dose check
/// against the given material database.
pub fn run_project(config: &ProjectConfig, db: &MaterialDb) -> Result<ProjectResult> {
    let geometry = run_geometry(config)?;
    let safety = run_safety(config, &geometry, db)?;

    Ok(ProjectResult {
        metrics: geometry.metrics,
        profile: geometry.profile,
        dose_rows: safety.rows,
        safety: safety.summary,
    })
}
