//! Material attenuation and buildup-factor database.
//!
//! Two reference tables, keyed by lower-cased material name: mass
//! attenuation coefficients (cm^2/g) and buildup-factor fit parameters
//! (b0, b1). The database is an explicit immutable value constructed once
//! at startup and passed by reference into every computation that needs
//! it - there is no hidden global cache.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// One tabulated mass-attenuation sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttenuationPoint {
    pub energy_mev: f64,
    pub mu_rho_cm2_g: f64,
}

/// One tabulated buildup-factor parameter pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildupPoint {
    pub energy_mev: f64,
    pub b0: f64,
    pub b1: f64,
}

/// Read-only attenuation/buildup lookup tables.
#[derive(Debug, Clone)]
pub struct MaterialDb {
    attenuation: HashMap<String, Vec<AttenuationPoint>>,
    buildup: HashMap<String, Vec<BuildupPoint>>,
}

fn normalize_material(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Splits CSV text into trimmed data rows, skipping blanks, `#` comments
/// and the header. Rows with the wrong column count are silently dropped.
fn csv_rows(text: &str, columns: usize) -> Vec<Vec<String>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .skip(1) // header
        .filter_map(|line| {
            let values: Vec<String> = line.split(',').map(|v| v.trim().to_string()).collect();
            (values.len() == columns).then_some(values)
        })
        .collect()
}

fn parse_finite(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Linear interpolation over a sorted table with flat extrapolation at
/// both ends. The bracket is the first row whose energy is >= the query,
/// so exact tabulated energies return the tabulated value.
fn interpolate_linear(x: f64, energies: &[f64], values: &[f64]) -> f64 {
    debug_assert_eq!(energies.len(), values.len());
    if values.len() == 1 || x <= energies[0] {
        return values[0];
    }
    let last = energies.len() - 1;
    if x >= energies[last] {
        return values[last];
    }

    let mut hi = 1;
    while hi < last && energies[hi] < x {
        hi += 1;
    }
    let lo = hi - 1;
    let t = (x - energies[lo]) / (energies[hi] - energies[lo]);
    values[lo] + (values[hi] - values[lo]) * t
}

impl MaterialDb {
    /// Parses both reference tables from CSV text.
    ///
    /// Malformed rows (wrong column count, non-finite numbers) are
    /// dropped; per-material point lists are sorted ascending by energy.
    pub fn from_csv(attenuation_csv: &str, buildup_csv: &str) -> Self {
        let mut attenuation: HashMap<String, Vec<AttenuationPoint>> = HashMap::new();
        for row in csv_rows(attenuation_csv, 3) {
            if let (Some(energy), Some(mu_rho)) = (parse_finite(&row[1]), parse_finite(&row[2])) {
                attenuation
                    .entry(normalize_material(&row[0]))
                    .or_default()
                    .push(AttenuationPoint {
                        energy_mev: energy,
                        mu_rho_cm2_g: mu_rho,
                    });
            }
        }
        for points in attenuation.values_mut() {
            points.sort_by(|a, b| a.energy_mev.partial_cmp(&b.energy_mev).unwrap());
        }

        let mut buildup: HashMap<String, Vec<BuildupPoint>> = HashMap::new();
        for row in csv_rows(buildup_csv, 4) {
            if let (Some(energy), Some(b0), Some(b1)) = (
                parse_finite(&row[1]),
                parse_finite(&row[2]),
                parse_finite(&row[3]),
            ) {
                buildup
                    .entry(normalize_material(&row[0]))
                    .or_default()
                    .push(BuildupPoint {
                        energy_mev: energy,
                        b0,
                        b1,
                    });
            }
        }
        for points in buildup.values_mut() {
            points.sort_by(|a, b| a.energy_mev.partial_cmp(&b.energy_mev).unwrap());
        }

        Self {
            attenuation,
            buildup,
        }
    }

    /// Reads both tables from CSV files.
    pub fn from_files(attenuation_path: &Path, buildup_path: &Path) -> Result<Self> {
        let attenuation_csv = std::fs::read_to_string(attenuation_path)?;
        let buildup_csv = std::fs::read_to_string(buildup_path)?;
        Ok(Self::from_csv(&attenuation_csv, &buildup_csv))
    }

    /// Reference tables shipped with the crate (lead, tungsten, steel,
    /// concrete).
    pub fn builtin() -> Self {
        Self::from_csv(
            include_str!("../data/attenuation.csv"),
            include_str!("../data/buildup.csv"),
        )
    }

    /// Interpolated mass attenuation coefficient in cm^2/g.
    pub fn mu_rho_cm2_per_g(&self, material: &str, energy_mev: f64) -> Result<f64> {
        let key = normalize_material(material);
        let points = self
            .attenuation
            .get(&key)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::MissingMaterialData {
                table: "attenuation",
                material: material.to_string(),
            })?;

        let energies: Vec<f64> = points.iter().map(|p| p.energy_mev).collect();
        let values: Vec<f64> = points.iter().map(|p| p.mu_rho_cm2_g).collect();
        let value = interpolate_linear(energy_mev, &energies, &values);
        if !value.is_finite() || value <= 0.0 {
            return Err(Error::InvalidInterpolation {
                table: "attenuation",
                material: material.to_string(),
            });
        }
        Ok(value)
    }

    /// Buildup factor `1 + b0 * (1 - exp(-b1 * mfp))` with `mfp` clamped
    /// to >= 0.
    pub fn buildup_factor(&self, material: &str, energy_mev: f64, mfp: f64) -> Result<f64> {
        let key = normalize_material(material);
        let points = self
            .buildup
            .get(&key)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::MissingMaterialData {
                table: "buildup",
                material: material.to_string(),
            })?;

        let energies: Vec<f64> = points.iter().map(|p| p.energy_mev).collect();
        let b0s: Vec<f64> = points.iter().map(|p| p.b0).collect();
        let b1s: Vec<f64> = points.iter().map(|p| p.b1).collect();
        let b0 = interpolate_linear(energy_mev, &energies, &b0s);
        let b1 = interpolate_linear(energy_mev, &energies, &b1s);
        if !b0.is_finite() || !b1.is_finite() {
            return Err(Error::InvalidInterpolation {
                table: "buildup",
                material: material.to_string(),
            });
        }

        let mfp = mfp.max(0.0);
        Ok(1.0 + b0 * (1.0 - (-b1 * mfp).exp()))
    }

    /// Materials present in the attenuation table.
    pub fn materials(&self) -> Vec<String> {
        let mut names: Vec<String> = self.attenuation.keys().cloned().collect();
        names.sort();
        names
    }
}
