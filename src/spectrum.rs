//! Source spectrum discretization.
//!
//! A source energy descriptor (peak tube voltage in kV, or peak photon
//! energy in MeV) is expanded into a finite set of weighted energy bins.
//! Weights always sum to 1 after construction.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One weighted energy bin of a discretized spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyBin {
    pub energy_mev: f64,
    pub weight: f64,
}

/// Source energy descriptor kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyKind {
    #[serde(rename = "kV")]
    Kv,
    #[serde(rename = "MeV")]
    Mev,
}

impl FromStr for EnergyKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "kV" => Ok(EnergyKind::Kv),
            "MeV" => Ok(EnergyKind::Mev),
            other => Err(Error::UnsupportedEnergyType(other.to_string())),
        }
    }
}

/// Source energy descriptor as found in a project configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnergyConfig {
    #[serde(rename = "type")]
    pub kind: EnergyKind,
    pub value: f64,
}

/// A normalized, ordered set of energy bins.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    bins: Vec<EnergyBin>,
}

fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count <= 1 {
        return vec![start];
    }
    let step = (end - start) / (count - 1) as f64;
    (0..count).map(|i| start + step * i as f64).collect()
}

fn logspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    if count <= 1 {
        return vec![start];
    }
    let log_start = start.ln();
    let step = (end.ln() - log_start) / (count - 1) as f64;
    (0..count).map(|i| (log_start + step * i as f64).exp()).collect()
}

impl Spectrum {
    /// Wraps raw bins and renormalizes their weights.
    ///
    /// A non-positive weight sum falls back to a uniform distribution.
    pub fn from_bins(mut bins: Vec<EnergyBin>) -> Self {
        let sum: f64 = bins.iter().map(|b| b.weight).sum();
        if sum <= 0.0 {
            let flat = 1.0 / bins.len() as f64;
            for bin in &mut bins {
                bin.weight = flat;
            }
        } else {
            for bin in &mut bins {
                bin.weight /= sum;
            }
        }
        Self { bins }
    }

    /// Discretizes a source energy descriptor.
    ///
    /// - kV: 20 linear bins under a parabolic bremsstrahlung-like shape
    ///   vanishing at both ends.
    /// - MeV: 40 logarithmic bins under a Gaussian bump.
    pub fn from_energy(energy: &EnergyConfig) -> Self {
        match energy.kind {
            EnergyKind::Kv => {
                let max_mev = energy.value / 1000.0;
                let min_mev = (max_mev * 0.08).max(0.015);
                let bins = linspace(min_mev, max_mev, 20)
                    .into_iter()
                    .map(|e| EnergyBin {
                        energy_mev: e,
                        weight: (e * (max_mev - e)).max(0.0),
                    })
                    .collect();
                Self::from_bins(bins)
            }
            EnergyKind::Mev => {
                let max_mev = energy.value;
                let min_mev = (max_mev * 0.01).max(0.05);
                let mean = (max_mev * 0.35).max(0.3);
                let sigma = (max_mev * 0.2).max(0.2);
                let bins = logspace(min_mev, max_mev, 40)
                    .into_iter()
                    .map(|e| {
                        let z = (e - mean) / sigma;
                        EnergyBin {
                            energy_mev: e,
                            weight: (-0.5 * z * z).exp(),
                        }
                    })
                    .collect();
                Self::from_bins(bins)
            }
        }
    }

    /// A single bin carrying all the weight.
    pub fn monoenergetic(energy_mev: f64) -> Self {
        Self::from_bins(vec![EnergyBin {
            energy_mev,
            weight: 1.0,
        }])
    }

    pub fn bins(&self) -> &[EnergyBin] {
        &self.bins
    }

    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}
