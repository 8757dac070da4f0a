pub mod config;
pub mod geometry;
pub mod pipeline;
pub mod safety;

/// Rounds to a fixed number of decimal digits, for report-stable output.
pub(crate) fn round_to(value: f64, digits: i32) -> f64 {
    let p = 10f64.powi(digits);
    (value * p).round() / p
}
