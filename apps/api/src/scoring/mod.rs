// Big Five scoring core: questionnaire key, per-student scoring,
// dominant-trait resolution and class aggregation. Pure functions, no I/O.

pub mod aggregate;
pub mod dominant;
pub mod items;
pub mod scorer;
pub mod traits;

/// Rounds to two decimal places for display.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
