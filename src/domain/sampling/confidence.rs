//! Confidence interval estimation
//!
//! Normal approximation around the mean of the valid scores. The handful of
//! confidence levels anyone asks for are table-driven; anything else falls
//! back to the 95% critical value.

use serde::{Deserialize, Serialize};

use super::statistics::{mean, std_dev};

/// Critical z values for the commonly requested confidence levels.
const Z_TABLE: &[(f64, f64)] = &[(0.90, 1.645), (0.95, 1.96), (0.99, 2.576)];

/// Fallback critical value for levels outside the table (95%).
const DEFAULT_Z: f64 = 1.96;

/// Two-sided interval around the mean of the valid scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub level: f64,
    pub lower: f64,
    pub upper: f64,
    pub margin_of_error: f64,
}

fn z_for_level(level: f64) -> f64 {
    Z_TABLE
        .iter()
        .find(|(l, _)| (l - level).abs() < 1e-9)
        .map(|(_, z)| *z)
        .unwrap_or(DEFAULT_Z)
}

/// Estimate the interval: `margin = z * std_dev / sqrt(n)`.
///
/// An empty series yields the degenerate `[0, 0]` interval with zero
/// margin rather than an error.
pub fn confidence_interval(values: &[f64], level: f64) -> ConfidenceInterval {
    if values.is_empty() {
        return ConfidenceInterval {
            level,
            lower: 0.0,
            upper: 0.0,
            margin_of_error: 0.0,
        };
    }

    let m = mean(values);
    let margin = z_for_level(level) * std_dev(values) / (values.len() as f64).sqrt();

    ConfidenceInterval {
        level,
        lower: m - margin,
        upper: m + margin,
        margin_of_error: margin,
    }
}
