//! Outlier detection over score series
//!
//! Two independent methods with complementary blind spots: the IQR fence is
//! robust against a single extreme value distorting the spread, while the
//! Z-score catches point-wise deviation but is itself pulled by extremes.
//! Combined mode unions both, so a borderline sample is discarded rather
//! than trusted.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::config::OutlierMethod;
use super::statistics::{mean, quartiles, std_dev};

/// Default Tukey fence multiplier for the IQR method.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Default threshold for the Z-score method.
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 2.0;

/// Smallest series that supports robust quartile fences.
const MIN_IQR_SAMPLES: usize = 4;

/// Smallest series that supports a meaningful Z-score.
const MIN_ZSCORE_SAMPLES: usize = 3;

/// Which detection method flagged a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Iqr,
    ZScore,
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iqr => write!(f, "IQR"),
            Self::ZScore => write!(f, "Z-score"),
        }
    }
}

/// Indices of values strictly outside the fence
/// `[q1 - multiplier * iqr, q3 + multiplier * iqr]`.
///
/// Series shorter than 4 cannot support robust quartiles and report no
/// outliers.
pub fn detect_outliers_iqr(values: &[f64], multiplier: f64) -> BTreeSet<usize> {
    if values.len() < MIN_IQR_SAMPLES {
        return BTreeSet::new();
    }

    let q = quartiles(values);
    let spread = q.q3 - q.q1;
    let lower = q.q1 - multiplier * spread;
    let upper = q.q3 + multiplier * spread;

    values
        .iter()
        .enumerate()
        .filter(|(_, v)| **v < lower || **v > upper)
        .map(|(i, _)| i)
        .collect()
}

/// Indices whose `|value - mean| / std_dev` exceeds the threshold.
///
/// Series shorter than 3, or with zero standard deviation, report no
/// outliers - a zero-variance sample has none by definition.
pub fn detect_outliers_zscore(values: &[f64], threshold: f64) -> BTreeSet<usize> {
    if values.len() < MIN_ZSCORE_SAMPLES {
        return BTreeSet::new();
    }

    let sd = std_dev(values);
    if sd == 0.0 {
        return BTreeSet::new();
    }

    let m = mean(values);

    values
        .iter()
        .enumerate()
        .filter(|(_, v)| ((**v - m) / sd).abs() > threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Run the configured method(s) and report, per flagged index, every method
/// that fired. Combined mode is the union of both index sets.
pub fn detect_outliers(
    values: &[f64],
    method: OutlierMethod,
    multiplier: f64,
    threshold: f64,
) -> BTreeMap<usize, Vec<DetectionMethod>> {
    let mut flagged: BTreeMap<usize, Vec<DetectionMethod>> = BTreeMap::new();

    if matches!(method, OutlierMethod::Iqr | OutlierMethod::Combined) {
        for index in detect_outliers_iqr(values, multiplier) {
            flagged.entry(index).or_default().push(DetectionMethod::Iqr);
        }
    }

    if matches!(method, OutlierMethod::ZScore | OutlierMethod::Combined) {
        for index in detect_outliers_zscore(values, threshold) {
            flagged.entry(index).or_default().push(DetectionMethod::ZScore);
        }
    }

    flagged
}
