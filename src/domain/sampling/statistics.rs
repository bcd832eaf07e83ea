//! Descriptive statistics over score series
//!
//! Every function here tolerates degenerate input (empty series, single
//! element, zero variance) by returning 0 rather than NaN. The outlier and
//! confidence-interval code downstream depends on receiving 0 for these
//! cases, so the guards are part of the contract, not a convenience.

use serde::{Deserialize, Serialize};

/// Arithmetic mean. An empty series has mean 0.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.iter().sum::<f64>() / values.len() as f64
}

/// Median of the series. Sorts a copy; the input is never mutated.
/// An empty series has median 0.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample variance (N-1 denominator). Series shorter than 2 elements have
/// no spread; returns 0.
pub fn variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }

    let m = mean(values);
    let sum_squares: f64 = values.iter().map(|v| (v - m).powi(2)).sum();

    sum_squares / (values.len() - 1) as f64
}

/// Sample standard deviation (N-1 denominator); 0 for series shorter than
/// 2 elements, never NaN.
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Standard deviation as a percentage of the mean; 0 when the mean is 0.
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    let m = mean(values);

    if m == 0.0 {
        return 0.0;
    }

    std_dev(values) / m * 100.0
}

/// First, second and third quartiles of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quartiles {
    pub q1: f64,
    pub q2: f64,
    pub q3: f64,
}

/// Quartiles via median split: the sorted series is halved at the median
/// and Q1/Q3 are the medians of the halves. At odd length the median
/// element belongs to both halves (Tukey's hinges), which keeps
/// `q1 <= q2 <= q3` for every non-empty series. Empty input yields all
/// zeros.
pub fn quartiles(values: &[f64]) -> Quartiles {
    if values.is_empty() {
        return Quartiles {
            q1: 0.0,
            q2: 0.0,
            q3: 0.0,
        };
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    let (lower, upper) = if sorted.len() % 2 == 0 {
        (&sorted[..mid], &sorted[mid..])
    } else {
        (&sorted[..=mid], &sorted[mid..])
    };

    Quartiles {
        q1: median(lower),
        q2: median(&sorted),
        q3: median(upper),
    }
}

/// Interquartile range (Q3 - Q1).
pub fn iqr(values: &[f64]) -> f64 {
    let q = quartiles(values);
    q.q3 - q.q1
}

/// Composite descriptive-statistics record for one sampling session.
///
/// Derived data, recomputed fresh per session and never mutated after
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingStatistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub min: f64,
    pub max: f64,
    pub range: f64,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    /// std_dev / mean as a percentage; 0 when the mean is 0
    pub coefficient_of_variation: f64,
    pub outlier_count: usize,
    pub valid_count: usize,
}

/// Compute the composite record over the valid scores of a session.
/// Empty input yields an all-zero record apart from the passed-through
/// outlier count.
pub fn calculate_statistics(values: &[f64], outlier_count: usize) -> SamplingStatistics {
    if values.is_empty() {
        return SamplingStatistics {
            outlier_count,
            ..Default::default()
        };
    }

    let q = quartiles(values);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    SamplingStatistics {
        mean: mean(values),
        median: median(values),
        std_dev: std_dev(values),
        variance: variance(values),
        min,
        max,
        range: max - min,
        q1: q.q1,
        q3: q.q3,
        iqr: q.q3 - q.q1,
        coefficient_of_variation: coefficient_of_variation(values),
        outlier_count,
        valid_count: values.len(),
    }
}
