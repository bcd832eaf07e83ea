//! Multi-run sampling core
//!
//! A single call to a generative backend is not reproducible: identical
//! inputs produce different scores across invocations. This module executes
//! the same logical query N times, rejects statistical outliers, and
//! aggregates the survivors into one value with a confidence interval.

mod aggregate;
mod config;
mod confidence;
mod executor;
mod orchestrator;
mod outlier;
mod run;
mod statistics;

pub use aggregate::{
    aggregate_by_mean, aggregate_by_median, aggregate_by_trimmed_mean, aggregate_numeric_fields,
    DEFAULT_TRIM_PERCENT,
};
pub use config::{OutlierMethod, RetryPolicy, SamplingConfig};
pub use confidence::{confidence_interval, ConfidenceInterval};
pub use executor::{FnExecutor, RunExecutor, SampleExecutor};
pub use orchestrator::MultiRunSampler;
pub use outlier::{
    detect_outliers, detect_outliers_iqr, detect_outliers_zscore, DetectionMethod,
    DEFAULT_IQR_MULTIPLIER, DEFAULT_ZSCORE_THRESHOLD,
};
pub use run::{RunResult, Sample, SamplingResult};
pub use statistics::{
    calculate_statistics, coefficient_of_variation, iqr, mean, median, quartiles, std_dev,
    variance, Quartiles, SamplingStatistics,
};

#[cfg(test)]
pub use executor::mock::{ScriptStep, ScriptedExecutor};
