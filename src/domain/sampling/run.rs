//! Run and session result records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::confidence::ConfidenceInterval;
use super::statistics::SamplingStatistics;

/// One raw answer from the oracle: the structured result plus the backend
/// version that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample<T> {
    pub result: T,
    pub model_version: String,
}

impl<T> Sample<T> {
    pub fn new(result: T, model_version: impl Into<String>) -> Self {
        Self {
            result,
            model_version: model_version.into(),
        }
    }
}

/// The outcome of one executed run.
///
/// Created by the run executor with `is_outlier = false`; the orchestrator
/// sets outlier status once after detection and the record is never mutated
/// after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult<T> {
    /// Zero-based submission order, stable across completion order
    pub run_index: usize,
    pub result: T,
    /// Wall-clock latency of the successful attempt
    pub latency_ms: u64,
    pub model_version: String,
    pub timestamp: DateTime<Utc>,
    pub is_outlier: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_reason: Option<String>,
}

impl<T> RunResult<T> {
    pub(crate) fn mark_outlier(&mut self, reason: impl Into<String>) {
        self.is_outlier = true;
        self.outlier_reason = Some(reason.into());
    }
}

/// Final output of one sampling session.
///
/// `runs` keeps every executed run, outliers included, for audit;
/// `valid_runs` and `outlier_runs` partition it. `aggregated` is `None`
/// exactly when no run survived execution at all - check
/// `statistics.valid_count` before trusting the aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingResult<T> {
    pub session_id: Uuid,
    pub runs: Vec<RunResult<T>>,
    pub valid_runs: Vec<RunResult<T>>,
    pub outlier_runs: Vec<RunResult<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregated: Option<T>,
    pub statistics: SamplingStatistics,
    pub confidence_interval: ConfidenceInterval,
    /// Distinct backend versions observed across all runs, outliers
    /// included - version drift matters even in discarded runs
    pub model_versions: Vec<String>,
}
