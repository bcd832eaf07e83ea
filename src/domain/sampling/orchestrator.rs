//! Multi-run sampling session orchestration

use futures::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

use super::config::SamplingConfig;
use super::confidence::confidence_interval;
use super::executor::{RunExecutor, SampleExecutor};
use super::outlier::detect_outliers;
use super::run::{RunResult, SamplingResult};
use super::statistics::calculate_statistics;
use crate::domain::error::SamplingError;

/// Drives N runs against the oracle and reduces them to one scored,
/// confidence-bounded result.
#[derive(Debug, Clone)]
pub struct MultiRunSampler {
    config: SamplingConfig,
}

impl MultiRunSampler {
    /// Create a sampler after validating the configuration.
    pub fn new(config: SamplingConfig) -> Result<Self, SamplingError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    /// Execute one sampling session.
    ///
    /// `extract_score` pulls the comparable number out of a structured
    /// result and `aggregate` reduces the surviving results to one; both
    /// are trusted caller code and a panic in either propagates. The
    /// session itself never fails: a run that exhausts its retries is
    /// dropped and logged without disturbing its siblings, and a session
    /// where every run dropped comes back with empty runs, all-zero
    /// statistics and no aggregate.
    pub async fn execute<E, S, A>(
        &self,
        executor: &E,
        extract_score: S,
        aggregate: A,
    ) -> SamplingResult<E::Output>
    where
        E: SampleExecutor,
        S: Fn(&E::Output) -> f64,
        A: Fn(&[E::Output]) -> E::Output,
    {
        let session_id = Uuid::new_v4();
        let run_executor = RunExecutor::new(&self.config);

        let outcomes = if self.config.parallel_runs {
            join_all((0..self.config.num_runs).map(|i| run_executor.execute_run(i, executor)))
                .await
        } else {
            let mut outcomes = Vec::with_capacity(self.config.num_runs);
            for i in 0..self.config.num_runs {
                outcomes.push(run_executor.execute_run(i, executor).await);
            }
            outcomes
        };

        let mut runs: Vec<RunResult<E::Output>> = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            match outcome {
                Ok(run) => runs.push(run),
                Err(e) => {
                    warn!(%session_id, error = %e, "run dropped after exhausting retries");
                }
            }
        }

        let scores: Vec<f64> = runs.iter().map(|run| extract_score(&run.result)).collect();
        let flagged = detect_outliers(
            &scores,
            self.config.outlier_method,
            self.config.iqr_multiplier,
            self.config.zscore_threshold,
        );

        for (index, methods) in &flagged {
            let reason = methods
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            runs[*index].mark_outlier(reason);
        }

        let valid_runs: Vec<RunResult<E::Output>> =
            runs.iter().filter(|run| !run.is_outlier).cloned().collect();
        let outlier_runs: Vec<RunResult<E::Output>> =
            runs.iter().filter(|run| run.is_outlier).cloned().collect();

        let valid_scores: Vec<f64> = valid_runs
            .iter()
            .map(|run| extract_score(&run.result))
            .collect();
        let statistics = calculate_statistics(&valid_scores, outlier_runs.len());
        let interval = confidence_interval(&valid_scores, self.config.confidence_level);

        let valid_results: Vec<E::Output> =
            valid_runs.iter().map(|run| run.result.clone()).collect();
        let aggregated = if valid_results.is_empty() {
            // every surviving run was flagged; fall back to the first raw
            // run rather than aggregating an empty set. No runs at all
            // stays None - that failure belongs to the caller.
            runs.first().map(|run| run.result.clone())
        } else {
            Some(aggregate(&valid_results))
        };

        let mut model_versions: Vec<String> = Vec::new();
        for run in &runs {
            if !model_versions.contains(&run.model_version) {
                model_versions.push(run.model_version.clone());
            }
        }

        info!(
            %session_id,
            requested = self.config.num_runs,
            completed = runs.len(),
            valid = valid_runs.len(),
            outliers = outlier_runs.len(),
            "sampling session complete"
        );

        SamplingResult {
            session_id,
            runs,
            valid_runs,
            outlier_runs,
            aggregated,
            statistics,
            confidence_interval: interval,
            model_versions,
        }
    }
}
