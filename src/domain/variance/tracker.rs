//! Longitudinal variance tracking
//!
//! Accumulates every observed score per entity and provider for the
//! lifetime of the process and recomputes reports on demand. Nothing is
//! ever evicted; callers bound growth externally.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::sampling::{coefficient_of_variation, mean, std_dev, SamplingResult};

/// Default overall standard deviation above which an entity is flagged,
/// in the units of the tracked score.
pub const DEFAULT_HIGH_VARIANCE_THRESHOLD: f64 = 15.0;

#[derive(Debug, Clone, Default)]
struct ProviderHistory {
    scores: Vec<f64>,
    model_versions: BTreeSet<String>,
}

/// Recomputed aggregate for one provider's scores of one entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderVariance {
    pub provider: String,
    /// Every score ever recorded for this provider, in arrival order
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std_dev: f64,
    pub coefficient_of_variation: f64,
    pub model_versions: Vec<String>,
}

/// Longitudinal report for one entity across every provider that scored it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VarianceReport {
    pub entity_id: String,
    pub providers: Vec<ProviderVariance>,
    /// Standard deviation across every score from every provider
    pub overall_std_dev: f64,
    pub is_high_variance: bool,
}

/// Per-entity, per-provider score accumulator.
///
/// Write methods take `&mut self`: one writer at a time, enforced by the
/// borrow checker. Sessions running concurrently against the same tracker
/// share it behind their own lock.
#[derive(Debug)]
pub struct VarianceTracker {
    entities: HashMap<String, HashMap<String, ProviderHistory>>,
    threshold: f64,
}

impl Default for VarianceTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VarianceTracker {
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_HIGH_VARIANCE_THRESHOLD)
    }

    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            entities: HashMap::new(),
            threshold,
        }
    }

    /// Record one observed score.
    pub fn track_run(&mut self, entity_id: &str, provider: &str, score: f64, model_version: &str) {
        let history = self
            .entities
            .entry(entity_id.to_string())
            .or_default()
            .entry(provider.to_string())
            .or_default();

        history.scores.push(score);
        history.model_versions.insert(model_version.to_string());

        debug!(entity_id, provider, score, model_version, "tracked run");
    }

    /// Record every valid run of a finished session in one call.
    pub fn track_session<T, S>(
        &mut self,
        entity_id: &str,
        provider: &str,
        result: &SamplingResult<T>,
        extract_score: S,
    ) where
        S: Fn(&T) -> f64,
    {
        for run in &result.valid_runs {
            self.track_run(
                entity_id,
                provider,
                extract_score(&run.result),
                &run.model_version,
            );
        }
    }

    /// Fresh report for one entity, recomputed from the recorded scores;
    /// `None` for an entity never tracked.
    pub fn variance_report(&self, entity_id: &str) -> Option<VarianceReport> {
        let providers = self.entities.get(entity_id)?;

        let mut all_scores = Vec::new();
        let mut provider_reports: Vec<ProviderVariance> = providers
            .iter()
            .map(|(name, history)| {
                all_scores.extend_from_slice(&history.scores);

                ProviderVariance {
                    provider: name.clone(),
                    scores: history.scores.clone(),
                    mean: mean(&history.scores),
                    std_dev: std_dev(&history.scores),
                    coefficient_of_variation: coefficient_of_variation(&history.scores),
                    model_versions: history.model_versions.iter().cloned().collect(),
                }
            })
            .collect();
        provider_reports.sort_by(|a, b| a.provider.cmp(&b.provider));

        let overall_std_dev = std_dev(&all_scores);

        Some(VarianceReport {
            entity_id: entity_id.to_string(),
            providers: provider_reports,
            overall_std_dev,
            is_high_variance: overall_std_dev > self.threshold,
        })
    }

    /// Fresh reports for every tracked entity.
    pub fn all_reports(&self) -> Vec<VarianceReport> {
        let mut reports: Vec<VarianceReport> = self
            .entities
            .keys()
            .filter_map(|entity_id| self.variance_report(entity_id))
            .collect();
        reports.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        reports
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sampling::{MultiRunSampler, SamplingConfig, ScriptedExecutor};

    #[test]
    fn test_unknown_entity_has_no_report() {
        let tracker = VarianceTracker::new();
        assert!(tracker.variance_report("brand-1").is_none());
    }

    #[test]
    fn test_wild_swings_are_flagged_as_high_variance() {
        let mut tracker = VarianceTracker::new();
        tracker.track_run("brand-1", "openai", 80.0, "v1");
        tracker.track_run("brand-1", "openai", 20.0, "v1");

        let report = tracker.variance_report("brand-1").unwrap();
        assert!(report.is_high_variance);
        assert!(report.overall_std_dev > DEFAULT_HIGH_VARIANCE_THRESHOLD);
    }

    #[test]
    fn test_stable_scores_are_not_flagged() {
        let mut tracker = VarianceTracker::new();
        tracker.track_run("brand-1", "openai", 80.0, "v1");
        tracker.track_run("brand-1", "openai", 81.0, "v1");
        tracker.track_run("brand-1", "openai", 79.0, "v1");

        let report = tracker.variance_report("brand-1").unwrap();
        assert!(!report.is_high_variance);
    }

    #[test]
    fn test_per_provider_aggregates() {
        let mut tracker = VarianceTracker::new();
        tracker.track_run("brand-1", "openai", 80.0, "v1");
        tracker.track_run("brand-1", "openai", 90.0, "v2");
        tracker.track_run("brand-1", "anthropic", 70.0, "v3");

        let report = tracker.variance_report("brand-1").unwrap();
        assert_eq!(report.providers.len(), 2);

        // providers come back sorted by name
        assert_eq!(report.providers[0].provider, "anthropic");
        assert_eq!(report.providers[1].provider, "openai");

        let openai = &report.providers[1];
        assert_eq!(openai.scores, vec![80.0, 90.0]);
        assert_eq!(openai.mean, 85.0);
        assert_eq!(
            openai.model_versions,
            vec!["v1".to_string(), "v2".to_string()]
        );
    }

    #[test]
    fn test_high_variance_spans_providers() {
        // each provider is individually stable; together they disagree
        let mut tracker = VarianceTracker::new();
        tracker.track_run("brand-1", "openai", 90.0, "v1");
        tracker.track_run("brand-1", "openai", 91.0, "v1");
        tracker.track_run("brand-1", "anthropic", 20.0, "v2");
        tracker.track_run("brand-1", "anthropic", 21.0, "v2");

        let report = tracker.variance_report("brand-1").unwrap();
        assert!(report.is_high_variance);
        for provider in &report.providers {
            assert!(provider.std_dev < 1.0);
        }
    }

    #[test]
    fn test_custom_threshold() {
        let mut tracker = VarianceTracker::with_threshold(100.0);
        tracker.track_run("brand-1", "openai", 80.0, "v1");
        tracker.track_run("brand-1", "openai", 20.0, "v1");

        let report = tracker.variance_report("brand-1").unwrap();
        assert!(!report.is_high_variance);
    }

    #[test]
    fn test_all_reports_covers_every_entity() {
        let mut tracker = VarianceTracker::new();
        tracker.track_run("brand-b", "openai", 50.0, "v1");
        tracker.track_run("brand-a", "openai", 60.0, "v1");

        let reports = tracker.all_reports();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].entity_id, "brand-a");
        assert_eq!(reports[1].entity_id, "brand-b");
    }

    #[test]
    fn test_reports_are_recomputed_fresh() {
        let mut tracker = VarianceTracker::new();
        tracker.track_run("brand-1", "openai", 80.0, "v1");

        let before = tracker.variance_report("brand-1").unwrap();
        assert!(!before.is_high_variance);

        tracker.track_run("brand-1", "openai", 20.0, "v1");

        let after = tracker.variance_report("brand-1").unwrap();
        assert!(after.is_high_variance);
    }

    #[tokio::test]
    async fn test_track_session_records_valid_runs() {
        let sampler = MultiRunSampler::new(SamplingConfig::default()).unwrap();
        let executor = ScriptedExecutor::constant(75.0);
        let result = sampler
            .execute(&executor, |score| *score, |scores| scores[0])
            .await;

        let mut tracker = VarianceTracker::new();
        tracker.track_session("brand-1", "openai", &result, |score| *score);

        let report = tracker.variance_report("brand-1").unwrap();
        assert_eq!(report.providers.len(), 1);
        assert_eq!(report.providers[0].scores.len(), 5);
        assert_eq!(report.providers[0].mean, 75.0);
        assert_eq!(report.providers[0].model_versions, vec!["v1".to_string()]);
    }
}
