//! Sampling session configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::outlier::{DEFAULT_IQR_MULTIPLIER, DEFAULT_ZSCORE_THRESHOLD};
use crate::domain::error::SamplingError;

/// Outlier detection method for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Tukey fences on the interquartile range
    Iqr,
    /// Deviation from the mean in standard deviations
    ZScore,
    /// Union of both methods
    #[default]
    Combined,
}

/// Retry configuration for a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first try
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_delay_ms: u64,
    /// Cap on the backoff delay
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Default::default()
        }
    }

    pub fn with_initial_delay(mut self, ms: u64) -> Self {
        self.initial_delay_ms = ms;
        self
    }

    pub fn with_max_delay(mut self, ms: u64) -> Self {
        self.max_delay_ms = ms;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Backoff delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(self.initial_delay_ms);
        }

        let delay = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let delay_ms = delay.min(self.max_delay_ms as f64) as u64;

        Duration::from_millis(delay_ms)
    }
}

/// Immutable configuration for one sampling session.
///
/// Sessions with fewer than 4 runs are legal; the outlier detectors degrade
/// to flagging nothing at that sample size rather than erroring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Number of runs to execute
    pub num_runs: usize,
    /// Outlier detection method
    pub outlier_method: OutlierMethod,
    /// Confidence level for the interval estimate
    pub confidence_level: f64,
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Launch all runs concurrently instead of one after another
    pub parallel_runs: bool,
    /// Retry behavior per run
    pub retry: RetryPolicy,
    /// Tukey fence multiplier for the IQR detector
    pub iqr_multiplier: f64,
    /// Threshold for the Z-score detector
    pub zscore_threshold: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            num_runs: 5,
            outlier_method: OutlierMethod::Combined,
            confidence_level: 0.95,
            timeout_ms: 30_000,
            parallel_runs: true,
            retry: RetryPolicy::default(),
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            zscore_threshold: DEFAULT_ZSCORE_THRESHOLD,
        }
    }
}

impl SamplingConfig {
    pub fn with_num_runs(mut self, num_runs: usize) -> Self {
        self.num_runs = num_runs;
        self
    }

    pub fn with_outlier_method(mut self, method: OutlierMethod) -> Self {
        self.outlier_method = method;
        self
    }

    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    pub fn with_parallel_runs(mut self, parallel: bool) -> Self {
        self.parallel_runs = parallel;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    pub fn with_iqr_multiplier(mut self, multiplier: f64) -> Self {
        self.iqr_multiplier = multiplier;
        self
    }

    pub fn with_zscore_threshold(mut self, threshold: f64) -> Self {
        self.zscore_threshold = threshold;
        self
    }

    /// Per-attempt timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Check the session invariants.
    pub fn validate(&self) -> Result<(), SamplingError> {
        if self.num_runs < 1 {
            return Err(SamplingError::validation("num_runs must be at least 1"));
        }

        if self.confidence_level <= 0.0 || self.confidence_level >= 1.0 {
            return Err(SamplingError::validation(
                "confidence_level must be between 0 and 1 exclusive",
            ));
        }

        if self.timeout_ms == 0 {
            return Err(SamplingError::validation("timeout_ms must be greater than 0"));
        }

        Ok(())
    }
}
