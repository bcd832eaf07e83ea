//! Run execution against the oracle
//!
//! Each attempt races the executor against the per-attempt timeout; failed
//! attempts back off exponentially before retrying. A timed-out attempt is
//! indistinguishable from any other executor failure as far as the retry
//! loop is concerned.

use std::future::Future;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::config::{RetryPolicy, SamplingConfig};
use super::run::{RunResult, Sample};
use crate::domain::error::SamplingError;

/// The oracle seam: one asynchronous attempt at obtaining a sample.
///
/// Implementations may fail or hang; timeout and retry are owned by the
/// run executor. Attempts must be safe to repeat - a run may invoke this
/// up to `max_retries + 1` times.
#[async_trait]
pub trait SampleExecutor: Send + Sync {
    /// The structured result produced per sample
    type Output: Clone + Send + Sync + 'static;

    async fn execute(&self) -> Result<Sample<Self::Output>, SamplingError>;
}

/// Adapter so a plain async closure can serve as the executor.
pub struct FnExecutor<F> {
    inner: F,
}

impl<F> FnExecutor<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<F, Fut, T> SampleExecutor for FnExecutor<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Sample<T>, SamplingError>> + Send + 'static,
    T: Clone + Send + Sync + 'static,
{
    type Output = T;

    async fn execute(&self) -> Result<Sample<T>, SamplingError> {
        (self.inner)().await
    }
}

/// Executes one run: a timeout race per attempt plus exponential backoff
/// between failed attempts.
#[derive(Debug, Clone)]
pub struct RunExecutor {
    retry: RetryPolicy,
    timeout_ms: u64,
}

impl RunExecutor {
    pub fn new(config: &SamplingConfig) -> Self {
        Self {
            retry: config.retry.clone(),
            timeout_ms: config.timeout_ms,
        }
    }

    /// Drive one run to success or retry exhaustion.
    ///
    /// On success the raw sample is wrapped with the run index, measured
    /// latency, version tag and timestamp. On exhaustion the last error
    /// (executor failure or timeout) is propagated to the caller.
    pub async fn execute_run<E>(
        &self,
        run_index: usize,
        executor: &E,
    ) -> Result<RunResult<E::Output>, SamplingError>
    where
        E: SampleExecutor + ?Sized,
    {
        let mut last_error = None;

        for attempt in 0..=self.retry.max_retries {
            if attempt > 0 {
                let delay = self.retry.delay_for_attempt(attempt - 1);
                debug!(
                    run_index,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "backing off before retry"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            let outcome = match timeout(Duration::from_millis(self.timeout_ms), executor.execute())
                .await
            {
                Ok(result) => result,
                Err(_) => Err(SamplingError::timeout(run_index, self.timeout_ms)),
            };

            match outcome {
                Ok(sample) => {
                    return Ok(RunResult {
                        run_index,
                        result: sample.result,
                        latency_ms: start.elapsed().as_millis() as u64,
                        model_version: sample.model_version,
                        timestamp: Utc::now(),
                        is_outlier: false,
                        outlier_reason: None,
                    });
                }
                Err(e) => {
                    warn!(run_index, attempt, error = %e, "sample attempt failed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| SamplingError::internal("run failed without a recorded error")))
    }
}

#[cfg(test)]
pub mod mock {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// One scripted outcome for the mock executor.
    #[derive(Debug, Clone)]
    pub enum ScriptStep {
        /// Succeed with this score, version "v1"
        Score(f64),
        /// Succeed with this score and version tag
        ScoreWithVersion(f64, &'static str),
        /// Fail with an executor error
        Fail(&'static str),
        /// Sleep for the duration, then fail - exercises the timeout race
        Hang(Duration),
    }

    /// Mock executor driven by a step script, one step per call; the last
    /// step repeats once the script is exhausted. Calls are counted so
    /// tests can assert attempt totals.
    #[derive(Debug)]
    pub struct ScriptedExecutor {
        script: Vec<ScriptStep>,
        calls: AtomicUsize,
    }

    impl ScriptedExecutor {
        pub fn new(script: Vec<ScriptStep>) -> Self {
            Self {
                script,
                calls: AtomicUsize::new(0),
            }
        }

        /// Always succeed with the same score.
        pub fn constant(score: f64) -> Self {
            Self::new(vec![ScriptStep::Score(score)])
        }

        /// Always fail.
        pub fn always_failing(message: &'static str) -> Self {
            Self::new(vec![ScriptStep::Fail(message)])
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SampleExecutor for ScriptedExecutor {
        type Output = f64;

        async fn execute(&self) -> Result<Sample<f64>, SamplingError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);

            let step = self.script.get(call).or_else(|| self.script.last()).cloned();

            match step {
                Some(ScriptStep::Score(score)) => Ok(Sample::new(score, "v1")),
                Some(ScriptStep::ScoreWithVersion(score, version)) => {
                    Ok(Sample::new(score, version))
                }
                Some(ScriptStep::Fail(message)) => Err(SamplingError::executor(message)),
                Some(ScriptStep::Hang(duration)) => {
                    tokio::time::sleep(duration).await;
                    Err(SamplingError::executor("hung executor woke up"))
                }
                None => Err(SamplingError::executor("empty script")),
            }
        }
    }
}
