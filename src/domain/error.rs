use thiserror::Error;

/// Core sampling errors
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("Executor error: {message}")]
    Executor { message: String },

    #[error("Run {run_index} timed out after {timeout_ms}ms")]
    Timeout { run_index: usize, timeout_ms: u64 },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Aggregation error: {message}")]
    Aggregation { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SamplingError {
    pub fn executor(message: impl Into<String>) -> Self {
        Self::Executor {
            message: message.into(),
        }
    }

    pub fn timeout(run_index: usize, timeout_ms: u64) -> Self {
        Self::Timeout {
            run_index,
            timeout_ms,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn aggregation(message: impl Into<String>) -> Self {
        Self::Aggregation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executor_error() {
        let error = SamplingError::executor("provider returned 503");
        assert_eq!(error.to_string(), "Executor error: provider returned 503");
    }

    #[test]
    fn test_timeout_error() {
        let error = SamplingError::timeout(3, 30_000);
        assert_eq!(error.to_string(), "Run 3 timed out after 30000ms");
    }

    #[test]
    fn test_validation_error() {
        let error = SamplingError::validation("num_runs must be at least 1");
        assert_eq!(
            error.to_string(),
            "Validation error: num_runs must be at least 1"
        );
    }
}
