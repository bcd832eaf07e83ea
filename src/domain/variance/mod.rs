//! Longitudinal variance tracking across sampling sessions

mod tracker;

pub use tracker::{
    ProviderVariance, VarianceReport, VarianceTracker, DEFAULT_HIGH_VARIANCE_THRESHOLD,
};
