//! Stock aggregation strategies
//!
//! Reducers over results that already survived outlier rejection. The
//! orchestrator accepts any `Fn(&[T]) -> T`; these are the reducers callers
//! reach for when the sampled unit is a plain score or a JSON object with
//! named numeric fields.

use serde_json::Value;

use super::statistics::{mean, median};
use crate::domain::error::SamplingError;

/// Default fraction trimmed from each end by [`aggregate_by_trimmed_mean`].
pub const DEFAULT_TRIM_PERCENT: f64 = 0.10;

/// Median of plain scores.
pub fn aggregate_by_median(scores: &[f64]) -> f64 {
    median(scores)
}

/// Arithmetic mean of plain scores.
pub fn aggregate_by_mean(scores: &[f64]) -> f64 {
    mean(scores)
}

/// Mean after discarding the lowest and highest `trim_percent` of values
/// from each end.
///
/// Fewer than 3 values fall back to the plain mean - trimming below that
/// size would discard everything. The trim count floors, so small series
/// may trim nothing at all.
pub fn aggregate_by_trimmed_mean(scores: &[f64], trim_percent: f64) -> f64 {
    if scores.len() < 3 {
        return mean(scores);
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);

    let trim = (sorted.len() as f64 * trim_percent).floor() as usize;
    if trim * 2 >= sorted.len() {
        return mean(&sorted);
    }

    mean(&sorted[trim..sorted.len() - trim])
}

/// Field-wise reducer for structured results: a copy of the first result
/// with each named field replaced by the median of that field across all
/// results.
///
/// Per-result values that are absent or non-numeric are skipped for that
/// field; fields not named stay verbatim from the first result. Zero
/// results is an error; a single result is returned unchanged.
pub fn aggregate_numeric_fields(results: &[Value], fields: &[&str]) -> Result<Value, SamplingError> {
    let first = results
        .first()
        .ok_or_else(|| SamplingError::aggregation("cannot aggregate zero results"))?;

    if results.len() == 1 {
        return Ok(first.clone());
    }

    let mut aggregated = first.clone();

    if let Some(object) = aggregated.as_object_mut() {
        for field in fields {
            let series: Vec<f64> = results
                .iter()
                .filter_map(|result| result.get(*field).and_then(Value::as_f64))
                .collect();

            if series.is_empty() {
                continue;
            }

            object.insert((*field).to_string(), Value::from(median(&series)));
        }
    }

    Ok(aggregated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_aggregate_by_median() {
        assert_eq!(aggregate_by_median(&[70.0, 72.0, 71.0]), 71.0);
    }

    #[test]
    fn test_aggregate_by_mean() {
        assert_close(aggregate_by_mean(&[70.0, 72.0, 71.0, 69.0]), 70.5);
    }

    #[test]
    fn test_trimmed_mean_short_series_falls_back_to_mean() {
        assert_close(
            aggregate_by_trimmed_mean(&[1.0, 2.0], DEFAULT_TRIM_PERCENT),
            1.5,
        );
    }

    #[test]
    fn test_trimmed_mean_five_elements_trims_nothing_at_default_percent() {
        // floor(5 * 0.10) = 0, so this equals the plain mean
        let values = [1.0, 2.0, 3.0, 4.0, 100.0];
        assert_close(
            aggregate_by_trimmed_mean(&values, DEFAULT_TRIM_PERCENT),
            aggregate_by_mean(&values),
        );
    }

    #[test]
    fn test_trimmed_mean_ten_elements_trims_one_from_each_end() {
        let values = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 100.0];
        // 0 and 100 are discarded; mean of 1..=8 is 4.5
        assert_close(aggregate_by_trimmed_mean(&values, DEFAULT_TRIM_PERCENT), 4.5);
    }

    #[test]
    fn test_trimmed_mean_excessive_percent_keeps_the_series() {
        assert_close(aggregate_by_trimmed_mean(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
    }

    #[test]
    fn test_fields_zero_results_is_an_error() {
        let result = aggregate_numeric_fields(&[], &["score"]);
        assert!(matches!(result, Err(SamplingError::Aggregation { .. })));
    }

    #[test]
    fn test_fields_single_result_is_returned_unchanged() {
        let only = json!({"score": 81.0, "sentiment": "positive"});
        let aggregated = aggregate_numeric_fields(std::slice::from_ref(&only), &["score"]).unwrap();
        assert_eq!(aggregated, only);
    }

    #[test]
    fn test_fields_are_replaced_by_their_median() {
        let results = vec![
            json!({"score": 80.0, "rank": 3.0, "sentiment": "positive"}),
            json!({"score": 90.0, "rank": 1.0, "sentiment": "neutral"}),
            json!({"score": 70.0, "rank": 2.0, "sentiment": "negative"}),
        ];

        let aggregated = aggregate_numeric_fields(&results, &["score", "rank"]).unwrap();

        assert_eq!(aggregated["score"], json!(80.0));
        assert_eq!(aggregated["rank"], json!(2.0));
        // non-listed fields come verbatim from the first result
        assert_eq!(aggregated["sentiment"], json!("positive"));
    }

    #[test]
    fn test_fields_skip_non_numeric_values() {
        let results = vec![
            json!({"score": 80.0}),
            json!({"score": "n/a"}),
            json!({"score": 90.0}),
        ];

        let aggregated = aggregate_numeric_fields(&results, &["score"]).unwrap();
        assert_eq!(aggregated["score"], json!(85.0));
    }
}
