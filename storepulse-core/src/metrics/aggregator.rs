//! Aggregator: one read-only query, normalized to a finite number.

use crate::db::DataStore;
use crate::error::{Error, Result};
use crate::metrics::query::{MetricQuery, MetricValue};

/// Evaluate `query` against the store.
///
/// Empty result sets and non-finite reductions come back as `0`. Store failures
/// surface as [`Error::DataUnavailable`]; malformed queries as
/// [`Error::InvalidMetric`] without touching the store.
pub fn aggregate(store: &dyn DataStore, query: &MetricQuery) -> Result<MetricValue> {
    query.validate()?;

    let raw = store.evaluate(query).map_err(|e| match e {
        Error::InvalidMetric(_) | Error::DataUnavailable(_) => e,
        other => Error::DataUnavailable(other.to_string()),
    })?;

    let value = match raw {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    };

    tracing::debug!(
        entity = %query.entity,
        aggregation = %query.aggregation,
        windowed = query.window.is_some(),
        value,
        "Aggregated metric"
    );

    Ok(MetricValue::new(value, query.window))
}
