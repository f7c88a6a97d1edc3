//! Series builder: fixed-length, zero-filled time buckets for charts.

use crate::db::DataStore;
use crate::error::{Error, Result};
use crate::metrics::aggregator::aggregate;
use crate::metrics::query::{Aggregation, MetricQuery, Predicate, TimeWindow};
use crate::metrics::window::BucketUnit;
use crate::types::Entity;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One chart point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub bucket_label: String,
    pub value: f64,
}

/// What to chart and how to bucket it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesRequest {
    pub entity: Entity,
    pub aggregation: Aggregation,
    pub predicate: Option<Predicate>,
    pub unit: BucketUnit,
    /// Number of buckets, the last one containing `now`
    pub lookback: usize,
}

impl SeriesRequest {
    pub fn new(entity: Entity, aggregation: Aggregation, unit: BucketUnit, lookback: usize) -> Self {
        Self {
            entity,
            aggregation,
            predicate: None,
            unit,
            lookback,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    fn query(&self, window: TimeWindow) -> MetricQuery {
        MetricQuery {
            entity: self.entity,
            predicate: self.predicate.clone(),
            aggregation: self.aggregation.clone(),
            window: Some(window),
        }
    }
}

/// The `lookback` bucket windows ending with the bucket that contains `now`,
/// oldest first.
pub fn bucket_windows(
    unit: BucketUnit,
    lookback: usize,
    now: DateTime<Utc>,
) -> Result<Vec<TimeWindow>> {
    if lookback == 0 {
        return Err(Error::invalid("series lookback must be at least one bucket"));
    }
    let count = i64::try_from(lookback)
        .map_err(|_| Error::invalid(format!("series lookback {} is too large", lookback)))?;
    let current = unit.truncate(now)?;
    let first = unit.shift(current, -(count - 1))?;

    (0..count)
        .map(|i| unit.shift(first, i).and_then(|start| unit.bucket(start)))
        .collect()
}

/// Build the series, one aggregate per bucket.
///
/// Always returns exactly `lookback` points in ascending order; buckets with
/// no rows report `0`. Fails as a whole on the first store error.
pub fn build_series(
    store: &dyn DataStore,
    request: &SeriesRequest,
    now: DateTime<Utc>,
) -> Result<Vec<SeriesPoint>> {
    let windows = bucket_windows(request.unit, request.lookback, now)?;
    // validate once up front so a bad field does not surface mid-series
    let first = windows
        .first()
        .copied()
        .ok_or_else(|| Error::invalid("series has no buckets"))?;
    request.query(first).validate()?;

    let points = windows
        .into_iter()
        .map(|window| {
            let value = aggregate(store, &request.query(window))?;
            Ok(SeriesPoint {
                bucket_label: request.unit.label(window.start),
                value: value.value,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        entity = %request.entity,
        aggregation = %request.aggregation,
        unit = request.unit.as_str(),
        buckets = points.len(),
        "Built series"
    );

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    struct EmptyStore;

    impl DataStore for EmptyStore {
        fn evaluate(&self, _query: &MetricQuery) -> Result<Option<f64>> {
            Ok(None)
        }
    }

    /// Reports the bucket's day-of-month as its value.
    struct DayOfMonthStore;

    impl DataStore for DayOfMonthStore {
        fn evaluate(&self, query: &MetricQuery) -> Result<Option<f64>> {
            use chrono::Datelike;
            Ok(query.window.map(|w| w.start.day() as f64))
        }
    }

    struct OfflineStore;

    impl DataStore for OfflineStore {
        fn evaluate(&self, _query: &MetricQuery) -> Result<Option<f64>> {
            Err(Error::DataUnavailable("connection refused".to_string()))
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 14, 15, 45, 0).unwrap()
    }

    #[test]
    fn test_seven_empty_days_end_today() {
        let request = SeriesRequest::new(Entity::Orders, Aggregation::Count, BucketUnit::Day, 7);
        let points = build_series(&EmptyStore, &request, now()).unwrap();

        assert_eq!(points.len(), 7);
        assert!(points.iter().all(|p| p.value == 0.0));
        let labels: Vec<_> = points.iter().map(|p| p.bucket_label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "2024-03-08",
                "2024-03-09",
                "2024-03-10",
                "2024-03-11",
                "2024-03-12",
                "2024-03-13",
                "2024-03-14"
            ]
        );
    }

    #[test]
    fn test_points_are_chronological() {
        let request = SeriesRequest::new(
            Entity::Orders,
            Aggregation::sum("total"),
            BucketUnit::Day,
            5,
        );
        let points = build_series(&DayOfMonthStore, &request, now()).unwrap();
        let values: Vec<_> = points.iter().map(|p| p.value).collect();
        assert_eq!(values, vec![10.0, 11.0, 12.0, 13.0, 14.0]);
    }

    #[test]
    fn test_windows_are_contiguous() {
        for unit in [BucketUnit::Day, BucketUnit::Week, BucketUnit::Month] {
            let windows = bucket_windows(unit, 13, now()).unwrap();
            assert_eq!(windows.len(), 13);
            for pair in windows.windows(2) {
                assert_eq!(pair[0].end, pair[1].start);
            }
            let last = windows.last().unwrap();
            assert!(last.contains(now()));
        }
    }

    #[test]
    fn test_monthly_labels_cross_year() {
        let now = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();
        let request = SeriesRequest::new(Entity::Orders, Aggregation::Count, BucketUnit::Month, 4);
        let labels: Vec<_> = build_series(&EmptyStore, &request, now)
            .unwrap()
            .into_iter()
            .map(|p| p.bucket_label)
            .collect();
        assert_eq!(labels, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);
    }

    #[test]
    fn test_weekly_buckets_start_monday() {
        let windows = bucket_windows(BucketUnit::Week, 2, now()).unwrap();
        assert_eq!(windows[1].start, Utc.with_ymd_and_hms(2024, 3, 11, 0, 0, 0).unwrap());
        assert_eq!(windows[0].start, windows[1].start - Duration::weeks(1));
    }

    #[test]
    fn test_zero_lookback_rejected() {
        let request = SeriesRequest::new(Entity::Orders, Aggregation::Count, BucketUnit::Day, 0);
        let err = build_series(&EmptyStore, &request, now()).unwrap_err();
        assert!(matches!(err, Error::InvalidMetric(_)));
    }

    #[test]
    fn test_oversized_lookback_rejected() {
        let err = bucket_windows(BucketUnit::Day, usize::MAX, now()).unwrap_err();
        assert!(matches!(err, Error::InvalidMetric(_)));

        let request =
            SeriesRequest::new(Entity::Orders, Aggregation::Count, BucketUnit::Day, usize::MAX);
        let err = build_series(&EmptyStore, &request, now()).unwrap_err();
        assert!(matches!(err, Error::InvalidMetric(_)));
    }

    #[test]
    fn test_lookback_past_calendar_range_rejected() {
        // fits in i64 but reaches back before the earliest representable date
        for unit in [BucketUnit::Day, BucketUnit::Week, BucketUnit::Month] {
            let err = bucket_windows(unit, i64::MAX as usize, now()).unwrap_err();
            assert!(matches!(err, Error::InvalidMetric(_)), "{:?}", unit);
        }
    }

    #[test]
    fn test_store_failure_propagates() {
        let request = SeriesRequest::new(Entity::Orders, Aggregation::Count, BucketUnit::Day, 3);
        let err = build_series(&OfflineStore, &request, now()).unwrap_err();
        assert!(err.is_data_unavailable());
    }

    #[test]
    fn test_idempotent() {
        let request = SeriesRequest::new(Entity::Orders, Aggregation::Count, BucketUnit::Week, 6);
        let first = build_series(&DayOfMonthStore, &request, now()).unwrap();
        let second = build_series(&DayOfMonthStore, &request, now()).unwrap();
        assert_eq!(first, second);
    }
}
