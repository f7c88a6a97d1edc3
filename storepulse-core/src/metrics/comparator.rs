//! Comparator: period-over-period percent change.

use crate::error::{Error, Result};
use crate::metrics::query::MetricValue;
use serde::Serialize;

/// Direction of a trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    /// Sign of a percent change.
    pub fn from_change(percent_change: f64) -> Self {
        if percent_change > 0.0 {
            Direction::Up
        } else if percent_change < 0.0 {
            Direction::Down
        } else {
            Direction::Flat
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Flat => "flat",
        }
    }
}

/// Comparison of a current value against the previous period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendResult {
    pub current: MetricValue,
    pub previous: MetricValue,
    pub percent_change: f64,
    pub direction: Direction,
}

/// Percent change from `previous` to `current`.
///
/// A zero baseline yields `0` when the current value is also zero and `100`
/// otherwise, so no caller ever sees `NaN` or infinity.
pub fn percent_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        if current == 0.0 {
            0.0
        } else {
            100.0
        }
    } else {
        ((current - previous) / previous) * 100.0
    }
}

/// Compare two windowed values.
///
/// Both values must carry the window they were computed over; comparing
/// all-time totals is a caller error.
pub fn compare(current: &MetricValue, previous: &MetricValue) -> Result<TrendResult> {
    if current.window.is_none() || previous.window.is_none() {
        return Err(Error::invalid(
            "comparison needs both the current and previous window",
        ));
    }
    if !current.value.is_finite() || !previous.value.is_finite() {
        return Err(Error::invalid("comparison values must be finite"));
    }

    let percent_change = percent_change(current.value, previous.value);
    Ok(TrendResult {
        current: *current,
        previous: *previous,
        percent_change,
        direction: Direction::from_change(percent_change),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::query::TimeWindow;
    use chrono::{Duration, TimeZone, Utc};

    fn windowed(value: f64, months_ago: i64) -> MetricValue {
        let end = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap() - Duration::days(30 * months_ago);
        let window = TimeWindow::new(end - Duration::days(30), end).unwrap();
        MetricValue::new(value, Some(window))
    }

    fn trend(current: f64, previous: f64) -> TrendResult {
        compare(&windowed(current, 0), &windowed(previous, 1)).unwrap()
    }

    #[test]
    fn test_growth() {
        let t = trend(120.0, 100.0);
        assert_eq!(t.percent_change, 20.0);
        assert_eq!(t.direction, Direction::Up);
    }

    #[test]
    fn test_decline() {
        let t = trend(80.0, 100.0);
        assert_eq!(t.percent_change, -20.0);
        assert_eq!(t.direction, Direction::Down);
    }

    #[test]
    fn test_zero_baseline() {
        let t = trend(0.0, 0.0);
        assert_eq!(t.percent_change, 0.0);
        assert_eq!(t.direction, Direction::Flat);

        let t = trend(50.0, 0.0);
        assert_eq!(t.percent_change, 100.0);
        assert_eq!(t.direction, Direction::Up);
    }

    #[test]
    fn test_percent_change_formula() {
        assert_eq!(percent_change(123.0, 100.0), 23.0);
        assert_eq!(percent_change(100.0, 0.0), 100.0);
        assert_eq!(percent_change(0.0, 0.0), 0.0);
        assert_eq!(percent_change(0.0, 40.0), -100.0);
    }

    #[test]
    fn test_direction_matches_sign() {
        for (current, previous) in [(1.0, 2.0), (2.0, 1.0), (5.0, 5.0), (0.0, 3.0), (3.0, 0.0)] {
            let t = trend(current, previous);
            let expected = if t.percent_change > 0.0 {
                Direction::Up
            } else if t.percent_change < 0.0 {
                Direction::Down
            } else {
                Direction::Flat
            };
            assert_eq!(t.direction, expected, "{} vs {}", current, previous);
        }
    }

    #[test]
    fn test_missing_window_rejected() {
        let all_time = MetricValue::new(10.0, None);
        let err = compare(&all_time, &windowed(5.0, 1)).unwrap_err();
        assert!(matches!(err, Error::InvalidMetric(_)));
        assert!(compare(&windowed(5.0, 0), &all_time).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(compare(&windowed(f64::NAN, 0), &windowed(1.0, 1)).is_err());
    }
}
