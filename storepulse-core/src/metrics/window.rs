//! Calendar arithmetic: bucket units and relative windows.
//!
//! All boundaries are computed in UTC from a `now` captured once per render.

use crate::error::{Error, Result};
use crate::metrics::query::TimeWindow;
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn out_of_range(what: &str) -> Error {
    Error::invalid(format!("{} is out of the supported date range", what))
}

/// Width of one time-series bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketUnit {
    Day,
    /// ISO week, starting Monday
    Week,
    Month,
}

impl BucketUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            BucketUnit::Day => "day",
            BucketUnit::Week => "week",
            BucketUnit::Month => "month",
        }
    }

    /// Start of the bucket containing `ts`.
    pub fn truncate(&self, ts: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let date = ts.date_naive();
        match self {
            BucketUnit::Day => Ok(midnight(date)),
            BucketUnit::Week => {
                let back = date.weekday().num_days_from_monday() as i64;
                Ok(midnight(date - Duration::days(back)))
            }
            BucketUnit::Month => date
                .with_day(1)
                .map(midnight)
                .ok_or_else(|| out_of_range("month start")),
        }
    }

    /// Move a bucket start `n` buckets forward (`n > 0`) or back (`n < 0`).
    pub fn shift(&self, start: DateTime<Utc>, n: i64) -> Result<DateTime<Utc>> {
        let shifted = match self {
            BucketUnit::Day => Duration::try_days(n).and_then(|d| start.checked_add_signed(d)),
            BucketUnit::Week => Duration::try_weeks(n).and_then(|d| start.checked_add_signed(d)),
            BucketUnit::Month => {
                let months = u32::try_from(n.unsigned_abs())
                    .map(Months::new)
                    .map_err(|_| out_of_range("bucket boundary"))?;
                if n >= 0 {
                    start.checked_add_months(months)
                } else {
                    start.checked_sub_months(months)
                }
            }
        };
        shifted.ok_or_else(|| out_of_range("bucket boundary"))
    }

    /// Window covering the bucket that starts at `start`.
    pub fn bucket(&self, start: DateTime<Utc>) -> Result<TimeWindow> {
        TimeWindow::new(start, self.shift(start, 1)?)
    }

    /// Chart label for the bucket starting at `start`.
    pub fn label(&self, start: DateTime<Utc>) -> String {
        match self {
            BucketUnit::Day => start.format("%Y-%m-%d").to_string(),
            BucketUnit::Week => start.format("%G-W%V").to_string(),
            BucketUnit::Month => start.format("%Y-%m").to_string(),
        }
    }
}

impl std::str::FromStr for BucketUnit {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "day" | "daily" => Ok(BucketUnit::Day),
            "week" | "weekly" => Ok(BucketUnit::Week),
            "month" | "monthly" => Ok(BucketUnit::Month),
            _ => Err(format!("unknown bucket unit: {}", s)),
        }
    }
}

/// A window expressed relative to `now`, with a matching previous period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeWindow {
    Today,
    /// The `n` days ending at `now`
    LastDays(u32),
    ThisWeek,
    ThisMonth,
    ThisYear,
    AllTime,
}

impl RelativeWindow {
    /// The current window, `None` for all time.
    pub fn resolve(&self, now: DateTime<Utc>) -> Result<Option<TimeWindow>> {
        match self {
            RelativeWindow::Today => BucketUnit::Day.bucket(BucketUnit::Day.truncate(now)?).map(Some),
            RelativeWindow::LastDays(days) => {
                if *days == 0 {
                    return Err(Error::invalid("a trailing window needs at least one day"));
                }
                let start = now
                    .checked_sub_signed(Duration::days(*days as i64))
                    .ok_or_else(|| out_of_range("trailing window start"))?;
                TimeWindow::new(start, now).map(Some)
            }
            RelativeWindow::ThisWeek => {
                BucketUnit::Week.bucket(BucketUnit::Week.truncate(now)?).map(Some)
            }
            RelativeWindow::ThisMonth => {
                BucketUnit::Month.bucket(BucketUnit::Month.truncate(now)?).map(Some)
            }
            RelativeWindow::ThisYear => {
                let start = NaiveDate::from_ymd_opt(now.year(), 1, 1)
                    .map(midnight)
                    .ok_or_else(|| out_of_range("year start"))?;
                let end = NaiveDate::from_ymd_opt(now.year() + 1, 1, 1)
                    .map(midnight)
                    .ok_or_else(|| out_of_range("year end"))?;
                TimeWindow::new(start, end).map(Some)
            }
            RelativeWindow::AllTime => Ok(None),
        }
    }

    /// The period immediately before the current one, `None` for all time.
    pub fn previous(&self, now: DateTime<Utc>) -> Result<Option<TimeWindow>> {
        let Some(current) = self.resolve(now)? else {
            return Ok(None);
        };
        let start = match self {
            RelativeWindow::Today => BucketUnit::Day.shift(current.start, -1)?,
            RelativeWindow::LastDays(days) => current
                .start
                .checked_sub_signed(Duration::days(*days as i64))
                .ok_or_else(|| out_of_range("previous window start"))?,
            RelativeWindow::ThisWeek => BucketUnit::Week.shift(current.start, -1)?,
            RelativeWindow::ThisMonth => BucketUnit::Month.shift(current.start, -1)?,
            RelativeWindow::ThisYear => BucketUnit::Month.shift(current.start, -12)?,
            RelativeWindow::AllTime => return Ok(None),
        };
        TimeWindow::new(start, current.start).map(Some)
    }

    /// Phrase appended to a trend delta (e.g. "+12% from last month").
    pub fn comparison_phrase(&self) -> String {
        match self {
            RelativeWindow::Today => "from yesterday".to_string(),
            RelativeWindow::LastDays(days) => format!("from previous {} days", days),
            RelativeWindow::ThisWeek => "from last week".to_string(),
            RelativeWindow::ThisMonth => "from last month".to_string(),
            RelativeWindow::ThisYear => "from last year".to_string(),
            RelativeWindow::AllTime => "overall".to_string(),
        }
    }

    /// Short human label (e.g. "this month").
    pub fn display_name(&self) -> String {
        match self {
            RelativeWindow::Today => "today".to_string(),
            RelativeWindow::LastDays(days) => format!("last {} days", days),
            RelativeWindow::ThisWeek => "this week".to_string(),
            RelativeWindow::ThisMonth => "this month".to_string(),
            RelativeWindow::ThisYear => "this year".to_string(),
            RelativeWindow::AllTime => "all time".to_string(),
        }
    }
}
