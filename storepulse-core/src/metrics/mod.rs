//! The metric aggregation pipeline
//!
//! Every dashboard widget is an instance of the same four stages:
//!
//! ```text
//!   Presenter ──► Series Builder ──┐
//!       │                          ├──► Aggregator ──► DataStore
//!       └───────► Comparator ◄─────┘
//! ```
//!
//! - [`aggregator`] evaluates one [`MetricQuery`] and normalizes empty or
//!   non-finite results to `0`
//! - [`comparator`] turns two windowed values into a [`TrendResult`]
//! - [`series`] produces fixed-length, zero-filled buckets for charts
//! - [`presenter`] formats a value and trend into a [`PresentationCard`]
//!
//! Nothing here caches or holds state between calls. The render time is passed
//! in explicitly so one render never straddles a day or month boundary.

pub mod aggregator;
pub mod comparator;
pub mod presenter;
pub mod query;
pub mod series;
pub mod window;

pub use aggregator::aggregate;
pub use comparator::{compare, percent_change, Direction, TrendResult};
pub use presenter::{
    present, BandTrigger, ColorTier, FormatKind, Polarity, PresentSpec, PresentationCard,
    ThresholdBand, Thresholds, ICON_TREND_DOWN, ICON_TREND_FLAT, ICON_TREND_UP, ICON_WARNING,
};
pub use query::{
    Aggregation, Condition, FilterOp, FilterValue, MetricQuery, MetricValue, Predicate, TimeWindow,
};
pub use series::{bucket_windows, build_series, SeriesPoint, SeriesRequest};
pub use window::{BucketUnit, RelativeWindow};
