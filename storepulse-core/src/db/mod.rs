//! Database layer for storepulse
//!
//! This module provides the storage layer using SQLite with:
//! - Schema migrations
//! - Repository pattern for inserts and updates
//! - The [`DataStore`] seam the metric pipeline reads through

pub mod repo;
pub mod schema;

pub use repo::Database;

use crate::error::Result;
use crate::metrics::MetricQuery;

/// Read-only source of aggregate values.
///
/// Implementations evaluate an already validated [`MetricQuery`] and return
/// the raw reduction: `None` when the store has nothing to reduce (e.g. `SUM`
/// over zero rows). Connectivity and query failures should be reported as
/// [`crate::Error::DataUnavailable`].
pub trait DataStore: Send + Sync {
    fn evaluate(&self, query: &MetricQuery) -> Result<Option<f64>>;
}
