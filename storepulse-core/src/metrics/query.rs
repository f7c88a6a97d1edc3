//! Metric queries and the values they evaluate to.

use crate::error::{Error, Result};
use crate::types::Entity;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Half-open time range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window, rejecting empty or inverted ranges.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start >= end {
            return Err(Error::invalid(format!(
                "window start {} must be before end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// Reduction applied to the matching rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "field", rename_all = "snake_case")]
pub enum Aggregation {
    Count,
    Sum(String),
    Avg(String),
}

impl Aggregation {
    pub fn sum(field: &str) -> Self {
        Aggregation::Sum(field.to_string())
    }

    pub fn avg(field: &str) -> Self {
        Aggregation::Avg(field.to_string())
    }

    /// The reduced field, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Aggregation::Count => None,
            Aggregation::Sum(field) | Aggregation::Avg(field) => Some(field),
        }
    }
}

impl std::fmt::Display for Aggregation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Aggregation::Count => f.write_str("count"),
            Aggregation::Sum(field) => write!(f, "sum({})", field),
            Aggregation::Avg(field) => write!(f, "avg({})", field),
        }
    }
}

/// Parses `count`, `sum:FIELD` and `avg:FIELD`.
impl std::str::FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once(':') {
            None if s == "count" => Ok(Aggregation::Count),
            Some(("sum", field)) if !field.is_empty() => Ok(Aggregation::sum(field)),
            Some(("avg", field)) if !field.is_empty() => Ok(Aggregation::avg(field)),
            _ => Err(format!(
                "unknown aggregation: {} (use count, sum:FIELD or avg:FIELD)",
                s
            )),
        }
    }
}

/// A literal compared against a column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Real(f64),
    List(Vec<FilterValue>),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        FilterValue::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        FilterValue::Integer(value)
    }
}

impl From<f64> for FilterValue {
    fn from(value: f64) -> Self {
        FilterValue::Real(value)
    }
}

/// Comparison operator of a single condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    NotEq,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
}

impl FilterOp {
    /// SQL operator text.
    pub fn as_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::NotEq => "!=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::In => "IN",
        }
    }
}

/// One `field <op> value` test.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub field: String,
    pub op: FilterOp,
    pub value: FilterValue,
}

/// Conjunction of conditions; an empty predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Predicate {
    pub conditions: Vec<Condition>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, field: &str, op: FilterOp, value: FilterValue) -> Self {
        self.conditions.push(Condition {
            field: field.to_string(),
            op,
            value,
        });
        self
    }

    pub fn eq(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.with(field, FilterOp::Eq, value.into())
    }

    pub fn not_eq(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.with(field, FilterOp::NotEq, value.into())
    }

    pub fn lt(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.with(field, FilterOp::Lt, value.into())
    }

    pub fn lte(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.with(field, FilterOp::Lte, value.into())
    }

    pub fn gt(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.with(field, FilterOp::Gt, value.into())
    }

    pub fn gte(self, field: &str, value: impl Into<FilterValue>) -> Self {
        self.with(field, FilterOp::Gte, value.into())
    }

    pub fn is_in<V: Into<FilterValue>>(self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        let list = values.into_iter().map(Into::into).collect();
        self.with(field, FilterOp::In, FilterValue::List(list))
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    fn validate(&self, entity: Entity) -> Result<()> {
        for condition in &self.conditions {
            if !entity.is_filter_field(&condition.field) {
                return Err(Error::invalid(format!(
                    "{} cannot be filtered on '{}'",
                    entity, condition.field
                )));
            }
            match (&condition.op, &condition.value) {
                (FilterOp::In, FilterValue::List(values)) => {
                    if values.is_empty() {
                        return Err(Error::invalid(format!(
                            "IN filter on '{}' needs at least one value",
                            condition.field
                        )));
                    }
                    if values.iter().any(|v| matches!(v, FilterValue::List(_))) {
                        return Err(Error::invalid(format!(
                            "IN filter on '{}' cannot nest lists",
                            condition.field
                        )));
                    }
                }
                (FilterOp::In, _) => {
                    return Err(Error::invalid(format!(
                        "IN filter on '{}' needs a list",
                        condition.field
                    )));
                }
                (_, FilterValue::List(_)) => {
                    return Err(Error::invalid(format!(
                        "only IN filters accept a list ('{}')",
                        condition.field
                    )));
                }
                (_, FilterValue::Real(v)) if !v.is_finite() => {
                    return Err(Error::invalid(format!(
                        "filter on '{}' compares against a non-finite number",
                        condition.field
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// What to aggregate, over which rows, in which window.
///
/// Built fresh per evaluation and never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricQuery {
    pub entity: Entity,
    pub predicate: Option<Predicate>,
    pub aggregation: Aggregation,
    /// All time when absent
    pub window: Option<TimeWindow>,
}

impl MetricQuery {
    pub fn new(entity: Entity, aggregation: Aggregation) -> Self {
        Self {
            entity,
            predicate: None,
            aggregation,
            window: None,
        }
    }

    pub fn count(entity: Entity) -> Self {
        Self::new(entity, Aggregation::Count)
    }

    pub fn sum(entity: Entity, field: &str) -> Self {
        Self::new(entity, Aggregation::sum(field))
    }

    pub fn avg(entity: Entity, field: &str) -> Self {
        Self::new(entity, Aggregation::avg(field))
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn within(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Same query restricted to another window (or all time).
    pub fn with_window(&self, window: Option<TimeWindow>) -> Self {
        Self {
            window,
            ..self.clone()
        }
    }

    /// Check the query against the entity's field whitelists.
    pub fn validate(&self) -> Result<()> {
        if let Some(field) = self.aggregation.field() {
            if !self.entity.is_numeric_field(field) {
                return Err(Error::invalid(format!(
                    "{} on {} needs a numeric field, got '{}'",
                    self.aggregation, self.entity, field
                )));
            }
        }
        if let Some(predicate) = &self.predicate {
            predicate.validate(self.entity)?;
        }
        if let Some(window) = &self.window {
            if window.start >= window.end {
                return Err(Error::invalid("query window is empty"));
            }
        }
        Ok(())
    }
}

/// Result of evaluating a [`MetricQuery`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricValue {
    pub value: f64,
    pub window: Option<TimeWindow>,
}

impl MetricValue {
    pub fn new(value: f64, window: Option<TimeWindow>) -> Self {
        Self { value, window }
    }
}
