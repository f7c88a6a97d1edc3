//! Dashboard widgets
//!
//! Widgets are plain data: a [`WidgetSpec`] names a metric query (or a set of
//! series) plus presentation rules, and one generic renderer turns any spec
//! into a card or chart payload. The shipped e-commerce widgets live in
//! [`catalog`].

pub mod catalog;
pub mod render;

pub use catalog::default_catalog;
pub use render::{render_widget, Dashboard};

use crate::metrics::{
    Aggregation, BucketUnit, MetricQuery, Predicate, PresentSpec, PresentationCard, RelativeWindow,
};
use crate::types::Entity;
use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;

/// Everything a render shares: the instant all windows are resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderContext {
    pub now: DateTime<Utc>,
}

impl RenderContext {
    /// Capture the current time, truncated to whole seconds.
    pub fn now() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: now.trunc_subsecs(0),
        }
    }
}

// ============================================
// Widget specs
// ============================================

/// A single stat card: one aggregate, optionally compared with the previous period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatSpec {
    /// Query without a window; the window comes from `window`
    pub query: MetricQuery,
    pub window: RelativeWindow,
    /// Compare against `window.previous(now)`
    pub compare: bool,
    pub present: PresentSpec,
}

/// One line or bar series of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSpec {
    pub label: String,
    pub entity: Entity,
    pub aggregation: Aggregation,
    pub predicate: Option<Predicate>,
}

impl DatasetSpec {
    pub fn new(label: &str, entity: Entity, aggregation: Aggregation) -> Self {
        Self {
            label: label.to_string(),
            entity,
            aggregation,
            predicate: None,
        }
    }

    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }
}

/// A time-series chart; all datasets share the same buckets.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub unit: BucketUnit,
    pub lookback: usize,
    pub datasets: Vec<DatasetSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetKind {
    Stat(StatSpec),
    Chart(ChartSpec),
}

/// A dashboard widget definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WidgetSpec {
    /// Stable identifier, used for `disabled_widgets` and `--widget`
    pub key: String,
    pub label: String,
    pub kind: WidgetKind,
}

impl WidgetSpec {
    pub fn stat(key: &str, label: &str, spec: StatSpec) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: WidgetKind::Stat(spec),
        }
    }

    pub fn chart(key: &str, label: &str, spec: ChartSpec) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind: WidgetKind::Chart(spec),
        }
    }
}

// ============================================
// Rendered output
// ============================================

/// One named series of chart values, aligned with [`ChartPayload::labels`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub data: Vec<f64>,
}

/// Chart-ready payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetStatus {
    Ok,
    /// Store unavailable; a placeholder is shown
    Degraded,
    /// Widget definition is invalid
    Failed,
}

impl WidgetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetStatus::Ok => "ok",
            WidgetStatus::Degraded => "degraded",
            WidgetStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WidgetOutput {
    Card(PresentationCard),
    Chart(ChartPayload),
}

/// Result of rendering one widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedWidget {
    pub key: String,
    pub label: String,
    pub status: WidgetStatus,
    pub output: Option<WidgetOutput>,
    pub error: Option<String>,
}

impl RenderedWidget {
    pub fn card(&self) -> Option<&PresentationCard> {
        match &self.output {
            Some(WidgetOutput::Card(card)) => Some(card),
            _ => None,
        }
    }

    pub fn chart(&self) -> Option<&ChartPayload> {
        match &self.output {
            Some(WidgetOutput::Chart(chart)) => Some(chart),
            _ => None,
        }
    }
}

/// Every widget of one render, in catalog order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub generated_at: DateTime<Utc>,
    pub widgets: Vec<RenderedWidget>,
}

impl DashboardReport {
    pub fn widget(&self, key: &str) -> Option<&RenderedWidget> {
        self.widgets.iter().find(|w| w.key == key)
    }

    /// Number of widgets that did not render normally.
    pub fn problem_count(&self) -> usize {
        self.widgets
            .iter()
            .filter(|w| w.status != WidgetStatus::Ok)
            .count()
    }

    /// Pretty-printed JSON for API consumers and `--format json`.
    pub fn to_json(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
