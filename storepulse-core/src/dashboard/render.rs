//! Generic widget renderer.

use super::{
    ChartPayload, ChartSpec, DashboardReport, Dataset, RenderContext, RenderedWidget, StatSpec,
    WidgetKind, WidgetOutput, WidgetSpec, WidgetStatus,
};
use crate::db::DataStore;
use crate::error::{Error, Result};
use crate::metrics::{
    aggregate, bucket_windows, build_series, compare, present, PresentationCard, SeriesRequest,
};
use std::sync::Arc;

fn render_stat(
    store: &dyn DataStore,
    label: &str,
    stat: &StatSpec,
    ctx: &RenderContext,
) -> Result<PresentationCard> {
    let current_window = stat.window.resolve(ctx.now)?;
    let current = aggregate(store, &stat.query.with_window(current_window))?;

    let trend = if stat.compare {
        let previous_window = stat.window.previous(ctx.now)?;
        let previous = aggregate(store, &stat.query.with_window(previous_window))?;
        Some(compare(&current, &previous)?)
    } else {
        None
    };

    if trend.is_some() && stat.present.trend_phrase.is_none() {
        let spec = stat
            .present
            .clone()
            .trend_phrase(&stat.window.comparison_phrase());
        return Ok(present(label, &current, trend.as_ref(), &spec));
    }
    Ok(present(label, &current, trend.as_ref(), &stat.present))
}

fn render_chart(
    store: &dyn DataStore,
    chart: &ChartSpec,
    ctx: &RenderContext,
) -> Result<ChartPayload> {
    if chart.datasets.is_empty() {
        return Err(Error::invalid("chart needs at least one dataset"));
    }

    let labels = bucket_windows(chart.unit, chart.lookback, ctx.now)?
        .into_iter()
        .map(|window| chart.unit.label(window.start))
        .collect();

    let datasets = chart
        .datasets
        .iter()
        .map(|dataset| {
            let mut request = SeriesRequest::new(
                dataset.entity,
                dataset.aggregation.clone(),
                chart.unit,
                chart.lookback,
            );
            if let Some(predicate) = &dataset.predicate {
                request = request.filter(predicate.clone());
            }
            let points = build_series(store, &request, ctx.now)?;
            Ok(Dataset {
                label: dataset.label.clone(),
                data: points.into_iter().map(|p| p.value).collect(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ChartPayload { labels, datasets })
}

/// Render one widget. Never fails: store outages produce a degraded widget and
/// invalid definitions a failed one, so the rest of the dashboard still renders.
pub fn render_widget(store: &dyn DataStore, spec: &WidgetSpec, ctx: &RenderContext) -> RenderedWidget {
    let result = match &spec.kind {
        WidgetKind::Stat(stat) => render_stat(store, &spec.label, stat, ctx).map(WidgetOutput::Card),
        WidgetKind::Chart(chart) => render_chart(store, chart, ctx).map(WidgetOutput::Chart),
    };

    match result {
        Ok(output) => RenderedWidget {
            key: spec.key.clone(),
            label: spec.label.clone(),
            status: WidgetStatus::Ok,
            output: Some(output),
            error: None,
        },
        Err(e) if e.is_data_unavailable() => {
            tracing::warn!(widget = %spec.key, error = %e, "Widget degraded");
            let output = match spec.kind {
                WidgetKind::Stat(_) => Some(WidgetOutput::Card(PresentationCard::degraded(&spec.label))),
                WidgetKind::Chart(_) => None,
            };
            RenderedWidget {
                key: spec.key.clone(),
                label: spec.label.clone(),
                status: WidgetStatus::Degraded,
                output,
                error: Some(e.to_string()),
            }
        }
        Err(e) => {
            tracing::error!(widget = %spec.key, error = %e, "Widget failed");
            RenderedWidget {
                key: spec.key.clone(),
                label: spec.label.clone(),
                status: WidgetStatus::Failed,
                output: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// An ordered set of widgets rendered together.
#[derive(Debug, Clone)]
pub struct Dashboard {
    widgets: Arc<Vec<WidgetSpec>>,
}

impl Dashboard {
    pub fn new(widgets: Vec<WidgetSpec>) -> Self {
        Self {
            widgets: Arc::new(widgets),
        }
    }

    pub fn widgets(&self) -> &[WidgetSpec] {
        &self.widgets
    }

    /// Keep only the widgets whose key is in `keys`, in catalog order.
    pub fn only(&self, keys: &[String]) -> Self {
        let widgets = self
            .widgets
            .iter()
            .filter(|w| keys.iter().any(|k| k == &w.key))
            .cloned()
            .collect();
        Self::new(widgets)
    }

    /// Render every widget in order on the calling thread.
    pub fn render(&self, store: &dyn DataStore, ctx: &RenderContext) -> DashboardReport {
        let widgets = self
            .widgets
            .iter()
            .map(|spec| render_widget(store, spec, ctx))
            .collect();
        self.report(ctx, widgets)
    }

    /// Render every widget on tokio's blocking pool, one task per widget.
    ///
    /// Widgets share nothing but the store and `ctx`; the report keeps catalog
    /// order regardless of completion order.
    pub fn render_concurrent(
        &self,
        store: Arc<dyn DataStore>,
        ctx: &RenderContext,
    ) -> Result<DashboardReport> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        let ctx = *ctx;
        let widgets = runtime.block_on(async {
            let handles: Vec<_> = (0..self.widgets.len())
                .map(|i| {
                    let store = Arc::clone(&store);
                    let widgets = Arc::clone(&self.widgets);
                    tokio::task::spawn_blocking(move || render_widget(store.as_ref(), &widgets[i], &ctx))
                })
                .collect();

            let mut rendered = Vec::with_capacity(handles.len());
            for (spec, handle) in self.widgets.iter().zip(handles) {
                match handle.await {
                    Ok(widget) => rendered.push(widget),
                    Err(e) => {
                        tracing::error!(widget = %spec.key, error = %e, "Widget task panicked");
                        rendered.push(RenderedWidget {
                            key: spec.key.clone(),
                            label: spec.label.clone(),
                            status: WidgetStatus::Failed,
                            output: None,
                            error: Some(format!("render task failed: {}", e)),
                        });
                    }
                }
            }
            rendered
        });

        Ok(self.report(&ctx, widgets))
    }

    fn report(&self, ctx: &RenderContext, widgets: Vec<RenderedWidget>) -> DashboardReport {
        let report = DashboardReport {
            generated_at: ctx.now,
            widgets,
        };
        tracing::info!(
            widgets = report.widgets.len(),
            problems = report.problem_count(),
            "Rendered dashboard"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::{DatasetSpec, StatSpec};
    use crate::metrics::{
        Aggregation, BucketUnit, ColorTier, FormatKind, MetricQuery, Polarity, Predicate,
        PresentSpec, RelativeWindow, ICON_TREND_UP, ICON_WARNING,
    };
    use crate::types::Entity;
    use chrono::{Datelike, TimeZone, Utc};

    /// Store answering by entity: orders succeed, products are offline.
    struct SplitStore;

    impl DataStore for SplitStore {
        fn evaluate(&self, query: &MetricQuery) -> Result<Option<f64>> {
            match query.entity {
                Entity::Products => Err(Error::DataUnavailable("products offline".to_string())),
                Entity::Orders => {
                    let window = query.window.expect("stat widgets are windowed");
                    // current month 120, previous month 100
                    if window.start.month() == 3 {
                        Ok(Some(120.0))
                    } else {
                        Ok(Some(100.0))
                    }
                }
                _ => Ok(None),
            }
        }
    }

    fn ctx() -> RenderContext {
        RenderContext::at(Utc.with_ymd_and_hms(2024, 3, 14, 15, 30, 0).unwrap())
    }

    fn revenue_widget() -> WidgetSpec {
        WidgetSpec::stat(
            "revenue",
            "Revenue",
            StatSpec {
                query: MetricQuery::sum(Entity::Orders, "total"),
                window: RelativeWindow::ThisMonth,
                compare: true,
                present: PresentSpec::new(FormatKind::Integer),
            },
        )
    }

    fn stock_widget() -> WidgetSpec {
        WidgetSpec::stat(
            "stock",
            "Low stock",
            StatSpec {
                query: MetricQuery::count(Entity::Products),
                window: RelativeWindow::AllTime,
                compare: false,
                present: PresentSpec::new(FormatKind::Integer),
            },
        )
    }

    #[test]
    fn test_stat_with_trend_uses_window_phrase() {
        let widget = render_widget(&SplitStore, &revenue_widget(), &ctx());
        assert_eq!(widget.status, WidgetStatus::Ok);
        let card = widget.card().unwrap();
        assert_eq!(card.formatted_value, "120");
        assert_eq!(card.description.as_deref(), Some("+20% from last month"));
        assert_eq!(card.icon.as_deref(), Some(ICON_TREND_UP));
        assert_eq!(card.color_tier, ColorTier::Success);
    }

    #[test]
    fn test_unavailable_store_degrades_only_that_widget() {
        crate::logging::init_test();
        let dashboard = Dashboard::new(vec![stock_widget(), revenue_widget()]);
        let report = dashboard.render(&SplitStore, &ctx());

        assert_eq!(report.widgets.len(), 2);
        let stock = report.widget("stock").unwrap();
        assert_eq!(stock.status, WidgetStatus::Degraded);
        let card = stock.card().unwrap();
        assert_eq!(card.formatted_value, "—");
        assert_eq!(card.color_tier, ColorTier::Gray);
        assert_eq!(card.icon.as_deref(), Some(ICON_WARNING));

        assert_eq!(report.widget("revenue").unwrap().status, WidgetStatus::Ok);
        assert_eq!(report.problem_count(), 1);
    }

    #[test]
    fn test_comparison_without_window_fails_widget() {
        let spec = WidgetSpec::stat(
            "all_time_trend",
            "Orders",
            StatSpec {
                query: MetricQuery::count(Entity::Customers),
                window: RelativeWindow::AllTime,
                compare: true,
                present: PresentSpec::new(FormatKind::Integer),
            },
        );
        let widget = render_widget(&SplitStore, &spec, &ctx());
        assert_eq!(widget.status, WidgetStatus::Failed);
        assert!(widget.output.is_none());
        assert!(widget.error.unwrap().contains("invalid metric"));
    }

    #[test]
    fn test_invalid_field_fails_widget() {
        let spec = WidgetSpec::stat(
            "bad",
            "Bad",
            StatSpec {
                query: MetricQuery::sum(Entity::Orders, "status"),
                window: RelativeWindow::Today,
                compare: false,
                present: PresentSpec::new(FormatKind::Integer).polarity(Polarity::Neutral),
            },
        );
        assert_eq!(render_widget(&SplitStore, &spec, &ctx()).status, WidgetStatus::Failed);
    }

    #[test]
    fn test_chart_payload_shape() {
        let spec = WidgetSpec::chart(
            "customers_chart",
            "Customers",
            ChartSpec {
                unit: BucketUnit::Month,
                lookback: 12,
                datasets: vec![
                    DatasetSpec::new("All", Entity::Customers, Aggregation::Count),
                    DatasetSpec::new("Germany", Entity::Customers, Aggregation::Count)
                        .filter(Predicate::new().eq("country", "DE")),
                ],
            },
        );
        let widget = render_widget(&SplitStore, &spec, &ctx());
        let chart = widget.chart().unwrap();
        assert_eq!(chart.labels.len(), 12);
        assert_eq!(chart.labels.first().unwrap(), "2023-04");
        assert_eq!(chart.labels.last().unwrap(), "2024-03");
        assert_eq!(chart.datasets.len(), 2);
        assert!(chart.datasets.iter().all(|d| d.data == vec![0.0; 12]));
    }

    #[test]
    fn test_chart_without_datasets_fails() {
        let spec = WidgetSpec::chart(
            "empty",
            "Empty",
            ChartSpec {
                unit: BucketUnit::Day,
                lookback: 7,
                datasets: vec![],
            },
        );
        assert_eq!(render_widget(&SplitStore, &spec, &ctx()).status, WidgetStatus::Failed);
    }

    #[test]
    fn test_concurrent_render_keeps_catalog_order() {
        let dashboard = Dashboard::new(vec![revenue_widget(), stock_widget(), revenue_widget()]);
        let store: Arc<dyn DataStore> = Arc::new(SplitStore);

        let sequential = dashboard.render(store.as_ref(), &ctx());
        let concurrent = dashboard.render_concurrent(Arc::clone(&store), &ctx()).unwrap();

        assert_eq!(sequential, concurrent);
        let keys: Vec<_> = concurrent.widgets.iter().map(|w| w.key.as_str()).collect();
        assert_eq!(keys, vec!["revenue", "stock", "revenue"]);
    }

    #[test]
    fn test_only_filters_widgets() {
        let dashboard = Dashboard::new(vec![revenue_widget(), stock_widget()]);
        let only = dashboard.only(&["stock".to_string()]);
        assert_eq!(only.widgets().len(), 1);
        assert_eq!(only.widgets()[0].key, "stock");
    }
}
