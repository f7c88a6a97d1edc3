//! The shipped e-commerce widgets.

use super::{ChartSpec, DatasetSpec, StatSpec, WidgetSpec};
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::metrics::{
    Aggregation, BucketUnit, ColorTier, FormatKind, MetricQuery, Polarity, Predicate,
    PresentSpec, RelativeWindow, Thresholds,
};
use crate::types::{CampaignStatus, Entity, OrderStatus, ProductStatus, ReviewStatus};

/// Months shown by the orders chart
const ORDERS_CHART_MONTHS: usize = 12;

fn completed() -> Predicate {
    Predicate::new().eq("status", OrderStatus::Completed.as_str())
}

fn stat(query: MetricQuery, window: RelativeWindow, compare: bool, present: PresentSpec) -> StatSpec {
    StatSpec {
        query,
        window,
        compare,
        present,
    }
}

/// Build the default dashboard, skipping widgets disabled in `config`.
pub fn default_catalog(config: &DashboardConfig) -> Result<Vec<WidgetSpec>> {
    let currency = FormatKind::Currency {
        currency: config.currency()?,
    };

    let widgets = vec![
        WidgetSpec::stat(
            "total_revenue",
            "Revenue",
            stat(
                MetricQuery::sum(Entity::Orders, "total").filter(completed()),
                RelativeWindow::ThisMonth,
                true,
                PresentSpec::new(currency.clone()),
            ),
        ),
        WidgetSpec::stat(
            "orders_this_month",
            "Orders",
            stat(
                MetricQuery::count(Entity::Orders),
                RelativeWindow::ThisMonth,
                true,
                PresentSpec::new(FormatKind::Integer),
            ),
        ),
        WidgetSpec::stat(
            "pending_orders",
            "Pending orders",
            stat(
                MetricQuery::count(Entity::Orders).filter(Predicate::new().is_in(
                    "status",
                    [OrderStatus::Pending.as_str(), OrderStatus::Processing.as_str()],
                )),
                RelativeWindow::AllTime,
                false,
                PresentSpec::new(FormatKind::Integer)
                    .description("Awaiting fulfilment")
                    .icon("heroicon-m-clock")
                    .thresholds(
                        Thresholds::at_least(ColorTier::Success)
                            .band(10.0, ColorTier::Warning)
                            .band(25.0, ColorTier::Danger),
                    ),
            ),
        ),
        WidgetSpec::stat(
            "cancelled_orders",
            "Cancelled orders",
            stat(
                MetricQuery::count(Entity::Orders)
                    .filter(Predicate::new().eq("status", OrderStatus::Cancelled.as_str())),
                RelativeWindow::ThisMonth,
                true,
                PresentSpec::new(FormatKind::Integer).polarity(Polarity::UpIsBad),
            ),
        ),
        WidgetSpec::stat(
            "average_order_value",
            "Average order value",
            stat(
                MetricQuery::avg(Entity::Orders, "total").filter(completed()),
                RelativeWindow::ThisMonth,
                true,
                PresentSpec::new(currency),
            ),
        ),
        WidgetSpec::stat(
            "new_customers",
            "New customers",
            stat(
                MetricQuery::count(Entity::Customers),
                RelativeWindow::LastDays(30),
                true,
                PresentSpec::new(FormatKind::Compact),
            ),
        ),
        WidgetSpec::stat(
            "low_stock_products",
            "Low stock",
            stat(
                MetricQuery::count(Entity::Products).filter(
                    Predicate::new()
                        .eq("status", ProductStatus::Active.as_str())
                        .lte("stock", config.low_stock_threshold),
                ),
                RelativeWindow::AllTime,
                false,
                PresentSpec::new(FormatKind::Integer)
                    .description(&format!("{} units or fewer", config.low_stock_threshold))
                    .icon("heroicon-m-archive-box")
                    .thresholds(
                        Thresholds::at_least(ColorTier::Success)
                            .band(1.0, ColorTier::Warning)
                            .band(10.0, ColorTier::Danger),
                    ),
            ),
        ),
        WidgetSpec::stat(
            "average_rating",
            "Average rating",
            stat(
                MetricQuery::avg(Entity::Reviews, "rating")
                    .filter(Predicate::new().eq("status", ReviewStatus::Approved.as_str())),
                RelativeWindow::AllTime,
                false,
                PresentSpec::new(FormatKind::Decimal { places: 1 })
                    .description("Approved reviews")
                    .icon("heroicon-m-star"),
            ),
        ),
        WidgetSpec::stat(
            "active_campaigns",
            "Active campaigns",
            stat(
                MetricQuery::count(Entity::Campaigns)
                    .filter(Predicate::new().eq("status", CampaignStatus::Active.as_str())),
                RelativeWindow::AllTime,
                false,
                PresentSpec::new(FormatKind::Integer)
                    .description("Running now")
                    .icon("heroicon-m-megaphone"),
            ),
        ),
        WidgetSpec::chart(
            "revenue_chart",
            "Revenue per day",
            ChartSpec {
                unit: BucketUnit::Day,
                lookback: config.series_lookback as usize,
                datasets: vec![DatasetSpec::new(
                    "Revenue",
                    Entity::Orders,
                    Aggregation::sum("total"),
                )
                .filter(completed())],
            },
        ),
        WidgetSpec::chart(
            "orders_chart",
            "Orders per month",
            ChartSpec {
                unit: BucketUnit::Month,
                lookback: ORDERS_CHART_MONTHS,
                datasets: vec![
                    DatasetSpec::new("Orders", Entity::Orders, Aggregation::Count),
                    DatasetSpec::new("Cancelled", Entity::Orders, Aggregation::Count)
                        .filter(Predicate::new().eq("status", OrderStatus::Cancelled.as_str())),
                ],
            },
        ),
    ];

    Ok(widgets
        .into_iter()
        .filter(|w| !config.is_disabled(&w.key))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::WidgetKind;
    use std::collections::HashSet;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = default_catalog(&DashboardConfig::default()).unwrap();
        assert_eq!(catalog.len(), 11);

        let keys: HashSet<_> = catalog.iter().map(|w| w.key.as_str()).collect();
        assert_eq!(keys.len(), catalog.len(), "widget keys must be unique");

        for widget in &catalog {
            match &widget.kind {
                WidgetKind::Stat(stat) => {
                    assert!(stat.query.validate().is_ok(), "{} query", widget.key);
                    assert!(stat.query.window.is_none(), "{} sets its own window", widget.key);
                }
                WidgetKind::Chart(chart) => {
                    assert!(chart.lookback > 0);
                    assert!(!chart.datasets.is_empty());
                }
            }
        }
    }

    #[test]
    fn test_catalog_follows_config() {
        let config = DashboardConfig {
            currency: "USD".to_string(),
            series_lookback: 14,
            low_stock_threshold: 2,
            disabled_widgets: vec!["orders_chart".to_string(), "active_campaigns".to_string()],
        };
        let catalog = default_catalog(&config).unwrap();
        assert_eq!(catalog.len(), 9);
        assert!(catalog.iter().all(|w| w.key != "orders_chart"));

        let revenue_chart = catalog.iter().find(|w| w.key == "revenue_chart").unwrap();
        match &revenue_chart.kind {
            WidgetKind::Chart(chart) => assert_eq!(chart.lookback, 14),
            other => panic!("unexpected kind {:?}", other),
        }

        let revenue = catalog.iter().find(|w| w.key == "total_revenue").unwrap();
        match &revenue.kind {
            WidgetKind::Stat(stat) => assert_eq!(stat.present.format.format(5.0), "$5.00"),
            other => panic!("unexpected kind {:?}", other),
        }
    }

    #[test]
    fn test_unknown_currency_is_rejected() {
        let config = DashboardConfig {
            currency: "XXX".to_string(),
            ..DashboardConfig::default()
        };
        assert!(default_catalog(&config).is_err());
    }
}
