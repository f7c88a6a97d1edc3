//! Presenter: turns a metric value and optional trend into a render-ready card.

use crate::format::{self, Currency, PLACEHOLDER};
use crate::metrics::comparator::{Direction, TrendResult};
use crate::metrics::query::MetricValue;
use serde::Serialize;

pub const ICON_TREND_UP: &str = "heroicon-m-arrow-trending-up";
pub const ICON_TREND_DOWN: &str = "heroicon-m-arrow-trending-down";
pub const ICON_TREND_FLAT: &str = "heroicon-m-minus";
pub const ICON_WARNING: &str = "heroicon-m-exclamation-triangle";

const DEFAULT_TREND_PHRASE: &str = "from previous period";

/// How the value is printed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FormatKind {
    Integer,
    Decimal { places: usize },
    /// Value is already in percent units
    Percentage { places: usize },
    Currency { currency: Currency },
    /// 1.2K, 3.4M
    Compact,
}

impl FormatKind {
    pub fn format(&self, value: f64) -> String {
        match self {
            FormatKind::Integer => format::format_integer(value),
            FormatKind::Decimal { places } => format::format_decimal(value, *places),
            FormatKind::Percentage { places } => format::format_percentage(value, *places),
            FormatKind::Currency { currency } => format::format_currency(value, currency),
            FormatKind::Compact => format::format_compact(value),
        }
    }
}

/// Visual status of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorTier {
    Primary,
    Success,
    Info,
    Gray,
    Warning,
    Danger,
}

impl ColorTier {
    /// Higher is more severe. Non-alert tiers share rank 0.
    pub fn severity(&self) -> u8 {
        match self {
            ColorTier::Danger => 2,
            ColorTier::Warning => 1,
            _ => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorTier::Primary => "primary",
            ColorTier::Success => "success",
            ColorTier::Info => "info",
            ColorTier::Gray => "gray",
            ColorTier::Warning => "warning",
            ColorTier::Danger => "danger",
        }
    }
}

/// Whether a rising value is good news for this metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Revenue, orders, new customers
    UpIsGood,
    /// Cancellations, refunds, pending backlog
    UpIsBad,
    Neutral,
}

impl Polarity {
    pub fn tier(&self, direction: Direction) -> ColorTier {
        match (self, direction) {
            (_, Direction::Flat) | (Polarity::Neutral, _) => ColorTier::Gray,
            (Polarity::UpIsGood, Direction::Up) | (Polarity::UpIsBad, Direction::Down) => {
                ColorTier::Success
            }
            (Polarity::UpIsGood, Direction::Down) | (Polarity::UpIsBad, Direction::Up) => {
                ColorTier::Danger
            }
        }
    }
}

/// Which side of a band limit triggers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BandTrigger {
    /// `value <= limit` (low stock)
    AtMost,
    /// `value >= limit` (pending backlog)
    AtLeast,
}

/// One severity band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdBand {
    pub limit: f64,
    pub tier: ColorTier,
}

/// Ordered bands mapping a value to a tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Thresholds {
    pub trigger: BandTrigger,
    pub bands: Vec<ThresholdBand>,
    /// Tier when no band matches
    pub otherwise: ColorTier,
}

impl Thresholds {
    pub fn at_most(otherwise: ColorTier) -> Self {
        Self {
            trigger: BandTrigger::AtMost,
            bands: vec![],
            otherwise,
        }
    }

    pub fn at_least(otherwise: ColorTier) -> Self {
        Self {
            trigger: BandTrigger::AtLeast,
            bands: vec![],
            otherwise,
        }
    }

    pub fn band(mut self, limit: f64, tier: ColorTier) -> Self {
        self.bands.push(ThresholdBand { limit, tier });
        self
    }

    /// The most severe matching band wins, so a value sitting exactly on a
    /// shared boundary lands in the stricter band.
    pub fn classify(&self, value: f64) -> ColorTier {
        self.bands
            .iter()
            .filter(|band| match self.trigger {
                BandTrigger::AtMost => value <= band.limit,
                BandTrigger::AtLeast => value >= band.limit,
            })
            .fold(None::<&ThresholdBand>, |best, band| match best {
                Some(b) if b.tier.severity() >= band.tier.severity() => Some(b),
                _ => Some(band),
            })
            .map(|band| band.tier)
            .unwrap_or(self.otherwise)
    }
}

/// Caller-supplied presentation rules for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentSpec {
    pub format: FormatKind,
    pub polarity: Polarity,
    pub thresholds: Option<Thresholds>,
    /// Icon when no trend is shown
    pub icon: Option<String>,
    /// Description when no trend is shown
    pub description: Option<String>,
    /// Appended to the delta, e.g. "from last month"
    pub trend_phrase: Option<String>,
    /// Tier when neither trend nor thresholds decide
    pub base_tier: ColorTier,
}

impl PresentSpec {
    pub fn new(format: FormatKind) -> Self {
        Self {
            format,
            polarity: Polarity::UpIsGood,
            thresholds: None,
            icon: None,
            description: None,
            trend_phrase: None,
            base_tier: ColorTier::Primary,
        }
    }

    pub fn polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn trend_phrase(mut self, phrase: &str) -> Self {
        self.trend_phrase = Some(phrase.to_string());
        self
    }
}

/// Render-ready stat card.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PresentationCard {
    pub label: String,
    pub formatted_value: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color_tier: ColorTier,
}

impl PresentationCard {
    /// Placeholder card for a widget whose data could not be loaded.
    pub fn degraded(label: &str) -> Self {
        Self {
            label: label.to_string(),
            formatted_value: PLACEHOLDER.to_string(),
            description: Some("Data unavailable".to_string()),
            icon: Some(ICON_WARNING.to_string()),
            color_tier: ColorTier::Gray,
        }
    }
}

fn trend_icon(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => ICON_TREND_UP,
        Direction::Down => ICON_TREND_DOWN,
        Direction::Flat => ICON_TREND_FLAT,
    }
}

/// Build the card for `value`.
///
/// Thresholds decide the tier when present; otherwise the trend does,
/// through the metric's polarity.
pub fn present(
    label: &str,
    value: &MetricValue,
    trend: Option<&TrendResult>,
    spec: &PresentSpec,
) -> PresentationCard {
    let formatted_value = spec.format.format(value.value);

    let (description, icon, trend_tier) = match trend {
        Some(trend) => {
            let phrase = spec.trend_phrase.as_deref().unwrap_or(DEFAULT_TREND_PHRASE);
            (
                Some(format!(
                    "{} {}",
                    format::format_delta(trend.percent_change),
                    phrase
                )),
                Some(trend_icon(trend.direction).to_string()),
                Some(spec.polarity.tier(trend.direction)),
            )
        }
        None => (spec.description.clone(), spec.icon.clone(), None),
    };

    let color_tier = match &spec.thresholds {
        Some(thresholds) => thresholds.classify(value.value),
        None => trend_tier.unwrap_or(spec.base_tier),
    };

    PresentationCard {
        label: label.to_string(),
        formatted_value,
        description,
        icon,
        color_tier,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::comparator::compare;
    use crate::metrics::query::TimeWindow;
    use chrono::{Duration, Utc};

    fn trend(current: f64, previous: f64) -> TrendResult {
        let now = Utc::now();
        let cur = TimeWindow::new(now - Duration::days(30), now).unwrap();
        let prev = TimeWindow::new(now - Duration::days(60), now - Duration::days(30)).unwrap();
        compare(
            &MetricValue::new(current, Some(cur)),
            &MetricValue::new(previous, Some(prev)),
        )
        .unwrap()
    }

    #[test]
    fn test_zero_euro_is_formatted() {
        let spec = PresentSpec::new(FormatKind::Currency {
            currency: Currency::EUR,
        });
        let card = present("Revenue", &MetricValue::new(0.0, None), None, &spec);
        assert_eq!(card.formatted_value, "€0.00");
        assert_eq!(card.color_tier, ColorTier::Primary);
    }

    #[test]
    fn test_trend_description_and_icon() {
        let spec = PresentSpec::new(FormatKind::Integer).trend_phrase("from last month");
        let t = trend(120.0, 100.0);
        let card = present("Orders", &t.current, Some(&t), &spec);
        assert_eq!(card.formatted_value, "120");
        assert_eq!(card.description.as_deref(), Some("+20% from last month"));
        assert_eq!(card.icon.as_deref(), Some(ICON_TREND_UP));
        assert_eq!(card.color_tier, ColorTier::Success);
    }

    #[test]
    fn test_small_change_description_matches_icon() {
        let spec = PresentSpec::new(FormatKind::Integer);
        let up = trend(1003.0, 1000.0);
        let card = present("Orders", &up.current, Some(&up), &spec);
        assert_eq!(card.description.as_deref(), Some("+0.3% from previous period"));
        assert_eq!(card.icon.as_deref(), Some(ICON_TREND_UP));
        assert_eq!(card.color_tier, ColorTier::Success);

        let down = trend(998.0, 1000.0);
        let card = present("Orders", &down.current, Some(&down), &spec);
        assert_eq!(card.description.as_deref(), Some("-0.2% from previous period"));
        assert_eq!(card.icon.as_deref(), Some(ICON_TREND_DOWN));
    }

    #[test]
    fn test_polarity_is_explicit() {
        let t = trend(30.0, 20.0);
        let good = PresentSpec::new(FormatKind::Integer).polarity(Polarity::UpIsGood);
        let bad = PresentSpec::new(FormatKind::Integer).polarity(Polarity::UpIsBad);
        let neutral = PresentSpec::new(FormatKind::Integer).polarity(Polarity::Neutral);
        assert_eq!(present("x", &t.current, Some(&t), &good).color_tier, ColorTier::Success);
        assert_eq!(present("x", &t.current, Some(&t), &bad).color_tier, ColorTier::Danger);
        assert_eq!(present("x", &t.current, Some(&t), &neutral).color_tier, ColorTier::Gray);

        let flat = trend(20.0, 20.0);
        let card = present("x", &flat.current, Some(&flat), &good);
        assert_eq!(card.color_tier, ColorTier::Gray);
        assert_eq!(card.icon.as_deref(), Some(ICON_TREND_FLAT));
        assert_eq!(card.description.as_deref(), Some("0% from previous period"));
    }

    #[test]
    fn test_threshold_bands_at_most() {
        let thresholds = Thresholds::at_most(ColorTier::Success)
            .band(10.0, ColorTier::Warning)
            .band(0.0, ColorTier::Danger);
        assert_eq!(thresholds.classify(25.0), ColorTier::Success);
        assert_eq!(thresholds.classify(10.0), ColorTier::Warning);
        assert_eq!(thresholds.classify(3.0), ColorTier::Warning);
        assert_eq!(thresholds.classify(0.0), ColorTier::Danger);
    }

    #[test]
    fn test_threshold_tie_goes_to_stricter_band() {
        // both bands share the boundary 10
        let thresholds = Thresholds::at_least(ColorTier::Success)
            .band(10.0, ColorTier::Danger)
            .band(10.0, ColorTier::Warning);
        assert_eq!(thresholds.classify(10.0), ColorTier::Danger);

        let thresholds = Thresholds::at_least(ColorTier::Success)
            .band(1.0, ColorTier::Warning)
            .band(10.0, ColorTier::Danger);
        assert_eq!(thresholds.classify(0.0), ColorTier::Success);
        assert_eq!(thresholds.classify(1.0), ColorTier::Warning);
        assert_eq!(thresholds.classify(10.0), ColorTier::Danger);
    }

    #[test]
    fn test_thresholds_override_trend_tier() {
        let spec = PresentSpec::new(FormatKind::Integer)
            .polarity(Polarity::UpIsGood)
            .thresholds(Thresholds::at_least(ColorTier::Success).band(5.0, ColorTier::Danger));
        let t = trend(8.0, 4.0);
        let card = present("Pending", &t.current, Some(&t), &spec);
        assert_eq!(card.color_tier, ColorTier::Danger);
        assert_eq!(card.description.as_deref(), Some("+100% from previous period"));
    }

    #[test]
    fn test_static_description_without_trend() {
        let spec = PresentSpec::new(FormatKind::Decimal { places: 1 })
            .icon("heroicon-m-star")
            .description("Approved reviews");
        let card = present("Rating", &MetricValue::new(4.26, None), None, &spec);
        assert_eq!(card.formatted_value, "4.3");
        assert_eq!(card.description.as_deref(), Some("Approved reviews"));
        assert_eq!(card.icon.as_deref(), Some("heroicon-m-star"));
    }

    #[test]
    fn test_degraded_card() {
        let card = PresentationCard::degraded("Revenue");
        assert_eq!(card.formatted_value, "—");
        assert_eq!(card.color_tier, ColorTier::Gray);
        assert_eq!(card.icon.as_deref(), Some(ICON_WARNING));
    }
}
