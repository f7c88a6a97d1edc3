//! Number formatting helpers shared by the presenter and the CLIs.
//!
//! Formatting never infers a locale: grouping is always `,`, the decimal point
//! is always `.`, and currencies are passed in explicitly.

use serde::Serialize;

/// Placeholder shown for values that could not be computed.
pub const PLACEHOLDER: &str = "—";

/// A currency passed explicitly by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Currency {
    /// ISO 4217 code (e.g. "EUR")
    pub code: &'static str,
    /// Symbol printed before the amount
    pub symbol: &'static str,
    /// Minor unit digits
    pub decimals: usize,
}

impl Currency {
    pub const EUR: Currency = Currency {
        code: "EUR",
        symbol: "€",
        decimals: 2,
    };
    pub const USD: Currency = Currency {
        code: "USD",
        symbol: "$",
        decimals: 2,
    };
    pub const GBP: Currency = Currency {
        code: "GBP",
        symbol: "£",
        decimals: 2,
    };
    pub const JPY: Currency = Currency {
        code: "JPY",
        symbol: "¥",
        decimals: 0,
    };

    /// Look up a supported currency by ISO code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Currency> {
        match code.to_ascii_uppercase().as_str() {
            "EUR" => Some(Currency::EUR),
            "USD" => Some(Currency::USD),
            "GBP" => Some(Currency::GBP),
            "JPY" => Some(Currency::JPY),
            _ => None,
        }
    }
}

/// Insert `,` every three digits from the right.
fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format the magnitude of `value` with grouping, returning (is_negative, text).
///
/// A value that rounds to zero is never reported as negative.
fn fixed_parts(value: f64, places: usize) -> (bool, String) {
    let value = if value.is_finite() { value } else { 0.0 };
    let raw = format!("{:.*}", places, value.abs());
    let negative = value < 0.0 && raw.chars().any(|c| c.is_ascii_digit() && c != '0');

    let text = match raw.split_once('.') {
        Some((int_part, frac_part)) => format!("{}.{}", group_thousands(int_part), frac_part),
        None => group_thousands(&raw),
    };
    (negative, text)
}

/// Format a number with a fixed number of decimal places (e.g. "1,234.57").
pub fn format_decimal(value: f64, places: usize) -> String {
    let (negative, text) = fixed_parts(value, places);
    if negative {
        format!("-{}", text)
    } else {
        text
    }
}

/// Format a number rounded to an integer (e.g. "12,500").
pub fn format_integer(value: f64) -> String {
    format_decimal(value, 0)
}

/// Format a value that is already expressed in percent (e.g. 12.5 -> "12.5%").
pub fn format_percentage(value: f64, places: usize) -> String {
    format!("{}%", format_decimal(value, places))
}

/// Format a money amount (e.g. "€1,234.50", "-$5.00").
pub fn format_currency(value: f64, currency: &Currency) -> String {
    let (negative, text) = fixed_parts(value, currency.decimals);
    if negative {
        format!("-{}{}", currency.symbol, text)
    } else {
        format!("{}{}", currency.symbol, text)
    }
}

/// Format large numbers compactly (e.g. "14.2M", "3.4K", "812").
///
/// A quotient that rounds up to 1000 moves to the next unit, so 999,999
/// reads "1.0M" rather than "1000.0K".
pub fn format_compact(value: f64) -> String {
    const UNITS: [(f64, &str); 3] = [(1_000.0, "K"), (1_000_000.0, "M"), (1_000_000_000.0, "B")];

    let value = if value.is_finite() { value } else { 0.0 };
    let abs = value.abs();
    let sign = if value < 0.0 { "-" } else { "" };

    if abs.round() < 1_000.0 {
        return format_integer(value);
    }

    let mut unit = UNITS.iter().rposition(|(divisor, _)| abs >= *divisor).unwrap_or(0);
    let mut scaled = (abs / UNITS[unit].0 * 10.0).round() / 10.0;
    if scaled >= 1_000.0 && unit + 1 < UNITS.len() {
        unit += 1;
        scaled = (abs / UNITS[unit].0 * 10.0).round() / 10.0;
    }
    format!("{}{:.1}{}", sign, scaled, UNITS[unit].1)
}

/// Format a percent delta for display (e.g. "+23%" or "-15%").
///
/// Changes that round to zero whole percent keep one decimal place (and at
/// least "0.1%") so the sign always agrees with the trend direction.
pub fn format_delta(delta: f64) -> String {
    if !delta.is_finite() || delta == 0.0 {
        return "0%".to_string();
    }
    let sign = if delta > 0.0 { "+" } else { "-" };
    let abs = delta.abs();
    if abs.round() >= 1.0 {
        format!("{}{:.0}%", sign, abs.round())
    } else {
        format!("{}{:.1}%", sign, abs.max(0.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0, &Currency::EUR), "€0.00");
        assert_eq!(format_currency(1234.5, &Currency::EUR), "€1,234.50");
        assert_eq!(format_currency(-5.0, &Currency::USD), "-$5.00");
        assert_eq!(format_currency(1500.4, &Currency::JPY), "¥1,500");
        assert_eq!(format_currency(-0.001, &Currency::GBP), "£0.00");
    }

    #[test]
    fn test_format_numbers() {
        assert_eq!(format_integer(12500.0), "12,500");
        assert_eq!(format_integer(0.0), "0");
        assert_eq!(format_decimal(4.26, 1), "4.3");
        assert_eq!(format_decimal(1234.567, 2), "1,234.57");
        assert_eq!(format_percentage(12.5, 1), "12.5%");
        assert_eq!(format_integer(f64::NAN), "0");
    }

    #[test]
    fn test_format_compact() {
        assert_eq!(format_compact(14_200_000.0), "14.2M");
        assert_eq!(format_compact(3_400.0), "3.4K");
        assert_eq!(format_compact(812.0), "812");
        assert_eq!(format_compact(2_500_000_000.0), "2.5B");
        assert_eq!(format_compact(-3_400.0), "-3.4K");
    }

    #[test]
    fn test_format_compact_rounds_into_next_unit() {
        assert_eq!(format_compact(999_999.0), "1.0M");
        assert_eq!(format_compact(999_950_000.0), "1.0B");
        assert_eq!(format_compact(999.6), "1.0K");
        assert_eq!(format_compact(-999_999.0), "-1.0M");
        // just below the rounding point stays in the smaller unit
        assert_eq!(format_compact(999_940.0), "999.9K");
        assert_eq!(format_compact(950_000_000.0), "950.0M");
        assert_eq!(format_compact(999.4), "999");
    }

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(23.0), "+23%");
        assert_eq!(format_delta(-15.2), "-15%");
        assert_eq!(format_delta(0.0), "0%");
        assert_eq!(format_delta(0.5), "+1%");
    }

    #[test]
    fn test_format_delta_small_changes_keep_their_sign() {
        assert_eq!(format_delta(0.3), "+0.3%");
        assert_eq!(format_delta(-0.26), "-0.3%");
        assert_eq!(format_delta(0.001), "+0.1%");
        assert_eq!(format_delta(-0.04), "-0.1%");
        assert_eq!(format_delta(f64::NAN), "0%");
    }

    #[test]
    fn test_currency_lookup() {
        assert_eq!(Currency::from_code("eur"), Some(Currency::EUR));
        assert!(Currency::from_code("XYZ").is_none());
    }
}
