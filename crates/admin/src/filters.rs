//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use rust_decimal::Decimal;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Formats an amount as pesos with thousands separators.
///
/// Usage in templates: `{{ stats.inventory_value|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let raw = value.to_string();
    Ok(raw
        .parse::<Decimal>()
        .map_or_else(|_| format!("${raw}"), format_money))
}

fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(17_212_000, 2)), "$172,120.00");
        assert_eq!(format_money(Decimal::new(29900, 2)), "$299.00");
        assert_eq!(format_money(Decimal::new(5, 1)), "$0.50");
        assert_eq!(format_money(Decimal::new(-123_456, 2)), "-$1,234.56");
    }
}
