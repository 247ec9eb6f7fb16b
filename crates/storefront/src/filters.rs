//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Stock at or below which a card tells the visitor few units remain.
pub const LOW_STOCK: i32 = 5;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Scarcity label for a card; empty when stock is out or plentiful.
///
/// Usage in templates: `{{ case.stock|stock_label }}`
#[askama::filter_fn]
pub fn stock_label(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(value
        .to_string()
        .parse::<i32>()
        .map_or_else(|_| String::new(), label_for))
}

fn label_for(stock: i32) -> String {
    match stock {
        1 => "¡Última pieza!".to_string(),
        n if (2..=LOW_STOCK).contains(&n) => format!("¡Últimas {n} piezas!"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_for() {
        assert_eq!(label_for(0), "");
        assert_eq!(label_for(1), "¡Última pieza!");
        assert_eq!(label_for(4), "¡Últimas 4 piezas!");
        assert_eq!(label_for(LOW_STOCK + 1), "");
        assert_eq!(label_for(-3), "");
    }
}
