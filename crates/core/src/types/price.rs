//! Type-safe price representation using decimal arithmetic.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Case prices are stored as a bare `NUMERIC(10, 2)` column; the currency is
/// a storefront-wide setting and only matters for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., pesos, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display (e.g., "$299.00").
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}{:.2}", self.currency_code.symbol(), self.amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    MXN,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::MXN | Self::USD => "$",
            Self::EUR => "€",
        }
    }

    /// The ISO 4217 code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::MXN => "MXN",
            Self::USD => "USD",
            Self::EUR => "EUR",
        }
    }
}
