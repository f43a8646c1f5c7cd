//! Fiat prices for wallet assets.
//!
//! A [`PriceSource`] returns a fresh [`PriceTable`] on every call; nothing in
//! this module caches prices between refreshes.

pub mod providers;

use std::collections::BTreeMap;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FetchError;

/// Unit prices by asset symbol, all quoted in one base currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    base_currency: String,
    prices: BTreeMap<String, Decimal>,
}

impl PriceTable {
    pub fn new(base_currency: impl Into<String>) -> Self {
        Self {
            base_currency: base_currency.into().to_uppercase(),
            prices: BTreeMap::new(),
        }
    }

    pub fn with_price(mut self, symbol: impl Into<String>, price: Decimal) -> Self {
        self.insert(symbol, price);
        self
    }

    pub fn insert(&mut self, symbol: impl Into<String>, price: Decimal) {
        self.prices.insert(symbol.into().to_uppercase(), price);
    }

    pub fn get(&self, symbol: &str) -> Option<Decimal> {
        self.prices.get(&symbol.to_uppercase()).copied()
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Decimal)> {
        self.prices.iter()
    }
}

/// The user's display currency and the rate from the price table's base
/// currency into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencySetting {
    pub code: String,
    pub rate: Decimal,
}

impl CurrencySetting {
    pub fn new(code: impl Into<String>, rate: Decimal) -> Self {
        Self {
            code: code.into().to_uppercase(),
            rate,
        }
    }

    /// A currency that the price table is already quoted in.
    pub fn identity(code: impl Into<String>) -> Self {
        Self::new(code, Decimal::ONE)
    }
}

/// Parses a decimal that arrived as a JSON number or a numeric string.
///
/// Numbers go through their shortest decimal text, so `25.48` stays `25.48`
/// instead of picking up binary floating point noise.
pub fn parse_decimal_value(value: &serde_json::Value) -> Result<Option<Decimal>, FetchError> {
    let text = match value {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.trim().to_string(),
        other => {
            return Err(FetchError::invalid_shape(format!(
                "expected a numeric value, got {other}"
            )))
        }
    };
    if text.is_empty() {
        return Ok(None);
    }

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map(Some)
        .map_err(|e| FetchError::invalid_shape(format!("unparseable number {text:?}: {e}")))
}

/// Source of current fiat prices.
#[async_trait::async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetches current prices, quoted in `currency` when the source supports it.
    ///
    /// Callers must check [`PriceTable::base_currency`]: a source may fall back
    /// to its own base currency.
    async fn fetch_prices(&self, currency: &str) -> Result<PriceTable, FetchError>;

    fn name(&self) -> &str;
}

/// Source of fiat exchange rates.
#[async_trait::async_trait]
pub trait FxRateSource: Send + Sync {
    /// Rate that converts one unit of `base` into `quote`.
    async fn fetch_rate(&self, base: &str, quote: &str) -> Result<Decimal, FetchError>;

    fn name(&self) -> &str;
}
