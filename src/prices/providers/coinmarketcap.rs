//! CoinMarketCap v1 ticker price source.
//!
//! `GET /v1/ticker/?limit=0&convert=EUR` returns one object per listed coin
//! with a `symbol` plus `price_usd` and, for non-USD conversions, a
//! `price_eur` style field. Prices may be JSON numbers, numeric strings or
//! null.

use reqwest::Client;
use tracing::debug;

use crate::error::FetchError;
use crate::prices::{parse_decimal_value, PriceSource, PriceTable};

pub const COINMARKETCAP_BASE_URL: &str = "https://api.coinmarketcap.com";
const FALLBACK_CURRENCY: &str = "USD";

#[derive(Debug, Clone)]
pub struct CoinMarketCapTicker {
    client: Client,
    base_url: String,
}

impl CoinMarketCapTicker {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: COINMARKETCAP_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builds a table from the decoded ticker array.
    ///
    /// Uses the `price_{currency}` field when the payload carries it and falls
    /// back to `price_usd` otherwise.
    fn table_from_entries(
        entries: &[serde_json::Value],
        currency: &str,
    ) -> Result<PriceTable, FetchError> {
        let currency = currency.to_uppercase();
        let wanted_field = format!("price_{}", currency.to_lowercase());
        let has_wanted = entries.iter().any(|e| e.get(&wanted_field).is_some());

        let (field, base) = if has_wanted {
            (wanted_field, currency)
        } else if entries.is_empty() || entries.iter().any(|e| e.get("price_usd").is_some()) {
            ("price_usd".to_string(), FALLBACK_CURRENCY.to_string())
        } else {
            return Err(FetchError::invalid_shape(format!(
                "ticker entries carry neither {wanted_field} nor price_usd"
            )));
        };

        let mut table = PriceTable::new(base);
        for entry in entries {
            let Some(symbol) = entry.get("symbol").and_then(|s| s.as_str()) else {
                return Err(FetchError::invalid_shape("ticker entry without a symbol"));
            };
            let Some(raw) = entry.get(&field) else {
                continue;
            };
            match parse_decimal_value(raw)? {
                Some(price) => table.insert(symbol, price),
                None => debug!(symbol, "ticker entry has no price"),
            }
        }
        Ok(table)
    }
}

impl Default for CoinMarketCapTicker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PriceSource for CoinMarketCapTicker {
    async fn fetch_prices(&self, currency: &str) -> Result<PriceTable, FetchError> {
        let currency = currency.to_uppercase();
        let url = format!("{}/v1/ticker/?limit=0&convert={currency}", self.base_url);
        debug!(%url, "fetching ticker prices");

        let entries: Vec<serde_json::Value> = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let table = Self::table_from_entries(&entries, &currency)?;
        debug!(
            prices = table.len(),
            base_currency = table.base_currency(),
            "ticker prices received"
        );
        Ok(table)
    }

    fn name(&self) -> &str {
        "coinmarketcap"
    }
}
