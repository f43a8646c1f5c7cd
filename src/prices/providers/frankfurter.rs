//! Frankfurter FX rate source using ECB daily reference rates.
//!
//! Used when the ticker cannot quote the display currency directly and a
//! price table has to be converted from its base currency.

use std::collections::HashMap;

use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::error::FetchError;
use crate::prices::{parse_decimal_value, FxRateSource};

pub const FRANKFURTER_BASE_URL: &str = "https://api.frankfurter.app";

#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    /// Map of currency codes to rates against the requested base.
    rates: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct FrankfurterRateSource {
    client: Client,
    base_url: String,
}

impl FrankfurterRateSource {
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: FRANKFURTER_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for FrankfurterRateSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl FxRateSource for FrankfurterRateSource {
    async fn fetch_rate(&self, base: &str, quote: &str) -> Result<Decimal, FetchError> {
        let base = base.to_uppercase();
        let quote = quote.to_uppercase();

        if base == quote {
            return Ok(Decimal::ONE);
        }

        let url = format!("{}/latest?from={base}&to={quote}", self.base_url);
        debug!(%url, "fetching fx rate");

        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<FrankfurterResponse>()
            .await?;

        let raw = response
            .rates
            .get(&quote)
            .ok_or_else(|| {
                FetchError::invalid_shape(format!("rate for {quote} missing from response"))
            })?;

        parse_decimal_value(raw)?
            .filter(|rate| *rate > Decimal::ZERO)
            .ok_or_else(|| FetchError::invalid_shape(format!("no usable {base}/{quote} rate")))
    }

    fn name(&self) -> &str {
        "frankfurter"
    }
}
