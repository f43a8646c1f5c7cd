use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{FetchError, FetchScope, RefreshError};
use crate::format::{format_asset_amount, format_currency_amount};
use crate::models::{Asset, AssetBalance, BalanceSheet};
use crate::prices::{CurrencySetting, PriceTable};

/// One asset line of the wallet view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetValue {
    pub asset: Asset,
    pub amount: Decimal,
    pub amount_display: String,
    /// Unit price in the display currency. Zero when the price table has no
    /// entry for the asset.
    pub price: Decimal,
    /// `amount × price × rate`, unrounded.
    pub fiat_value: Decimal,
    pub fiat_display: String,
}

impl AssetValue {
    pub fn symbol(&self) -> &str {
        self.asset.symbol()
    }
}

/// Derived view of balances in the display currency.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayModel {
    pub currency: String,
    pub assets: Vec<AssetValue>,
}

impl DisplayModel {
    pub fn get(&self, symbol: &str) -> Option<&AssetValue> {
        self.assets.iter().find(|a| a.symbol() == symbol)
    }

    /// Sum of the unrounded per-asset values. Always computed from the lines.
    pub fn total(&self) -> Decimal {
        self.assets
            .iter()
            .fold(Decimal::ZERO, |acc, a| acc.saturating_add(a.fiat_value))
    }

    pub fn total_display(&self) -> String {
        format_currency_amount(self.total(), &self.currency)
    }
}

fn overflow(balance: &AssetBalance) -> RefreshError {
    RefreshError::new(
        FetchScope::Asset(balance.symbol().to_string()),
        FetchError::invalid_shape(format!(
            "value of {} {} is out of range",
            balance.amount,
            balance.symbol()
        )),
    )
}

/// Values every balance at `price × rate`.
///
/// No rounding happens here; rounding to 2 places is a display concern and is
/// applied to each formatted string and to the total independently. Amounts
/// or prices too large to multiply fail with an invalid-response error scoped
/// to the asset.
pub fn compute_display_model(
    balances: &BalanceSheet,
    prices: &PriceTable,
    currency: &CurrencySetting,
) -> Result<DisplayModel, RefreshError> {
    let mut total = Decimal::ZERO;
    let mut assets = Vec::with_capacity(balances.len());
    for balance in balances.iter() {
        let unit_price = prices.get(balance.symbol()).unwrap_or(Decimal::ZERO);
        let price = unit_price
            .checked_mul(currency.rate)
            .ok_or_else(|| overflow(balance))?;
        let fiat_value = balance
            .amount
            .checked_mul(unit_price)
            .and_then(|value| value.checked_mul(currency.rate))
            .ok_or_else(|| overflow(balance))?;
        total = total
            .checked_add(fiat_value)
            .ok_or_else(|| overflow(balance))?;
        assets.push(AssetValue {
            asset: balance.asset.clone(),
            amount: balance.amount,
            amount_display: format_asset_amount(balance.amount, &balance.asset),
            price,
            fiat_value,
            fiat_display: format_currency_amount(fiat_value, &currency.code),
        });
    }

    Ok(DisplayModel {
        currency: currency.code.clone(),
        assets,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::round_fiat;
    use crate::models::TokenInfo;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn usd() -> CurrencySetting {
        CurrencySetting::identity("USD")
    }

    fn fixture_balances() -> BalanceSheet {
        BalanceSheet::new(dec("100001"), dec("1000.0001601"))
    }

    #[test]
    fn usd_fixture() {
        let prices = PriceTable::new("USD")
            .with_price("NEO", dec("25.48"))
            .with_price("GAS", dec("18.1"));
        let model = compute_display_model(&fixture_balances(), &prices, &usd()).unwrap();

        let neo = model.get("NEO").unwrap();
        let gas = model.get("GAS").unwrap();
        assert_eq!(neo.fiat_display, "$2,548,025.48 USD");
        assert_eq!(gas.fiat_display, "$18,100.00 USD");
        assert_eq!(model.total_display(), "$2,566,125.48 USD");
        assert_eq!(neo.amount_display, "100,001");
        assert_eq!(gas.amount_display, "1,000.0001");
    }

    #[test]
    fn eur_fixture() {
        let prices = PriceTable::new("EUR")
            .with_price("NEO", dec("1.11"))
            .with_price("GAS", dec("0.55"));
        let eur = CurrencySetting::identity("eur");
        let model = compute_display_model(&fixture_balances(), &prices, &eur).unwrap();

        assert_eq!(model.get("NEO").unwrap().fiat_display, "€111,001.11 EUR");
        assert_eq!(model.get("GAS").unwrap().fiat_display, "€550.00 EUR");
        assert_eq!(model.total_display(), "€111,551.11 EUR");
    }

    #[test]
    fn gas_value_uses_full_precision_amount() {
        let prices = PriceTable::new("USD").with_price("GAS", dec("18.1"));
        let model = compute_display_model(&fixture_balances(), &prices, &usd()).unwrap();
        assert_eq!(model.get("GAS").unwrap().fiat_value, dec("18100.00289781"));
    }

    #[test]
    fn total_rounds_once_after_summing() {
        // Each line rounds down on its own (0.004 -> 0.00); the sum does not.
        let a = Asset::token(&TokenInfo::new("AAA", "aa", "1"));
        let b = Asset::token(&TokenInfo::new("BBB", "bb", "1"));
        let balances = BalanceSheet::new(Decimal::ZERO, Decimal::ZERO)
            .with(AssetBalance::new(a, dec("1")))
            .with(AssetBalance::new(b, dec("1")));
        let prices = PriceTable::new("USD")
            .with_price("AAA", dec("0.004"))
            .with_price("BBB", dec("0.004"));
        let model = compute_display_model(&balances, &prices, &usd()).unwrap();

        assert_eq!(model.get("AAA").unwrap().fiat_display, "$0.00 USD");
        assert_eq!(model.total(), dec("0.008"));
        assert_eq!(model.total_display(), "$0.01 USD");
        let per_line_rounded: Decimal =
            model.assets.iter().map(|a| round_fiat(a.fiat_value)).sum();
        assert_eq!(per_line_rounded, Decimal::ZERO);
    }

    #[test]
    fn exchange_rate_scales_prices_and_values() {
        let prices = PriceTable::new("USD").with_price("NEO", dec("10"));
        let currency = CurrencySetting::new("EUR", dec("0.9"));
        let balances = BalanceSheet::new(dec("3"), Decimal::ZERO);
        let model = compute_display_model(&balances, &prices, &currency).unwrap();

        let neo = model.get("NEO").unwrap();
        assert_eq!(neo.price, dec("9"));
        assert_eq!(neo.fiat_value, dec("27"));
        assert_eq!(model.total_display(), "€27.00 EUR");
    }

    #[test]
    fn unpriced_assets_are_worth_zero() {
        let prices = PriceTable::new("USD");
        let model = compute_display_model(&fixture_balances(), &prices, &usd()).unwrap();
        assert_eq!(model.total(), Decimal::ZERO);
        assert_eq!(model.get("GAS").unwrap().fiat_display, "$0.00 USD");
    }

    #[test]
    fn identical_inputs_identical_outputs() {
        let prices = PriceTable::new("USD").with_price("NEO", dec("25.48"));
        let currency = CurrencySetting::identity("USD");
        let first = compute_display_model(&fixture_balances(), &prices, &currency).unwrap();
        let second = compute_display_model(&fixture_balances(), &prices, &currency).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn out_of_range_value_is_an_invalid_response() {
        let whale = Asset::token(&TokenInfo::new("WHL", "cc", "1"));
        let balances = BalanceSheet::default().with(AssetBalance::new(whale, Decimal::MAX));
        let prices = PriceTable::new("USD").with_price("WHL", dec("1000"));

        let err = compute_display_model(&balances, &prices, &usd()).unwrap_err();
        assert_eq!(err.scope, FetchScope::Asset("WHL".to_string()));
        assert_eq!(err.source.kind(), "invalid_response_shape");
    }
}
