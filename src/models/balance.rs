use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Asset, GAS_SYMBOL, NEO_SYMBOL};

/// One asset's holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset: Asset,
    pub amount: Decimal,
}

impl AssetBalance {
    pub fn new(asset: Asset, amount: Decimal) -> Self {
        Self { asset, amount }
    }

    pub fn symbol(&self) -> &str {
        self.asset.symbol()
    }
}

/// All balances of one account, keyed by symbol.
///
/// NEO and GAS are always present (zero when the account holds none) and come
/// first; tokens follow in the order they were inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    entries: Vec<AssetBalance>,
}

impl Default for BalanceSheet {
    fn default() -> Self {
        Self::new(Decimal::ZERO, Decimal::ZERO)
    }
}

impl BalanceSheet {
    pub fn new(neo: Decimal, gas: Decimal) -> Self {
        Self {
            entries: vec![
                AssetBalance::new(Asset::Native, neo),
                AssetBalance::new(Asset::Secondary, gas),
            ],
        }
    }

    /// Inserts or replaces the balance for the entry's symbol.
    pub fn insert(&mut self, balance: AssetBalance) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.symbol() == balance.symbol())
        {
            Some(existing) => *existing = balance,
            None => self.entries.push(balance),
        }
    }

    pub fn with(mut self, balance: AssetBalance) -> Self {
        self.insert(balance);
        self
    }

    pub fn get(&self, symbol: &str) -> Option<&AssetBalance> {
        self.entries.iter().find(|b| b.symbol() == symbol)
    }

    pub fn amount(&self, symbol: &str) -> Decimal {
        self.get(symbol).map(|b| b.amount).unwrap_or(Decimal::ZERO)
    }

    pub fn neo(&self) -> Decimal {
        self.amount(NEO_SYMBOL)
    }

    pub fn gas(&self) -> Decimal {
        self.amount(GAS_SYMBOL)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssetBalance> {
        self.entries.iter()
    }

    pub fn tokens(&self) -> impl Iterator<Item = &AssetBalance> {
        self.entries.iter().filter(|b| !b.asset.is_builtin())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Assets that can be sent: those with a strictly positive balance.
    pub fn sendable_assets(&self) -> Vec<AssetBalance> {
        self.entries
            .iter()
            .filter(|b| b.amount > Decimal::ZERO)
            .cloned()
            .collect()
    }
}
