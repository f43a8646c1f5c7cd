use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::RefreshError;
use crate::models::{Address, BalanceSheet, Network, TransactionRecord};
use crate::prices::{CurrencySetting, PriceTable};

/// Everything a successful balance refresh produced, tagged with the account
/// and network it was fetched for.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedBalances {
    pub address: Address,
    pub network: Network,
    pub balances: BalanceSheet,
    pub prices: PriceTable,
    pub currency: CurrencySetting,
    pub claim: Decimal,
    pub refreshed_at: DateTime<Utc>,
}

/// A state transition. Dispatched to [`super::WalletStore`] and broadcast to
/// subscribers after it has been applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Login(Address),
    Logout,
    SetNetwork(Network),
    LoadingStarted,
    BalancesLoaded(Box<LoadedBalances>),
    LoadingFailed(RefreshError),
    SetCurrency(CurrencySetting),
    SetBlockHeight(u64),
    SetTransactionHistory(Vec<TransactionRecord>),
}
