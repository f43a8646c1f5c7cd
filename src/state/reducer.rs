use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use super::{Action, LoadedBalances};
use crate::error::RefreshError;
use crate::models::{Address, BalanceSheet, Network, TransactionRecord};
use crate::prices::{CurrencySetting, PriceTable};
use crate::settings::DEFAULT_CURRENCY_CODE;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefreshState {
    pub is_loading: bool,
    /// Session the in-flight refresh was started in.
    pub started_in: u64,
    pub last_error: Option<RefreshError>,
    pub last_refreshed: Option<DateTime<Utc>>,
}

/// State of the logged-in wallet as the UI sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletState {
    pub account: Option<Address>,
    pub network: Network,
    pub balances: BalanceSheet,
    pub prices: Option<PriceTable>,
    pub currency: CurrencySetting,
    pub claim: Decimal,
    pub block_height: Option<u64>,
    pub transactions: Vec<TransactionRecord>,
    /// Bumped on every login, logout and network switch.
    #[serde(skip)]
    pub session: u64,
    #[serde(skip)]
    pub refresh: RefreshState,
}

impl Default for WalletState {
    fn default() -> Self {
        Self {
            account: None,
            network: Network::default(),
            balances: BalanceSheet::default(),
            prices: None,
            currency: CurrencySetting::identity(DEFAULT_CURRENCY_CODE),
            claim: Decimal::ZERO,
            block_height: None,
            transactions: Vec::new(),
            session: 0,
            refresh: RefreshState::default(),
        }
    }
}

impl WalletState {
    pub fn is_loading(&self) -> bool {
        self.refresh.is_loading
    }

    /// Fresh session on `network`. The display currency and the loading flag
    /// survive; a refresh still in flight stays the only one.
    fn cleared(self, network: Network) -> Self {
        Self {
            network,
            currency: self.currency,
            session: self.session.wrapping_add(1),
            refresh: self.refresh,
            ..Self::default()
        }
    }

    /// True when a refresh result belongs to the current session, network and
    /// account.
    fn accepts(&self, loaded: &LoadedBalances) -> bool {
        self.refresh.started_in == self.session
            && self.network == loaded.network
            && self
                .account
                .as_ref()
                .map_or(true, |account| *account == loaded.address)
    }

    fn finish_loading(self) -> Self {
        Self {
            refresh: RefreshState {
                is_loading: false,
                ..self.refresh
            },
            ..self
        }
    }
}

/// Applies one action. Pure: same inputs, same output.
pub fn reduce(state: WalletState, action: &Action) -> WalletState {
    match action {
        Action::Login(address) => {
            let network = state.network;
            WalletState {
                account: Some(address.clone()),
                ..state.cleared(network)
            }
        }
        Action::Logout => {
            let network = state.network;
            state.cleared(network)
        }
        Action::SetNetwork(network) if *network == state.network => state,
        Action::SetNetwork(network) => {
            let account = state.account.clone();
            WalletState {
                account,
                ..state.cleared(*network)
            }
        }
        Action::LoadingStarted => WalletState {
            refresh: RefreshState {
                is_loading: true,
                started_in: state.session,
                ..state.refresh
            },
            ..state
        },
        Action::BalancesLoaded(loaded) if !state.accepts(loaded) => state.finish_loading(),
        Action::BalancesLoaded(loaded) => WalletState {
            balances: loaded.balances.clone(),
            prices: Some(loaded.prices.clone()),
            currency: loaded.currency.clone(),
            claim: loaded.claim,
            refresh: RefreshState {
                is_loading: false,
                started_in: state.refresh.started_in,
                last_error: None,
                last_refreshed: Some(loaded.refreshed_at),
            },
            ..state
        },
        Action::LoadingFailed(_) if state.refresh.started_in != state.session => {
            state.finish_loading()
        }
        Action::LoadingFailed(error) => WalletState {
            refresh: RefreshState {
                is_loading: false,
                last_error: Some(error.clone()),
                ..state.refresh
            },
            ..state
        },
        Action::SetCurrency(currency) => WalletState {
            currency: currency.clone(),
            ..state
        },
        Action::SetBlockHeight(height) => WalletState {
            block_height: Some(*height),
            ..state
        },
        Action::SetTransactionHistory(transactions) => WalletState {
            transactions: transactions.clone(),
            ..state
        },
    }
}
