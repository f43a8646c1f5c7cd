#![allow(dead_code)]

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Notify;
use walletsum::chain::ChainClient;
use walletsum::clock::FixedClock;
use walletsum::error::FetchError;
use walletsum::models::{Address, Network, TokenInfo, TransactionRecord};
use walletsum::notifications::NotificationLog;
use walletsum::prices::{FxRateSource, PriceSource, PriceTable};
use walletsum::settings::{Settings, SettingsPatch, SettingsStore};
use walletsum::state::WalletStore;
use walletsum::wallet::BalanceAggregator;

pub const ADDRESS: &str = "ANqUrhv99rwCiFTL6N1An9NH5UVkPYxTuw";

pub fn address() -> Address {
    Address::parse(ADDRESS).unwrap()
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn fixed_now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2024-01-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

/// Chain stub with per-call counters, injectable failures and an optional
/// gate that holds the NEO balance call until released.
#[derive(Default)]
pub struct MockChain {
    neo: Decimal,
    gas: Decimal,
    tokens: HashMap<String, Decimal>,
    claim: Decimal,
    block_height: u64,
    history: Vec<TransactionRecord>,
    failures: Mutex<HashMap<String, FetchError>>,
    gate: Option<Arc<Notify>>,
    pub native_calls: AtomicUsize,
    pub secondary_calls: AtomicUsize,
    pub token_calls: AtomicUsize,
    pub claim_calls: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balances(mut self, neo: &str, gas: &str) -> Self {
        self.neo = dec(neo);
        self.gas = dec(gas);
        self
    }

    pub fn with_token(mut self, symbol: &str, amount: &str) -> Self {
        self.tokens.insert(symbol.to_string(), dec(amount));
        self
    }

    pub fn with_claim(mut self, claim: &str) -> Self {
        self.claim = dec(claim);
        self
    }

    pub fn with_block_height(mut self, height: u64) -> Self {
        self.block_height = height;
        self
    }

    pub fn with_history(mut self, history: Vec<TransactionRecord>) -> Self {
        self.history = history;
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Makes calls for `key` fail. Keys: an asset symbol, "claim", "height".
    pub fn fail(&self, key: &str, err: FetchError) {
        self.failures.lock().unwrap().insert(key.to_string(), err);
    }

    pub fn heal(&self) {
        self.failures.lock().unwrap().clear();
    }

    fn check(&self, key: &str) -> Result<(), FetchError> {
        match self.failures.lock().unwrap().get(key) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn total_calls(&self) -> usize {
        self.native_calls.load(Ordering::SeqCst)
            + self.secondary_calls.load(Ordering::SeqCst)
            + self.token_calls.load(Ordering::SeqCst)
            + self.claim_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn fetch_native_balance(&self, _: &Address, _: Network) -> Result<Decimal, FetchError> {
        self.native_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.check("NEO")?;
        Ok(self.neo)
    }

    async fn fetch_secondary_balance(
        &self,
        _: &Address,
        _: Network,
    ) -> Result<Decimal, FetchError> {
        self.secondary_calls.fetch_add(1, Ordering::SeqCst);
        self.check("GAS")?;
        Ok(self.gas)
    }

    async fn fetch_token_balance(
        &self,
        _: &Address,
        _: Network,
        token: &TokenInfo,
    ) -> Result<Decimal, FetchError> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        self.check(&token.symbol)?;
        Ok(self.tokens.get(&token.symbol).copied().unwrap_or_default())
    }

    async fn fetch_claimable(&self, _: &Address, _: Network) -> Result<Decimal, FetchError> {
        self.claim_calls.fetch_add(1, Ordering::SeqCst);
        self.check("claim")?;
        Ok(self.claim)
    }

    async fn fetch_block_height(&self, _: Network) -> Result<u64, FetchError> {
        self.check("height")?;
        Ok(self.block_height)
    }

    async fn fetch_transaction_history(
        &self,
        _: &Address,
        _: Network,
    ) -> Result<Vec<TransactionRecord>, FetchError> {
        self.check("height")?;
        Ok(self.history.clone())
    }

    fn name(&self) -> &str {
        "mock-chain"
    }
}

/// Price source returning a fixed table, or a configured error.
pub struct MockPrices {
    table: Mutex<PriceTable>,
    failure: Mutex<Option<FetchError>>,
    pub calls: AtomicUsize,
    pub requested: Mutex<Vec<String>>,
}

impl MockPrices {
    pub fn new(table: PriceTable) -> Self {
        Self {
            table: Mutex::new(table),
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn usd(neo: &str, gas: &str) -> Self {
        Self::new(
            PriceTable::new("USD")
                .with_price("NEO", dec(neo))
                .with_price("GAS", dec(gas)),
        )
    }

    pub fn set_table(&self, table: PriceTable) {
        *self.table.lock().unwrap() = table;
    }

    pub fn fail_with(&self, err: FetchError) {
        *self.failure.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl PriceSource for MockPrices {
    async fn fetch_prices(&self, currency: &str) -> Result<PriceTable, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().unwrap().push(currency.to_string());
        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.table.lock().unwrap().clone())
    }

    fn name(&self) -> &str {
        "mock-prices"
    }
}

/// FX source returning a fixed rate, or a configured error.
pub struct MockFx {
    rate: Decimal,
    failure: Mutex<Option<FetchError>>,
    pub calls: AtomicUsize,
}

impl MockFx {
    pub fn new(rate: &str) -> Self {
        Self {
            rate: dec(rate),
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_with(&self, err: FetchError) {
        *self.failure.lock().unwrap() = Some(err);
    }
}

#[async_trait]
impl FxRateSource for MockFx {
    async fn fetch_rate(&self, _base: &str, _quote: &str) -> Result<Decimal, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.rate)
    }

    fn name(&self) -> &str {
        "mock-fx"
    }
}

/// Settings store whose reads always fail.
pub struct UnreadableSettingsStore;

#[async_trait]
impl SettingsStore for UnreadableSettingsStore {
    async fn load(&self) -> Result<Option<SettingsPatch>, FetchError> {
        Err(FetchError::StorageReadFailure("disk unavailable".to_string()))
    }

    async fn save(&self, _settings: &Settings) -> Result<()> {
        anyhow::bail!("disk unavailable")
    }
}

/// An aggregator wired to the given doubles plus a fresh store, a
/// notification log and a fixed clock.
pub struct Harness {
    pub aggregator: BalanceAggregator,
    pub store: Arc<WalletStore>,
    pub notifications: Arc<NotificationLog>,
}

pub fn harness(
    chain: Arc<MockChain>,
    prices: Arc<MockPrices>,
    settings: Arc<dyn SettingsStore>,
    fx: Arc<MockFx>,
) -> Harness {
    let store = Arc::new(WalletStore::default());
    let notifications = Arc::new(NotificationLog::new());
    let aggregator =
        BalanceAggregator::new(chain, prices, settings, notifications.clone(), store.clone())
            .with_fx_source(fx)
            .with_clock(Arc::new(FixedClock::new(fixed_now())));
    Harness {
        aggregator,
        store,
        notifications,
    }
}
