use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::display::{compute_display_model, DisplayModel};
use crate::chain::ChainClient;
use crate::clock::{Clock, SystemClock};
use crate::error::{FetchError, FetchScope, RefreshError, ScopeExt};
use crate::models::{Address, Asset, AssetBalance, BalanceSheet, Network, TokenInfo};
use crate::notifications::{Notification, NotificationSink};
use crate::prices::providers::FrankfurterRateSource;
use crate::prices::{CurrencySetting, FxRateSource, PriceSource, PriceTable};
use crate::settings::{
    is_valid_currency_code, load_settings, symbol_collision, update_settings, SettingsPatch,
    SettingsStore,
};
use crate::state::{Action, LoadedBalances, WalletStore};

/// Message of the success notification emitted after a refresh.
pub const REFRESH_SUCCESS_MESSAGE: &str = "Received latest blockchain information.";

/// Shortest interval [`BalanceAggregator::watch`] will tick at.
pub const MIN_WATCH_INTERVAL: Duration = Duration::from_secs(1);

/// Result of one call to [`BalanceAggregator::refresh_balances`].
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    Refreshed(DisplayModel),
    /// Another refresh was in flight; nothing was fetched or dispatched.
    Skipped,
    Failed(RefreshError),
}

impl RefreshOutcome {
    pub fn is_refreshed(&self) -> bool {
        matches!(self, RefreshOutcome::Refreshed(_))
    }
}

/// Counts from a [`BalanceAggregator::watch`] run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub refreshed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Settings read at the start of a refresh. Lives for that refresh only.
struct RefreshContext {
    tokens: Vec<TokenInfo>,
    currency_code: String,
}

impl RefreshContext {
    async fn load(store: &dyn SettingsStore, network: Network) -> Result<Self, RefreshError> {
        let settings = load_settings(store).await.scoped(FetchScope::Settings)?;
        let tokens = settings.tokens_for(network);
        if let Some(token) = symbol_collision(&tokens) {
            return Err(RefreshError::new(
                FetchScope::Settings,
                FetchError::invalid_shape(format!(
                    "token symbol {} is configured more than once",
                    token.symbol
                )),
            ));
        }
        let context = Self {
            tokens,
            currency_code: settings.currency.to_ascii_uppercase(),
        };
        debug!(
            tokens = context.tokens.len(),
            currency = %context.currency_code,
            "loaded refresh settings"
        );
        Ok(context)
    }
}

fn settings_error(err: anyhow::Error) -> RefreshError {
    RefreshError::new(FetchScope::Settings, FetchError::rejected(format!("{err:#}")))
}

/// Fetches balances, claimable GAS and prices for one address and publishes
/// the combined result to the [`WalletStore`].
pub struct BalanceAggregator {
    chain: Arc<dyn ChainClient>,
    prices: Arc<dyn PriceSource>,
    fx: Arc<dyn FxRateSource>,
    settings: Arc<dyn SettingsStore>,
    notifications: Arc<dyn NotificationSink>,
    store: Arc<WalletStore>,
    clock: Arc<dyn Clock>,
}

impl BalanceAggregator {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        prices: Arc<dyn PriceSource>,
        settings: Arc<dyn SettingsStore>,
        notifications: Arc<dyn NotificationSink>,
        store: Arc<WalletStore>,
    ) -> Self {
        Self {
            chain,
            prices,
            fx: Arc::new(FrankfurterRateSource::new()),
            settings,
            notifications,
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_fx_source(mut self, fx: Arc<dyn FxRateSource>) -> Self {
        self.fx = fx;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &Arc<WalletStore> {
        &self.store
    }

    /// Refreshes every balance, the claimable amount and prices.
    ///
    /// If a refresh is already in flight this returns [`RefreshOutcome::Skipped`]
    /// without touching the network, the store or the notification sink.
    /// Otherwise exactly one notification is emitted: success, or an error
    /// naming the scope that failed. Either all fetched values are published
    /// or none are. Results are tagged with `address` and `network`; the store
    /// drops them if the session changed while they were being fetched.
    pub async fn refresh_balances(&self, address: &Address, network: Network) -> RefreshOutcome {
        // Check-and-set happens before the first await.
        if !self.store.try_begin_loading() {
            debug!(%address, %network, "refresh already in flight, skipping");
            return RefreshOutcome::Skipped;
        }

        info!(%address, %network, "refreshing balances");
        let result = self.fetch_all(address, network).await.and_then(|loaded| {
            let model = compute_display_model(&loaded.balances, &loaded.prices, &loaded.currency)?;
            Ok((loaded, model))
        });
        match result {
            Ok((loaded, model)) => {
                info!(
                    %address,
                    assets = loaded.balances.len(),
                    currency = %loaded.currency.code,
                    total = %model.total_display(),
                    "balances refreshed"
                );
                self.store.dispatch(Action::BalancesLoaded(Box::new(loaded)));
                self.notifications
                    .notify(Notification::success(REFRESH_SUCCESS_MESSAGE, self.clock.now()));
                RefreshOutcome::Refreshed(model)
            }
            Err(err) => {
                warn!(
                    %address,
                    scope = %err.scope,
                    kind = err.source.kind(),
                    error = %err.source,
                    "balance refresh failed"
                );
                self.store.dispatch(Action::LoadingFailed(err.clone()));
                self.report(&err);
                RefreshOutcome::Failed(err)
            }
        }
    }

    async fn fetch_all(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<LoadedBalances, RefreshError> {
        let RefreshContext {
            tokens,
            currency_code,
        } = RefreshContext::load(self.settings.as_ref(), network).await?;

        let chain = self.chain.as_ref();
        let balances = async {
            let ((neo, gas), amounts) = futures::try_join!(
                chain.fetch_builtin_balances(address, network),
                chain.fetch_token_balances(address, network, &tokens),
            )?;
            if amounts.len() != tokens.len() {
                return Err(RefreshError::new(
                    FetchScope::Network,
                    FetchError::invalid_shape(format!(
                        "{} returned {} token balances for {} tokens",
                        chain.name(),
                        amounts.len(),
                        tokens.len()
                    )),
                ));
            }
            let mut sheet = BalanceSheet::new(neo, gas);
            for (token, amount) in tokens.iter().zip(amounts) {
                sheet.insert(AssetBalance::new(Asset::token(token), amount));
            }
            Ok::<_, RefreshError>(sheet)
        };
        let claim = async {
            chain
                .fetch_claimable(address, network)
                .await
                .scoped(FetchScope::Network)
        };
        let prices = async {
            self.prices
                .fetch_prices(&currency_code)
                .await
                .scoped(FetchScope::Prices)
        };

        let (balances, claim, prices) = futures::try_join!(balances, claim, prices)?;
        let currency = self.resolve_currency(&prices, &currency_code).await?;

        Ok(LoadedBalances {
            address: address.clone(),
            network,
            balances,
            prices,
            currency,
            claim,
            refreshed_at: self.clock.now(),
        })
    }

    /// Rate converting the table's base currency into `code`.
    async fn resolve_currency(
        &self,
        prices: &PriceTable,
        code: &str,
    ) -> Result<CurrencySetting, RefreshError> {
        if prices.base_currency().eq_ignore_ascii_case(code) {
            return Ok(CurrencySetting::identity(code));
        }
        debug!(
            base = prices.base_currency(),
            quote = code,
            source = self.fx.name(),
            "converting prices"
        );
        let rate = self
            .fx
            .fetch_rate(prices.base_currency(), code)
            .await
            .scoped(FetchScope::Prices)?;
        Ok(CurrencySetting::new(code, rate))
    }

    fn report(&self, err: &RefreshError) {
        self.notifications
            .notify(Notification::error(err.user_message(), self.clock.now()).with_title("Error"));
    }

    /// Display model for the current state, or `None` before the first
    /// successful refresh.
    pub fn display_model(&self) -> Option<DisplayModel> {
        let state = self.store.snapshot();
        let prices = state.prices.as_ref()?;
        match compute_display_model(&state.balances, prices, &state.currency) {
            Ok(model) => Some(model),
            Err(err) => {
                warn!(error = %err, "stored balances cannot be valued");
                None
            }
        }
    }

    /// Assets with a positive balance.
    pub fn sendable_assets(&self) -> Vec<AssetBalance> {
        self.store.snapshot().balances.sendable_assets()
    }

    /// Claimable GAS from the last successful refresh.
    pub fn claimable(&self) -> Decimal {
        self.store.snapshot().claim
    }

    /// Switches the display currency and re-values the held balances.
    ///
    /// When the stored price table is quoted in another currency, the FX
    /// source supplies the conversion; no balances are refetched. The new
    /// code is persisted only once the conversion is known, so a failure
    /// leaves settings and store on the old currency.
    pub async fn change_currency(&self, code: &str) -> Result<Option<DisplayModel>, RefreshError> {
        let code = code.trim().to_ascii_uppercase();
        match self.apply_currency(&code).await {
            Ok(model) => {
                info!(currency = %code, "display currency changed");
                Ok(model)
            }
            Err(err) => {
                warn!(
                    currency = %code,
                    scope = %err.scope,
                    error = %err.source,
                    "currency change failed"
                );
                self.report(&err);
                Err(err)
            }
        }
    }

    async fn apply_currency(&self, code: &str) -> Result<Option<DisplayModel>, RefreshError> {
        if !is_valid_currency_code(code) {
            return Err(RefreshError::new(
                FetchScope::Settings,
                FetchError::rejected(format!(
                    "Invalid currency code {code:?}: expected three letters like USD"
                )),
            ));
        }

        let state = self.store.snapshot();
        let (currency, model) = match &state.prices {
            Some(prices) => {
                let currency = self.resolve_currency(prices, code).await?;
                let model = compute_display_model(&state.balances, prices, &currency)?;
                (currency, Some(model))
            }
            None => (CurrencySetting::identity(code), None),
        };

        update_settings(self.settings.as_ref(), SettingsPatch::currency(code))
            .await
            .map_err(settings_error)?;
        self.store.dispatch(Action::SetCurrency(currency));
        Ok(model)
    }

    /// Fetches block height and transaction history. Independent of the
    /// loading flag; failures notify once and leave state unchanged.
    pub async fn sync_chain_metadata(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<(), RefreshError> {
        let chain = self.chain.as_ref();
        let height = async {
            chain
                .fetch_block_height(network)
                .await
                .scoped(FetchScope::Network)
        };
        let history = async {
            chain
                .fetch_transaction_history(address, network)
                .await
                .scoped(FetchScope::Network)
        };

        match futures::try_join!(height, history) {
            Ok((height, history)) => {
                debug!(%network, height, transactions = history.len(), "chain metadata synced");
                self.store.dispatch(Action::SetBlockHeight(height));
                self.store.dispatch(Action::SetTransactionHistory(history));
                Ok(())
            }
            Err(err) => {
                warn!(%network, error = %err, "chain metadata sync failed");
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Refreshes on a fixed interval until `shutdown` resolves. The first
    /// refresh runs immediately; ticks missed while a refresh runs are skipped.
    /// Intervals shorter than [`MIN_WATCH_INTERVAL`] are raised to it.
    pub async fn watch<F>(
        &self,
        address: &Address,
        network: Network,
        every: Duration,
        shutdown: F,
    ) -> WatchSummary
    where
        F: Future<Output = ()>,
    {
        if every < MIN_WATCH_INTERVAL {
            warn!(requested = ?every, "watch interval too short, using the minimum");
        }
        let every = every.max(MIN_WATCH_INTERVAL);
        let mut summary = WatchSummary::default();
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(%address, %network, interval = ?every, "watching balances");
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {
                    match self.refresh_balances(address, network).await {
                        RefreshOutcome::Refreshed(_) => summary.refreshed += 1,
                        RefreshOutcome::Skipped => summary.skipped += 1,
                        RefreshOutcome::Failed(_) => summary.failed += 1,
                    }
                }
            }
        }
        info!(?summary, "stopped watching balances");
        summary
    }
}
