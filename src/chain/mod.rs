//! Blockchain access: balances, claims, block height and history.

mod wallet_db;

pub use wallet_db::{ChainEndpoints, WalletDbClient};

use futures::future::try_join_all;
use rust_decimal::Decimal;

use crate::error::{FetchError, FetchScope, RefreshError, ScopeExt};
use crate::models::{Address, Network, TokenInfo, TransactionRecord, GAS_SYMBOL, NEO_SYMBOL};

/// Read-only view of the chain for one address.
///
/// Every call is independent; implementations must not rely on being called
/// in any particular order.
#[async_trait::async_trait]
pub trait ChainClient: Send + Sync {
    /// NEO held by `address`. Whole units.
    async fn fetch_native_balance(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<Decimal, FetchError>;

    /// GAS held by `address`.
    async fn fetch_secondary_balance(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<Decimal, FetchError>;

    /// Balance of one configured token. Zero when the address never held it.
    async fn fetch_token_balance(
        &self,
        address: &Address,
        network: Network,
        token: &TokenInfo,
    ) -> Result<Decimal, FetchError>;

    /// NEO and GAS together, as `(neo, gas)`.
    ///
    /// The default issues both single-asset queries concurrently. Backends
    /// that serve both from one payload override this so the pair comes from
    /// one snapshot.
    async fn fetch_builtin_balances(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<(Decimal, Decimal), RefreshError> {
        let neo = async {
            self.fetch_native_balance(address, network)
                .await
                .scoped(FetchScope::Asset(NEO_SYMBOL.to_string()))
        };
        let gas = async {
            self.fetch_secondary_balance(address, network)
                .await
                .scoped(FetchScope::Asset(GAS_SYMBOL.to_string()))
        };
        futures::try_join!(neo, gas)
    }

    /// Balances of `tokens`, in the same order.
    ///
    /// The default issues one query per token concurrently.
    async fn fetch_token_balances(
        &self,
        address: &Address,
        network: Network,
        tokens: &[TokenInfo],
    ) -> Result<Vec<Decimal>, RefreshError> {
        try_join_all(tokens.iter().map(|token| async move {
            self.fetch_token_balance(address, network, token)
                .await
                .scoped(FetchScope::Asset(token.symbol.clone()))
        }))
        .await
    }

    /// GAS that can be claimed but is not yet spendable.
    async fn fetch_claimable(&self, address: &Address, network: Network)
        -> Result<Decimal, FetchError>;

    async fn fetch_block_height(&self, network: Network) -> Result<u64, FetchError>;

    async fn fetch_transaction_history(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<Vec<TransactionRecord>, FetchError>;

    fn name(&self) -> &str;
}
