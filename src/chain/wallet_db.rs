//! HTTP chain client backed by a wallet-db indexer plus a node's JSON-RPC.
//!
//! The indexer serves address balances, claims, history and the block height.
//! Token balances come from the node's `getnep5balances` RPC method.

use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::ChainClient;
use crate::error::{FetchError, FetchScope, RefreshError, ScopeExt};
use crate::models::{Address, Network, TokenInfo, TransactionRecord, GAS_SYMBOL, NEO_SYMBOL};
use crate::prices::parse_decimal_value;

/// Claims are reported in the smallest GAS unit.
const CLAIM_SCALE: u32 = 8;

/// Base URLs for one network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainEndpoints {
    pub wallet_db_url: String,
    pub rpc_url: String,
}

impl ChainEndpoints {
    pub fn new(wallet_db_url: impl Into<String>, rpc_url: impl Into<String>) -> Self {
        Self {
            wallet_db_url: wallet_db_url.into().trim_end_matches('/').to_string(),
            rpc_url: rpc_url.into(),
        }
    }

    pub fn mainnet() -> Self {
        Self::new("https://api.wallet.cityofzion.io", "https://seed1.neo.org:10331")
    }

    pub fn testnet() -> Self {
        Self::new(
            "https://testnet-api.wallet.cityofzion.io",
            "https://test1.cityofzion.io:443",
        )
    }
}

#[derive(Debug, Deserialize)]
struct HeightResponse {
    block_height: u64,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    version: String,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct HistoryEntry {
    txid: String,
    block_index: u64,
    #[serde(rename = "NEO", default)]
    neo: Value,
    #[serde(rename = "GAS", default)]
    gas: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Nep5Balances>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Nep5Balances {
    #[serde(default)]
    balance: Vec<Nep5Balance>,
}

#[derive(Debug, Deserialize)]
struct Nep5Balance {
    asset_hash: String,
    amount: Value,
}

fn normalize_hash(hash: &str) -> String {
    hash.trim().trim_start_matches("0x").to_lowercase()
}

/// The same script hash with its byte order flipped. Explorers and RPC nodes
/// disagree on which order to print.
fn reversed_hash(hash: &str) -> String {
    let bytes: Vec<&str> = (0..hash.len())
        .step_by(2)
        .filter_map(|i| hash.get(i..i + 2))
        .collect();
    bytes.into_iter().rev().collect()
}

/// Scales a raw integer token amount down by the token's decimals.
fn scale_token_amount(raw: Decimal, decimals: u32) -> Result<Decimal, FetchError> {
    if !raw.fract().is_zero() {
        return Err(FetchError::invalid_shape(format!(
            "token amount {raw} is not an integer"
        )));
    }
    let mut amount = raw.trunc();
    amount
        .set_scale(decimals)
        .map_err(|e| FetchError::invalid_shape(format!("token decimals {decimals}: {e}")))?;
    Ok(amount)
}

/// Reads `{symbol}.balance` from a balance payload.
fn asset_balance(body: &Value, symbol: &str) -> Result<Decimal, FetchError> {
    let raw = body
        .get(symbol)
        .and_then(|asset| asset.get("balance"))
        .ok_or_else(|| {
            FetchError::invalid_shape(format!("balance payload has no {symbol}.balance"))
        })?;
    Ok(parse_decimal_value(raw)?.unwrap_or(Decimal::ZERO))
}

impl Nep5Balances {
    /// Scaled balance of `token`, matching its hash in either byte order.
    fn amount_of(&self, token: &TokenInfo) -> Result<Decimal, FetchError> {
        let wanted = normalize_hash(&token.script_hash);
        let wanted_reversed = reversed_hash(&wanted);
        let entry = self.balance.iter().find(|b| {
            let hash = normalize_hash(&b.asset_hash);
            hash == wanted || hash == wanted_reversed
        });

        match entry {
            Some(entry) => {
                let raw = parse_decimal_value(&entry.amount)?.unwrap_or(Decimal::ZERO);
                scale_token_amount(raw, token.decimals)
            }
            None => Ok(Decimal::ZERO),
        }
    }
}

pub struct WalletDbClient {
    client: Client,
    mainnet: ChainEndpoints,
    testnet: ChainEndpoints,
}

impl WalletDbClient {
    pub fn new(mainnet: ChainEndpoints, testnet: ChainEndpoints) -> Self {
        Self::with_client(Client::new(), mainnet, testnet)
    }

    pub fn with_client(client: Client, mainnet: ChainEndpoints, testnet: ChainEndpoints) -> Self {
        Self {
            client,
            mainnet,
            testnet,
        }
    }

    fn endpoints(&self, network: Network) -> &ChainEndpoints {
        match network {
            Network::MainNet => &self.mainnet,
            Network::TestNet => &self.testnet,
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        network: Network,
        path: &str,
    ) -> Result<T, FetchError> {
        let url = format!("{}{path}", self.endpoints(network).wallet_db_url);
        debug!(%url, %network, "wallet-db request");
        let value = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;
        Ok(value)
    }

    /// The `/v2/address/balance` payload, holding every native asset.
    async fn fetch_balance_payload(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<Value, FetchError> {
        self.get_json(network, &format!("/v2/address/balance/{address}"))
            .await
    }

    /// Every NEP-5 balance of `address` from one `getnep5balances` call.
    async fn fetch_nep5_balances(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<Nep5Balances, FetchError> {
        let url = &self.endpoints(network).rpc_url;
        debug!(%url, %network, "getnep5balances request");

        let request = json!({
            "jsonrpc": "2.0",
            "method": "getnep5balances",
            "params": [address.as_str()],
            "id": 1,
        });
        let response: RpcResponse = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(FetchError::rejected(format!(
                "getnep5balances failed ({}): {}",
                err.code, err.message
            )));
        }
        response
            .result
            .ok_or_else(|| FetchError::invalid_shape("getnep5balances returned no result"))
    }

    /// Version string reported by the indexer.
    pub async fn node_version(&self, network: Network) -> Result<String, FetchError> {
        let body: VersionResponse = self.get_json(network, "/v2/version").await?;
        Ok(body.version)
    }
}

#[async_trait::async_trait]
impl ChainClient for WalletDbClient {
    async fn fetch_native_balance(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<Decimal, FetchError> {
        let body = self.fetch_balance_payload(address, network).await?;
        asset_balance(&body, NEO_SYMBOL)
    }

    async fn fetch_secondary_balance(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<Decimal, FetchError> {
        let body = self.fetch_balance_payload(address, network).await?;
        asset_balance(&body, GAS_SYMBOL)
    }

    async fn fetch_token_balance(
        &self,
        address: &Address,
        network: Network,
        token: &TokenInfo,
    ) -> Result<Decimal, FetchError> {
        self.fetch_nep5_balances(address, network)
            .await?
            .amount_of(token)
    }

    /// One balance request for both assets. A failed request has no single
    /// asset to blame and is scoped to the network.
    async fn fetch_builtin_balances(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<(Decimal, Decimal), RefreshError> {
        let body = self
            .fetch_balance_payload(address, network)
            .await
            .scoped(FetchScope::Network)?;
        let neo =
            asset_balance(&body, NEO_SYMBOL).scoped(FetchScope::Asset(NEO_SYMBOL.to_string()))?;
        let gas =
            asset_balance(&body, GAS_SYMBOL).scoped(FetchScope::Asset(GAS_SYMBOL.to_string()))?;
        Ok((neo, gas))
    }

    /// One `getnep5balances` call shared by every token.
    async fn fetch_token_balances(
        &self,
        address: &Address,
        network: Network,
        tokens: &[TokenInfo],
    ) -> Result<Vec<Decimal>, RefreshError> {
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        let balances = self
            .fetch_nep5_balances(address, network)
            .await
            .scoped(FetchScope::Network)?;
        tokens
            .iter()
            .map(|token| {
                balances
                    .amount_of(token)
                    .scoped(FetchScope::Asset(token.symbol.clone()))
            })
            .collect()
    }

    async fn fetch_claimable(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<Decimal, FetchError> {
        let body: Value = self
            .get_json(network, &format!("/v2/address/claims/{address}"))
            .await?;
        let raw = body
            .get("total_claim")
            .ok_or_else(|| FetchError::invalid_shape("claims payload has no total_claim"))?;
        let raw = parse_decimal_value(raw)?.unwrap_or(Decimal::ZERO);
        scale_token_amount(raw, CLAIM_SCALE)
    }

    async fn fetch_block_height(&self, network: Network) -> Result<u64, FetchError> {
        let body: HeightResponse = self.get_json(network, "/v2/block/height").await?;
        Ok(body.block_height)
    }

    async fn fetch_transaction_history(
        &self,
        address: &Address,
        network: Network,
    ) -> Result<Vec<TransactionRecord>, FetchError> {
        let body: HistoryResponse = self
            .get_json(network, &format!("/v2/address/history/{address}"))
            .await?;

        body.history
            .into_iter()
            .map(|entry| {
                Ok(TransactionRecord {
                    txid: entry.txid,
                    block_index: entry.block_index,
                    neo_delta: parse_decimal_value(&entry.neo)?.unwrap_or(Decimal::ZERO),
                    gas_delta: parse_decimal_value(&entry.gas)?.unwrap_or(Decimal::ZERO),
                })
            })
            .collect()
    }

    fn name(&self) -> &str {
        "wallet-db"
    }
}
