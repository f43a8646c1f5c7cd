mod support;

use anyhow::Result;
use serde_json::json;
use walletsum::chain::{ChainClient, ChainEndpoints, WalletDbClient};
use walletsum::error::{FetchError, FetchScope};
use walletsum::models::{Network, TokenInfo};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{address, dec, ADDRESS};

fn client_for(server: &MockServer) -> WalletDbClient {
    let endpoints = ChainEndpoints::new(server.uri(), format!("{}/rpc", server.uri()));
    WalletDbClient::new(endpoints.clone(), endpoints)
}

fn rpx() -> TokenInfo {
    TokenInfo::new("RPX", "0x5b7074e873973a6ed3708862f219a6fbf4d1c411", Network::TestNet.id())
}

#[tokio::test]
async fn reads_neo_and_gas_balances() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/address/balance/{ADDRESS}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "GAS": { "balance": 1000.0001601, "unspent": [] },
            "NEO": { "balance": 100001, "unspent": [] },
            "address": ADDRESS,
            "net": "TestNet"
        })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.fetch_native_balance(&address(), Network::TestNet).await?, dec("100001"));
    assert_eq!(
        client.fetch_secondary_balance(&address(), Network::TestNet).await?,
        dec("1000.0001601")
    );
    Ok(())
}

#[tokio::test]
async fn neo_and_gas_come_from_one_request() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/address/balance/{ADDRESS}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "GAS": { "balance": 1000.0001601, "unspent": [] },
            "NEO": { "balance": 100001, "unspent": [] },
            "address": ADDRESS,
            "net": "TestNet"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (neo, gas) = client_for(&server)
        .fetch_builtin_balances(&address(), Network::TestNet)
        .await?;
    assert_eq!(neo, dec("100001"));
    assert_eq!(gas, dec("1000.0001601"));
    Ok(())
}

#[tokio::test]
async fn failed_balance_request_is_scoped_to_the_network() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_builtin_balances(&address(), Network::TestNet)
        .await
        .unwrap_err();
    assert_eq!(err.scope, FetchScope::Network);
    assert!(matches!(err.source, FetchError::SdkRejected(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn selects_endpoints_by_network() -> Result<()> {
    let main = MockServer::start().await;
    let test = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/block/height"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "block_height": 2_000_000 })),
        )
        .mount(&main)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/block/height"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "block_height": 900_000 })))
        .mount(&test)
        .await;

    let client = WalletDbClient::new(
        ChainEndpoints::new(main.uri(), main.uri()),
        ChainEndpoints::new(test.uri(), test.uri()),
    );
    assert_eq!(client.fetch_block_height(Network::MainNet).await?, 2_000_000);
    assert_eq!(client.fetch_block_height(Network::TestNet).await?, 900_000);
    Ok(())
}

#[tokio::test]
async fn missing_asset_in_balance_payload_is_invalid_shape() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/address/balance/{ADDRESS}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "NEO": { "balance": 1 } })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_secondary_balance(&address(), Network::TestNet)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::InvalidResponseShape(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn http_error_status_is_a_rejection() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_native_balance(&address(), Network::TestNet)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::SdkRejected(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn unreachable_host_is_network_error() -> Result<()> {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let endpoints = ChainEndpoints::new(uri.clone(), uri);
    let client = WalletDbClient::new(endpoints.clone(), endpoints);
    let err = client.fetch_block_height(Network::TestNet).await.unwrap_err();
    assert!(matches!(err, FetchError::NetworkUnreachable(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn claims_are_scaled_from_base_units() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/address/claims/{ADDRESS}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": ADDRESS,
            "claims": [],
            "total_claim": 12345678,
            "total_unspent_claim": 0
        })))
        .mount(&server)
        .await;

    let claim = client_for(&server)
        .fetch_claimable(&address(), Network::TestNet)
        .await?;
    assert_eq!(claim, dec("0.12345678"));
    Ok(())
}

#[tokio::test]
async fn token_balance_via_rpc_matches_either_byte_order() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .and(body_partial_json(json!({ "method": "getnep5balances", "params": [ADDRESS] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "address": ADDRESS,
                "balance": [
                    // reversed byte order of the configured hash
                    {
                        "asset_hash": "0x11c4d1f4fba619f2628870d36e3a9773e874705b",
                        "amount": "15012345600",
                        "last_updated_block": 1
                    }
                ]
            }
        })))
        .mount(&server)
        .await;

    let amount = client_for(&server)
        .fetch_token_balance(&address(), Network::TestNet, &rpx())
        .await?;
    assert_eq!(amount, dec("150.123456"));
    Ok(())
}

#[tokio::test]
async fn token_never_held_is_zero() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "address": ADDRESS, "balance": [] }
        })))
        .mount(&server)
        .await;

    let amount = client_for(&server)
        .fetch_token_balance(&address(), Network::TestNet, &rpx())
        .await?;
    assert!(amount.is_zero());
    Ok(())
}

#[tokio::test]
async fn rpc_error_is_a_rejection() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32601, "message": "Method not found" }
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .fetch_token_balance(&address(), Network::TestNet, &rpx())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        FetchError::rejected("getnep5balances failed (-32601): Method not found")
    );
    Ok(())
}

#[tokio::test]
async fn history_and_version() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/v2/address/history/{ADDRESS}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "address": ADDRESS,
            "history": [
                {
                    "txid": "aa",
                    "block_index": 100,
                    "NEO": 5,
                    "GAS": "0",
                    "gas_sent": false,
                    "neo_sent": true
                },
                { "txid": "bb", "block_index": 101, "NEO": 0, "GAS": "0.00012" }
            ],
            "name": "transaction_history",
            "net": "TestNet"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "version": "2.4.1" })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let history = client
        .fetch_transaction_history(&address(), Network::TestNet)
        .await?;
    assert_eq!(history.len(), 2);
    assert!(history[0].moves_neo());
    assert_eq!(history[1].gas_delta, dec("0.00012"));
    assert_eq!(client.node_version(Network::TestNet).await?, "2.4.1");
    Ok(())
}

#[tokio::test]
async fn token_balances_come_from_one_rpc_call() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rpc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "address": ADDRESS,
                "balance": [
                    {
                        "asset_hash": "0x5b7074e873973a6ed3708862f219a6fbf4d1c411",
                        "amount": "700000000"
                    },
                    {
                        "asset_hash": "0xb951ecbbc5fe37a9c280a76cb0ce0014827294cf",
                        "amount": "250000000"
                    }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let testnet = Network::TestNet.id();
    let dbc = TokenInfo::new("DBC", "b951ecbbc5fe37a9c280a76cb0ce0014827294cf", testnet);
    let zpt = TokenInfo::new("ZPT", "ac116d4b8d4ca55e6b6d4ecce2192039b51cccc5", testnet);
    let amounts = client_for(&server)
        .fetch_token_balances(&address(), Network::TestNet, &[rpx(), dbc, zpt])
        .await?;
    assert_eq!(amounts, vec![dec("7"), dec("2.5"), dec("0")]);
    Ok(())
}

#[tokio::test]
async fn no_tokens_means_no_rpc_call() -> Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let amounts = client_for(&server)
        .fetch_token_balances(&address(), Network::TestNet, &[])
        .await?;
    assert!(amounts.is_empty());
    Ok(())
}
