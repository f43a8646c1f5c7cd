use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use walletsum::chain::WalletDbClient;
use walletsum::config::{default_config_path, ResolvedConfig};
use walletsum::format::format_asset_amount;
use walletsum::models::{Address, Asset, Network, TokenInfo};
use walletsum::notifications::TracingNotifier;
use walletsum::prices::providers::{CoinMarketCapTicker, FrankfurterRateSource};
use walletsum::settings::{
    load_settings, update_settings, JsonFileSettingsStore, SettingsPatch, SettingsStore, Theme,
};
use walletsum::state::{Action, WalletStore};
use walletsum::wallet::{compute_display_model, BalanceAggregator, DisplayModel, RefreshOutcome};

fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    walletsum::duration::parse_duration(s).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(name = "walletsum")]
#[command(about = "NEO wallet balances valued in your currency")]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Network to query ("MainNet" or "TestNet"); defaults to the config value
    #[arg(long, global = true)]
    network: Option<String>,

    /// Emit JSON output and JSON logs
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch balances and prices once and print the valued wallet
    Balance { address: String },
    /// Refresh balances on an interval until interrupted
    Watch {
        address: String,
        /// Override the configured refresh interval (e.g. "30s", "5m")
        #[arg(long, value_parser = parse_duration_arg)]
        interval: Option<Duration>,
    },
    /// Show block height and transaction history
    History { address: String },
    /// Inspect or change stored settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Show current configuration
    Config,
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    Show,
    SetCurrency {
        code: String,
    },
    /// Track an additional token on the selected network
    AddToken {
        symbol: String,
        script_hash: String,
        #[arg(long, default_value_t = walletsum::models::DEFAULT_DECIMALS)]
        decimals: u32,
    },
    SetTheme {
        theme: ThemeArg,
    },
    SetLanguage {
        language: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ThemeArg {
    Light,
    Dark,
}

impl From<ThemeArg> for Theme {
    fn from(arg: ThemeArg) -> Self {
        match arg {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
        }
    }
}

fn init_tracing(json_logs: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("walletsum=info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .init();
    }
}

struct RunContext {
    config: ResolvedConfig,
    network: Network,
    json: bool,
}

fn http_client(config: &ResolvedConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.endpoints.request_timeout)
        .build()
        .context("Failed to build HTTP client")
}

fn build_aggregator(
    ctx: &RunContext,
    settings: Arc<dyn SettingsStore>,
) -> Result<BalanceAggregator> {
    let client = http_client(&ctx.config)?;
    let endpoints = &ctx.config.endpoints;
    let chain = WalletDbClient::with_client(
        client.clone(),
        endpoints.mainnet.clone(),
        endpoints.testnet.clone(),
    );
    let ticker =
        CoinMarketCapTicker::with_client(client.clone()).with_base_url(&endpoints.ticker_url);
    let fx = FrankfurterRateSource::with_client(client).with_base_url(&endpoints.fx_url);

    Ok(BalanceAggregator::new(
        Arc::new(chain),
        Arc::new(ticker),
        settings,
        Arc::new(TracingNotifier),
        Arc::new(WalletStore::default()),
    )
    .with_fx_source(Arc::new(fx)))
}

fn settings_store(ctx: &RunContext) -> Arc<dyn SettingsStore> {
    Arc::new(JsonFileSettingsStore::new(&ctx.config.data_dir))
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_model(
    ctx: &RunContext,
    model: &DisplayModel,
    claim: rust_decimal::Decimal,
) -> Result<()> {
    if ctx.json {
        return print_json(&json!({
            "currency": model.currency,
            "assets": model.assets,
            "total": model.total().to_string(),
            "total_display": model.total_display(),
            "claimable_gas": claim.to_string(),
        }));
    }

    for line in &model.assets {
        if ctx.config.display.hide_zero_balances && line.amount.is_zero() {
            continue;
        }
        println!(
            "{:<8} {:>24} {:>24}",
            line.symbol(),
            line.amount_display,
            line.fiat_display
        );
    }
    println!("{:<8} {:>24} {:>24}", "TOTAL", "", model.total_display());
    if ctx.config.display.show_claim {
        println!("Claimable GAS: {}", format_asset_amount(claim, &Asset::Secondary));
    }
    Ok(())
}

async fn run_balance(ctx: &RunContext, address: &str) -> Result<()> {
    let address = Address::parse(address)?;
    let aggregator = build_aggregator(ctx, settings_store(ctx))?;
    aggregator.store().dispatch(Action::SetNetwork(ctx.network));
    aggregator.store().dispatch(Action::Login(address.clone()));

    match aggregator.refresh_balances(&address, ctx.network).await {
        RefreshOutcome::Refreshed(model) => print_model(ctx, &model, aggregator.claimable()),
        RefreshOutcome::Failed(err) => {
            Err(anyhow::Error::new(err).context("Balance refresh failed"))
        }
        RefreshOutcome::Skipped => anyhow::bail!("A refresh is already in progress"),
    }
}

async fn run_watch(ctx: &RunContext, address: &str, interval: Option<Duration>) -> Result<()> {
    let address = Address::parse(address)?;
    let aggregator = build_aggregator(ctx, settings_store(ctx))?;
    let store = aggregator.store().clone();
    store.dispatch(Action::SetNetwork(ctx.network));
    store.dispatch(Action::Login(address.clone()));
    let every = interval.unwrap_or(ctx.config.refresh.interval);

    let mut events = store.subscribe();
    let json = ctx.json;
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(Action::BalancesLoaded(loaded)) => {
                    let model = match compute_display_model(
                        &loaded.balances,
                        &loaded.prices,
                        &loaded.currency,
                    ) {
                        Ok(model) => model,
                        Err(err) => {
                            warn!(error = %err, "cannot value refreshed balances");
                            continue;
                        }
                    };
                    let at = loaded.refreshed_at;
                    if json {
                        println!(
                            "{}",
                            json!({
                                "refreshed_at": at,
                                "total_display": model.total_display(),
                            })
                        );
                    } else {
                        println!("{}  {}", at.format("%H:%M:%S"), model.total_display());
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "dropped wallet events"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
        }
    };
    let summary = aggregator.watch(&address, ctx.network, every, shutdown).await;
    debug!(?summary, "watch finished");
    drop(aggregator);
    drop(store);
    let _ = printer.await;
    Ok(())
}

async fn run_history(ctx: &RunContext, address: &str) -> Result<()> {
    let address = Address::parse(address)?;
    let settings = settings_store(ctx);
    let explorer = load_settings(settings.as_ref()).await?.block_explorer;
    let aggregator = build_aggregator(ctx, settings)?;
    aggregator.store().dispatch(Action::SetNetwork(ctx.network));

    aggregator
        .sync_chain_metadata(&address, ctx.network)
        .await
        .context("Failed to fetch chain metadata")?;
    let state = aggregator.store().snapshot();

    if ctx.json {
        return print_json(&json!({
            "network": ctx.network,
            "block_height": state.block_height,
            "transactions": state.transactions,
        }));
    }

    if let Some(height) = state.block_height {
        println!("Block height: {height}");
    }
    for tx in &state.transactions {
        println!(
            "{:>10}  NEO {:>12}  GAS {:>16}  {}",
            tx.block_index,
            tx.neo_delta,
            tx.gas_delta,
            explorer.transaction_url(ctx.network, &tx.txid)
        );
    }
    Ok(())
}

async fn run_settings(ctx: &RunContext, command: SettingsCommand) -> Result<()> {
    let store = settings_store(ctx);
    let settings = match command {
        SettingsCommand::Show => load_settings(store.as_ref()).await?,
        SettingsCommand::SetCurrency { code } => {
            update_settings(store.as_ref(), SettingsPatch::currency(code)).await?
        }
        SettingsCommand::AddToken {
            symbol,
            script_hash,
            decimals,
        } => {
            let current = load_settings(store.as_ref()).await?;
            let mut tokens = current.tokens;
            tokens.push(
                TokenInfo::new(symbol, script_hash, ctx.network.id())
                    .with_decimals(decimals)
                    .user_generated(),
            );
            update_settings(store.as_ref(), SettingsPatch::tokens(tokens)).await?
        }
        SettingsCommand::SetTheme { theme } => {
            update_settings(store.as_ref(), SettingsPatch::theme(theme.into())).await?
        }
        SettingsCommand::SetLanguage { language } => {
            update_settings(store.as_ref(), SettingsPatch::language(language)).await?
        }
    };
    print_json(&settings)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    let config = ResolvedConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config.display()))?;
    let network = cli
        .network
        .as_deref()
        .map(Network::from_name)
        .unwrap_or(config.network);
    let ctx = RunContext {
        config,
        network,
        json: cli.json,
    };

    match cli.command {
        Command::Balance { address } => run_balance(&ctx, &address).await,
        Command::Watch { address, interval } => run_watch(&ctx, &address, interval).await,
        Command::History { address } => run_history(&ctx, &address).await,
        Command::Settings { command } => run_settings(&ctx, command).await,
        Command::Config => print_json(&ctx.config),
    }
}
