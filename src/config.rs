use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::chain::ChainEndpoints;
use crate::duration::{deserialize_duration, serialize_duration};
use crate::models::Network;
use crate::prices::providers::{COINMARKETCAP_BASE_URL, FRANKFURTER_BASE_URL};

pub const CONFIG_FILE_NAME: &str = "walletsum.toml";

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_refresh_interval() -> Duration {
    Duration::from_secs(30)
}

/// Where the wallet talks to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointsConfig {
    pub mainnet: ChainEndpoints,
    pub testnet: ChainEndpoints,
    pub ticker_url: String,
    pub fx_url: String,

    /// Applied to every outgoing HTTP request.
    #[serde(
        default = "default_request_timeout",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub request_timeout: Duration,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            mainnet: ChainEndpoints::mainnet(),
            testnet: ChainEndpoints::testnet(),
            ticker_url: COINMARKETCAP_BASE_URL.to_string(),
            fx_url: FRANKFURTER_BASE_URL.to_string(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl EndpointsConfig {
    pub fn for_network(&self, network: Network) -> &ChainEndpoints {
        match network {
            Network::MainNet => &self.mainnet,
            Network::TestNet => &self.testnet,
        }
    }
}

/// Output options for the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Omit tokens whose balance is zero.
    pub hide_zero_balances: bool,

    /// Print the claimable GAS line under the balances.
    pub show_claim: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            hide_zero_balances: false,
            show_claim: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Tick period of `watch`.
    #[serde(
        default = "default_refresh_interval",
        deserialize_with = "deserialize_duration",
        serialize_with = "serialize_duration"
    )]
    pub interval: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: default_refresh_interval(),
        }
    }
}

/// Contents of `walletsum.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `settings.json`. Relative paths resolve against the
    /// config file's directory; unset means the config file's directory.
    pub data_dir: Option<PathBuf>,

    /// Network used when `--network` is not given.
    pub network: Network,

    pub endpoints: EndpointsConfig,
    pub display: DisplayConfig,
    pub refresh: RefreshConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Missing file means defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }
}

/// Configuration with the data directory resolved to a usable path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub config_path: PathBuf,
    pub data_dir: PathBuf,
    pub network: Network,
    pub endpoints: EndpointsConfig,
    pub display: DisplayConfig,
    pub refresh: RefreshConfig,
}

impl ResolvedConfig {
    fn from_config(config: Config, config_path: PathBuf, config_dir: &Path) -> Self {
        Self {
            data_dir: config.resolve_data_dir(config_dir),
            config_path,
            network: config.network,
            endpoints: config.endpoints,
            display: config.display,
            refresh: config.refresh,
        }
    }

    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;
        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?
            .to_path_buf();

        let config = Config::load(&config_path)?;
        Ok(Self::from_config(config, config_path, &config_dir))
    }

    /// Like [`ResolvedConfig::load`], but a missing file yields defaults with
    /// the data directory next to where the file would be.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };
        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?
            .to_path_buf();

        Ok(Self::from_config(Config::default(), config_path, &config_dir))
    }
}

/// `./walletsum.toml` if present, otherwise `<data dir>/walletsum/walletsum.toml`.
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from(CONFIG_FILE_NAME);
    if local_config.exists() {
        return local_config;
    }

    match dirs::data_dir() {
        Some(data_dir) => data_dir.join("walletsum").join(CONFIG_FILE_NAME),
        None => local_config,
    }
}
