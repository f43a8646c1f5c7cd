//! User settings: display currency, tracked tokens and UI preferences.
//!
//! The stored record may be partial or missing. [`load_settings`] always
//! returns a complete [`Settings`] by layering the stored values over the
//! defaults.

mod json_file;
mod memory;

pub use json_file::JsonFileSettingsStore;
pub use memory::MemorySettingsStore;

use std::collections::HashSet;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FetchError;
use crate::models::{Network, TokenInfo, GAS_SYMBOL, NEO_SYMBOL};

pub const DEFAULT_CURRENCY_CODE: &str = "USD";
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockExplorer {
    #[default]
    NeoTracker,
    Neoscan,
}

impl BlockExplorer {
    /// Link to a transaction on this explorer.
    pub fn transaction_url(&self, network: Network, txid: &str) -> String {
        match (self, network) {
            (BlockExplorer::NeoTracker, Network::MainNet) => {
                format!("https://neotracker.io/tx/{txid}")
            }
            (BlockExplorer::NeoTracker, Network::TestNet) => {
                format!("https://testnet.neotracker.io/tx/{txid}")
            }
            (BlockExplorer::Neoscan, Network::MainNet) => {
                format!("https://neoscan.io/transaction/{txid}")
            }
            (BlockExplorer::Neoscan, Network::TestNet) => {
                format!("https://neoscan-testnet.io/transaction/{txid}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Complete settings record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub currency: String,
    pub block_explorer: BlockExplorer,
    pub tokens: Vec<TokenInfo>,
    pub theme: Theme,
    pub language: String,
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            block_explorer: BlockExplorer::default(),
            tokens: default_tokens(),
            theme: Theme::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            sound_enabled: true,
        }
    }
}

impl Settings {
    /// Tokens configured for `network`, in settings order.
    pub fn tokens_for(&self, network: Network) -> Vec<TokenInfo> {
        self.tokens
            .iter()
            .filter(|t| t.network_id == network.id())
            .cloned()
            .collect()
    }

    fn apply(&mut self, patch: SettingsPatch) {
        if let Some(currency) = patch.currency {
            self.currency = currency.to_uppercase();
        }
        if let Some(explorer) = patch.block_explorer {
            self.block_explorer = explorer;
        }
        if let Some(tokens) = patch.tokens {
            self.tokens = tokens;
        }
        if let Some(theme) = patch.theme {
            self.theme = theme;
        }
        if let Some(language) = patch.language {
            self.language = language;
        }
        if let Some(sound_enabled) = patch.sound_enabled {
            self.sound_enabled = sound_enabled;
        }
    }
}

/// A partial settings record: what is on disk, or a change to apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub currency: Option<String>,
    pub block_explorer: Option<BlockExplorer>,
    pub tokens: Option<Vec<TokenInfo>>,
    pub theme: Option<Theme>,
    pub language: Option<String>,
    pub sound_enabled: Option<bool>,
}

impl SettingsPatch {
    pub fn currency(code: impl Into<String>) -> Self {
        Self {
            currency: Some(code.into()),
            ..Self::default()
        }
    }

    pub fn theme(theme: Theme) -> Self {
        Self {
            theme: Some(theme),
            ..Self::default()
        }
    }

    pub fn language(language: impl Into<String>) -> Self {
        Self {
            language: Some(language.into()),
            ..Self::default()
        }
    }

    pub fn tokens(tokens: Vec<TokenInfo>) -> Self {
        Self {
            tokens: Some(tokens),
            ..Self::default()
        }
    }
}

/// Persistent home of the settings record.
#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads the stored record. `Ok(None)` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<SettingsPatch>, FetchError>;

    async fn save(&self, settings: &Settings) -> Result<()>;
}

/// Tokens every wallet tracks out of the box.
pub fn default_tokens() -> Vec<TokenInfo> {
    let main = Network::MainNet.id();
    let test = Network::TestNet.id();
    vec![
        TokenInfo::new("RPX", "ecc6b20d3ccac1ee9ef109af5a7cdb85706b1df9", main),
        TokenInfo::new("DBC", "b951ecbbc5fe37a9c280a76cb0ce0014827294cf", main),
        TokenInfo::new("QLC", "0d821bd7b6d53f5c2b40e217c6defc8bbe896cf5", main),
        TokenInfo::new("TNC", "08e8c4400f1af2c20c28e0018f29535eb85d15b6", main),
        TokenInfo::new("ZPT", "ac116d4b8d4ca55e6b6d4ecce2192039b51cccc5", main),
        TokenInfo::new("RPX", "5b7074e873973a6ed3708862f219a6fbf4d1c411", test),
    ]
}

/// Keeps the first token seen for each `(network_id, script_hash)` pair.
pub fn dedupe_tokens(tokens: impl IntoIterator<Item = TokenInfo>) -> Vec<TokenInfo> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|token| seen.insert(token.dedupe_key()))
        .collect()
}

/// First token whose symbol is already taken on its network, by NEO, GAS or
/// an earlier token. Balances are keyed by symbol, so a collision would hide
/// one of the two assets.
pub fn symbol_collision(tokens: &[TokenInfo]) -> Option<&TokenInfo> {
    let mut taken = HashSet::new();
    tokens.iter().find(|token| {
        let symbol = token.symbol.to_uppercase();
        symbol == NEO_SYMBOL
            || symbol == GAS_SYMBOL
            || !taken.insert((token.network_id.clone(), symbol))
    })
}

/// Currency codes are three ASCII letters.
pub fn is_valid_currency_code(code: &str) -> bool {
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

/// Loads settings: defaults, overlaid with the stored record, with the default
/// tokens always present.
pub async fn load_settings(store: &dyn SettingsStore) -> Result<Settings, FetchError> {
    let defaults = Settings::default();
    let Some(stored) = store.load().await? else {
        debug!("no stored settings, using defaults");
        return Ok(defaults);
    };

    let stored_tokens = stored.tokens.clone().unwrap_or_default();
    let mut settings = defaults.clone();
    settings.apply(stored);
    settings.tokens = dedupe_tokens(defaults.tokens.into_iter().chain(stored_tokens));
    Ok(settings)
}

/// Applies `patch` on top of the current settings and persists the result.
pub async fn update_settings(store: &dyn SettingsStore, patch: SettingsPatch) -> Result<Settings> {
    if let Some(code) = &patch.currency {
        if !is_valid_currency_code(code) {
            anyhow::bail!("Invalid currency code {code:?}: expected three letters like USD");
        }
    }

    let mut settings = load_settings(store).await?;
    settings.apply(patch);
    settings.tokens = dedupe_tokens(settings.tokens);
    if let Some(token) = symbol_collision(&settings.tokens) {
        anyhow::bail!(
            "Token symbol {} is already used on network {}",
            token.symbol,
            token.network_id
        );
    }
    store.save(&settings).await?;
    Ok(settings)
}
