use serde::{Deserialize, Serialize};

pub const NEO_SYMBOL: &str = "NEO";
pub const GAS_SYMBOL: &str = "GAS";

/// Decimal places carried by GAS and by tokens that do not declare their own.
pub const DEFAULT_DECIMALS: u32 = 8;

fn default_decimals() -> u32 {
    DEFAULT_DECIMALS
}

/// A fungible token the user tracks on a given network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    /// Contract script hash, hex without `0x`.
    pub script_hash: String,
    pub network_id: String,
    #[serde(default = "default_decimals")]
    pub decimals: u32,
    #[serde(default)]
    pub is_user_generated: bool,
}

impl TokenInfo {
    pub fn new(
        symbol: impl Into<String>,
        script_hash: impl Into<String>,
        network_id: impl Into<String>,
    ) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            script_hash: script_hash.into().trim_start_matches("0x").to_lowercase(),
            network_id: network_id.into(),
            decimals: DEFAULT_DECIMALS,
            is_user_generated: false,
        }
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn user_generated(mut self) -> Self {
        self.is_user_generated = true;
        self
    }

    /// Key used to dedupe token lists: one entry per contract per network.
    pub fn dedupe_key(&self) -> (String, String) {
        (self.network_id.clone(), self.script_hash.to_lowercase())
    }
}

/// An asset whose balance the wallet displays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Asset {
    /// The governance asset. Indivisible.
    Native,
    /// The gas asset used to pay fees.
    Secondary,
    Token {
        symbol: String,
        script_hash: String,
        decimals: u32,
    },
}

impl Asset {
    pub fn token(info: &TokenInfo) -> Self {
        Asset::Token {
            symbol: info.symbol.clone(),
            script_hash: info.script_hash.clone(),
            decimals: info.decimals,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            Asset::Native => NEO_SYMBOL,
            Asset::Secondary => GAS_SYMBOL,
            Asset::Token { symbol, .. } => symbol,
        }
    }

    /// Number of decimal places the chain tracks for this asset.
    pub fn decimals(&self) -> u32 {
        match self {
            Asset::Native => 0,
            Asset::Secondary => DEFAULT_DECIMALS,
            Asset::Token { decimals, .. } => *decimals,
        }
    }

    pub fn is_divisible(&self) -> bool {
        self.decimals() > 0
    }

    pub fn is_builtin(&self) -> bool {
        matches!(self, Asset::Native | Asset::Secondary)
    }
}
