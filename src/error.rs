//! Error taxonomy for balance and price fetching.
//!
//! Collaborator traits return [`FetchError`]; the aggregator attaches a
//! [`FetchScope`] to say which part of a refresh failed.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),
    #[error("invalid response: {0}")]
    InvalidResponseShape(String),
    #[error("request rejected: {0}")]
    SdkRejected(String),
    #[error("storage read failed: {0}")]
    StorageReadFailure(String),
}

impl FetchError {
    pub fn invalid_shape(message: impl Into<String>) -> Self {
        FetchError::InvalidResponseShape(message.into())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        FetchError::SdkRejected(message.into())
    }

    /// Short machine-friendly name, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NetworkUnreachable(_) => "network_unreachable",
            FetchError::InvalidResponseShape(_) => "invalid_response_shape",
            FetchError::SdkRejected(_) => "sdk_rejected",
            FetchError::StorageReadFailure(_) => "storage_read_failure",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::InvalidResponseShape(err.to_string())
        } else if err.is_status() {
            FetchError::SdkRejected(err.to_string())
        } else {
            // connect, timeout, request building and body errors
            FetchError::NetworkUnreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::InvalidResponseShape(err.to_string())
    }
}

/// Which part of a refresh an error belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchScope {
    /// A single asset's balance query, by symbol.
    Asset(String),
    Prices,
    /// Chain-level data that is not tied to one asset (claims, height, history).
    Network,
    Settings,
}

impl fmt::Display for FetchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchScope::Asset(symbol) => write!(f, "{symbol}"),
            FetchScope::Prices => f.write_str("prices"),
            FetchScope::Network => f.write_str("network"),
            FetchScope::Settings => f.write_str("settings"),
        }
    }
}

/// A failed refresh: the scope that failed and why.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{scope}: {source}")]
pub struct RefreshError {
    pub scope: FetchScope,
    #[source]
    pub source: FetchError,
}

impl RefreshError {
    pub fn new(scope: FetchScope, source: FetchError) -> Self {
        Self { scope, source }
    }

    /// Text shown to the user in an error notification.
    pub fn user_message(&self) -> String {
        let headline = match &self.scope {
            FetchScope::Asset(symbol) => format!("Failed to retrieve {symbol} balance"),
            FetchScope::Prices => "Failed to retrieve market prices".to_string(),
            FetchScope::Network => "Failed to retrieve blockchain information".to_string(),
            FetchScope::Settings => "Failed to read wallet settings".to_string(),
        };
        format!("{headline}: {}", self.source)
    }
}

/// Extension for tagging a fetch result with its scope.
pub trait ScopeExt<T> {
    fn scoped(self, scope: FetchScope) -> Result<T, RefreshError>;
}

impl<T> ScopeExt<T> for Result<T, FetchError> {
    fn scoped(self, scope: FetchScope) -> Result<T, RefreshError> {
        self.map_err(|source| RefreshError::new(scope, source))
    }
}
