use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Invalid address {value:?}: addresses are 34 base58 characters starting with 'A'")]
pub struct AddressError {
    value: String,
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^A[1-9A-HJ-NP-Za-km-z]{33}$").expect("address pattern is a valid regex")
    })
}

/// A syntactically valid account address.
///
/// Only the shape is checked (prefix, length, base58 alphabet). The checksum is
/// left to the chain backend, which rejects unknown addresses on its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn parse(value: impl Into<String>) -> Result<Self, AddressError> {
        let value = value.into();
        let trimmed = value.trim();
        if address_pattern().is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(AddressError { value })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}
