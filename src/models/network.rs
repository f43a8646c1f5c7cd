use std::fmt;

use serde::{Deserialize, Serialize};

/// The chain a wallet is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Network {
    #[serde(rename = "MainNet")]
    MainNet,
    #[default]
    #[serde(rename = "TestNet")]
    TestNet,
}

impl Network {
    /// Resolves a user-supplied network name. Anything other than `MainNet`
    /// falls back to the test network.
    pub fn from_name(name: &str) -> Self {
        if name.trim() == "MainNet" {
            Network::MainNet
        } else {
            Network::TestNet
        }
    }

    /// Stable id used to key per-network token entries in settings.
    pub fn id(&self) -> &'static str {
        match self {
            Network::MainNet => "1",
            Network::TestNet => "2",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::MainNet => "MainNet",
            Network::TestNet => "TestNet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
