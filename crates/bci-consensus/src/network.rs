use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Error)]
pub enum ChainTypeError {
    #[error("Invalid chain type: {0}")]
    InvalidChainType(String),
}

/// The three BCI networks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Network {
    /// BCI main network.
    Mainnet,
    /// BCI test network.
    Testnet,
    /// BCI regression test network.
    Regtest,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "main",
            Network::Testnet => "test",
            Network::Regtest => "regtest",
        }
    }

    /// Post-fork message-start bytes for this network.
    pub fn magic(self) -> Magic {
        Magic::from(self)
    }

    /// Pre-fork (Bitcoin-compatible) message-start bytes for this network.
    pub fn magic_legacy(self) -> Magic {
        match self {
            Network::Mainnet => Magic::MAINNET_LEGACY,
            Network::Testnet => Magic::TESTNET_LEGACY,
            Network::Regtest => Magic::REGTEST,
        }
    }
}

impl std::str::FromStr for Network {
    type Err = ChainTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "main" => Ok(Network::Mainnet),
            "test" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            other => Err(ChainTypeError::InvalidChainType(other.to_owned())),
        }
    }
}

/// Network magic bytes identifying which chain a message belongs to.
///
/// The post-fork values were chosen to split BCI traffic from Bitcoin's; the
/// legacy values are kept because pre-fork block data still carries them.
#[derive(Debug, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Serialize, Deserialize)]
pub struct Magic([u8; 4]);

impl Magic {
    /// BCI main network magic bytes.
    pub const MAINNET: Self = Self([0xed, 0xe4, 0xfe, 0x26]);
    /// Bitcoin main network magic bytes (pre-fork blocks).
    pub const MAINNET_LEGACY: Self = Self([0xf9, 0xbe, 0xb4, 0xd9]);
    /// BCI test network magic bytes.
    pub const TESTNET: Self = Self([0xdd, 0x74, 0xe7, 0x7b]);
    /// Bitcoin test network magic bytes (pre-fork blocks).
    pub const TESTNET_LEGACY: Self = Self([0x0b, 0x11, 0x09, 0x07]);
    /// Regression test network magic bytes (same in both eras).
    pub const REGTEST: Self = Self([0xfa, 0xbf, 0xb5, 0xda]);

    pub fn to_bytes(&self) -> [u8; 4] {
        self.0
    }
}

impl From<Network> for Magic {
    fn from(network: Network) -> Self {
        match network {
            Network::Mainnet => Magic::MAINNET,
            Network::Testnet => Magic::TESTNET,
            Network::Regtest => Magic::REGTEST,
        }
    }
}

impl std::fmt::Display for Magic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        hex::encode(self.0).fmt(f)
    }
}
