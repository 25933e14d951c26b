//! Client configuration: target cluster, token mint, program addresses and
//! the compute budget attached to every transaction.
//!
//! Loaded once (usually from TOML) and passed explicitly to
//! [`crate::TokenClient`]. Every field except `mint` has a default.

use std::convert::Infallible;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sol_tx::{Address, ProgramIds};

use crate::error::TokenError;

pub const MAINNET_ENDPOINT: &str = "https://api.mainnet-beta.solana.com";
pub const TESTNET_ENDPOINT: &str = "https://api.testnet.solana.com";
pub const DEVNET_ENDPOINT: &str = "https://api.devnet.solana.com";
pub const LOCALNET_ENDPOINT: &str = "http://localhost:8899";

/// Compute units requested per transaction.
pub const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 462_000;

/// Priority fee per compute unit, in micro-lamports.
pub const DEFAULT_COMPUTE_UNIT_PRICE: u64 = 300_000;

/// Account size probed when checking the rent-exemption minimum.
pub const DEFAULT_RENT_PROBE_LEN: usize = 50;

// ---------------------------------------------------------------------------
// Cluster
// ---------------------------------------------------------------------------

/// The RPC endpoint a client talks to.
///
/// Serialized as its name (`"MAINNET"`, ...) or, for custom endpoints, as the
/// URL itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Cluster {
    #[default]
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
    Custom(String),
}

impl Cluster {
    /// Parse a cluster name. Anything that is not a known name is taken as a
    /// custom endpoint URL.
    pub fn parse(choice: &str) -> Self {
        match choice.trim().to_ascii_uppercase().as_str() {
            "MAINNET" => Cluster::Mainnet,
            "TESTNET" => Cluster::Testnet,
            "DEVNET" => Cluster::Devnet,
            "LOCALNET" => Cluster::Localnet,
            _ => Cluster::Custom(choice.trim().to_string()),
        }
    }

    pub fn rpc_url(&self) -> &str {
        match self {
            Cluster::Mainnet => MAINNET_ENDPOINT,
            Cluster::Testnet => TESTNET_ENDPOINT,
            Cluster::Devnet => DEVNET_ENDPOINT,
            Cluster::Localnet => LOCALNET_ENDPOINT,
            Cluster::Custom(url) => url,
        }
    }
}

impl FromStr for Cluster {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Cluster::parse(s))
    }
}

impl From<String> for Cluster {
    fn from(s: String) -> Self {
        Cluster::parse(&s)
    }
}

impl From<Cluster> for String {
    fn from(cluster: Cluster) -> Self {
        cluster.to_string()
    }
}

impl fmt::Display for Cluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cluster::Mainnet => f.write_str("MAINNET"),
            Cluster::Testnet => f.write_str("TESTNET"),
            Cluster::Devnet => f.write_str("DEVNET"),
            Cluster::Localnet => f.write_str("LOCALNET"),
            Cluster::Custom(url) => f.write_str(url),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeBudget {
    pub unit_limit: u32,
    pub unit_price_micro_lamports: u64,
}

impl Default for ComputeBudget {
    fn default() -> Self {
        Self {
            unit_limit: DEFAULT_COMPUTE_UNIT_LIMIT,
            unit_price_micro_lamports: DEFAULT_COMPUTE_UNIT_PRICE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cluster: Cluster,

    /// Mint of the token every workflow moves or burns.
    pub mint: Address,

    #[serde(default = "default_rent_probe_len")]
    pub rent_probe_len: usize,

    #[serde(default)]
    pub programs: ProgramIds,

    #[serde(default)]
    pub compute_budget: ComputeBudget,
}

fn default_rent_probe_len() -> usize {
    DEFAULT_RENT_PROBE_LEN
}

impl Config {
    /// Defaults for everything but the cluster and mint.
    pub fn new(cluster: Cluster, mint: Address) -> Self {
        Self {
            cluster,
            mint,
            rent_probe_len: DEFAULT_RENT_PROBE_LEN,
            programs: ProgramIds::default(),
            compute_budget: ComputeBudget::default(),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, TokenError> {
        toml::from_str(content).map_err(|e| TokenError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TokenError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TokenError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> Result<String, TokenError> {
        toml::to_string(self).map_err(|e| TokenError::Config(e.to_string()))
    }
}
