//! TOML configuration for deployments and simulations.
//!
//! Configs can be loaded from TOML files, so a local network and a public
//! testnet can share one binary. The block explorer API key is never
//! written to disk; it comes from `ETHERSCAN_KEY` (a `.env` file is loaded
//! first when present).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::contracts::processor::DEFAULT_MAX_CALL_DEPTH;
use crate::types::{Address, AddressError, Amount};

/// Environment variable holding the block explorer API key
pub const EXPLORER_KEY_ENV: &str = "ETHERSCAN_KEY";

/// Reward pool funded into the first authority (100,000,000 FARM units)
pub const DEFAULT_REWARD_POOL: u64 = 100_000_000;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML (de)serialization failed
    #[error("parse error: {0}")]
    Parse(String),
    /// A configured address is malformed
    #[error("invalid address {value:?}: {source}")]
    InvalidAddress {
        /// The offending string
        value: String,
        /// Why it was rejected
        source: AddressError,
    },
}

/// Network endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkToml {
    /// Network name
    #[serde(default = "default_network_name")]
    pub name: String,
    /// JSON-RPC endpoint
    #[serde(default = "default_network_url")]
    pub url: String,
}

impl Default for NetworkToml {
    fn default() -> Self {
        Self {
            name: default_network_name(),
            url: default_network_url(),
        }
    }
}

/// Initial AP allocation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintToml {
    /// Holder address (hex)
    pub holder: String,
    /// Units to mint
    pub amount: u64,
}

/// TOML-serializable configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// Chain identifier
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    /// Pinned contract compiler version
    #[serde(default = "default_compiler_version")]
    pub compiler_version: String,
    /// Administrator address (hex); development account 0 when absent
    #[serde(default)]
    pub admin: Option<String>,
    /// FARM funded into the first redemption authority
    #[serde(default = "default_reward_pool")]
    pub reward_pool: u64,
    /// Maximum nested contract call depth
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Log filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    /// Network endpoint
    #[serde(default)]
    pub network: NetworkToml,
    /// AP minted right after deployment
    #[serde(default)]
    pub mints: Vec<MintToml>,
    /// Block explorer API key (environment only)
    #[serde(skip)]
    pub explorer_api_key: Option<String>,
}

fn default_chain_id() -> String {
    "harvest-ap-local".to_string()
}

fn default_network_name() -> String {
    "localhost".to_string()
}

fn default_network_url() -> String {
    "http://127.0.0.1:8545".to_string()
}

fn default_compiler_version() -> String {
    "0.7.3".to_string()
}

fn default_reward_pool() -> u64 {
    DEFAULT_REWARD_POOL
}

fn default_max_call_depth() -> usize {
    DEFAULT_MAX_CALL_DEPTH
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn parse_address(value: &str) -> Result<Address, ConfigError> {
    Address::from_hex(value).map_err(|source| ConfigError::InvalidAddress {
        value: value.to_string(),
        source,
    })
}

impl HarvestConfig {
    /// Load from a TOML file and pick up the explorer key from the environment
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.load_env();
        Ok(config)
    }

    /// Save to a TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Read `ETHERSCAN_KEY`, loading `.env` first if one exists
    pub fn load_env(&mut self) {
        let _ = dotenvy::dotenv();
        self.explorer_api_key = std::env::var(EXPLORER_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty());
    }

    /// Administrator address
    pub fn admin_address(&self) -> Result<Address, ConfigError> {
        self.admin
            .as_deref()
            .map_or_else(|| Ok(Address::dev_account(0)), parse_address)
    }

    /// Parsed initial allocations
    pub fn initial_mints(&self) -> Result<Vec<(Address, Amount)>, ConfigError> {
        self.mints
            .iter()
            .map(|m| Ok((parse_address(&m.holder)?, Amount::from(m.amount))))
            .collect()
    }

    /// Reward pool as an amount
    #[must_use]
    pub fn reward_pool_amount(&self) -> Amount {
        Amount::from(self.reward_pool)
    }
}

impl Default for HarvestConfig {
    fn default() -> Self {
        default_config()
    }
}

/// Local configuration mirroring the reference scenario: two holders with
/// 100 AP each, one of them the administrator.
#[must_use]
pub fn default_config() -> HarvestConfig {
    HarvestConfig {
        chain_id: default_chain_id(),
        compiler_version: default_compiler_version(),
        admin: None,
        reward_pool: DEFAULT_REWARD_POOL,
        max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        log_filter: default_log_filter(),
        network: NetworkToml::default(),
        mints: vec![
            MintToml {
                holder: Address::dev_account(0).to_hex(),
                amount: 100,
            },
            MintToml {
                holder: format!("0x{}", "22".repeat(20)),
                amount: 100,
            },
        ],
        explorer_api_key: None,
    }
}

/// Default config location (`~/.harvest-ap/config.toml`)
#[must_use]
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".harvest-ap")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toml_roundtrip() {
        let config = default_config();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let deserialized: HarvestConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.chain_id, config.chain_id);
        assert_eq!(deserialized.reward_pool, DEFAULT_REWARD_POOL);
        assert_eq!(deserialized.mints, config.mints);
    }

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: HarvestConfig = toml::from_str("chain_id = \"x\"").unwrap();

        assert_eq!(config.network.url, "http://127.0.0.1:8545");
        assert_eq!(config.compiler_version, "0.7.3");
        assert_eq!(config.max_call_depth, DEFAULT_MAX_CALL_DEPTH);
        assert!(config.mints.is_empty());
        assert_eq!(config.admin_address().unwrap(), Address::dev_account(0));
    }

    #[test]
    fn test_explorer_key_never_serialized() {
        let mut config = default_config();
        config.explorer_api_key = Some("secret".to_string());

        let serialized = toml::to_string_pretty(&config).unwrap();
        assert!(!serialized.contains("secret"));
    }

    #[test]
    fn test_bad_mint_address() {
        let mut config = default_config();
        config.mints.push(MintToml {
            holder: "0x12".to_string(),
            amount: 1,
        });

        assert!(matches!(
            config.initial_mints(),
            Err(ConfigError::InvalidAddress { .. })
        ));
    }
}
