//! EVM network configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::AccountId;
use crate::error::{ConfigError, Result};

/// Sepolia testnet chain id.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Forge contract of the reference deployment.
pub const DEFAULT_FORGE_CONTRACT: &str = "0xF0cac17eAca077c718d929e1D409393a005a1434";

/// Balance-ledger (game logic) contract of the reference deployment.
pub const DEFAULT_LEDGER_CONTRACT: &str = "0xe7E8F47A067f13C0934451364f69Bd402cEce99C";

/// Public Sepolia endpoint used when nothing else is configured.
pub const PUBLIC_SEPOLIA_RPC: &str = "https://ethereum-sepolia-rpc.publicnode.com";

const INFURA_SEPOLIA_RPC: &str = "https://sepolia.infura.io/v3/";

/// `[network]` table.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    /// JSON-RPC endpoint. Filled from the environment when absent.
    #[serde(default)]
    pub rpc_url: Option<String>,
    /// Chain the endpoint must report.
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// Contract exposing `mintToken`, `forgeItem` and `tradeItem`.
    #[serde(default = "default_forge_contract")]
    pub forge_contract: String,
    /// Contract exposing `balanceOfBatch` and `lastMint`.
    #[serde(default = "default_ledger_contract")]
    pub ledger_contract: String,
}

const fn default_chain_id() -> u64 {
    SEPOLIA_CHAIN_ID
}

fn default_forge_contract() -> String {
    DEFAULT_FORGE_CONTRACT.to_string()
}

fn default_ledger_contract() -> String {
    DEFAULT_LEDGER_CONTRACT.to_string()
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            chain_id: default_chain_id(),
            forge_contract: default_forge_contract(),
            ledger_contract: default_ledger_contract(),
        }
    }
}

impl NetworkConfig {
    /// Apply `FORGEKEEPER_RPC_URL` and `INFURA_API_KEY`.
    ///
    /// An explicit `FORGEKEEPER_RPC_URL` always wins; the Infura key only
    /// fills an endpoint the file left unset.
    pub fn apply_env(&mut self, rpc_override: Option<String>, infura_key: Option<String>) {
        if let Some(url) = rpc_override.filter(|u| !u.trim().is_empty()) {
            self.rpc_url = Some(url);
            return;
        }
        if self.rpc_url.is_none() {
            if let Some(key) = infura_key.filter(|k| !k.trim().is_empty()) {
                self.rpc_url = Some(format!("{INFURA_SEPOLIA_RPC}{}", key.trim()));
            }
        }
    }

    /// Endpoint to connect to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.rpc_url.as_deref().unwrap_or(PUBLIC_SEPOLIA_RPC)
    }

    /// True when connected to Sepolia.
    #[must_use]
    pub const fn is_sepolia(&self) -> bool {
        self.chain_id == SEPOLIA_CHAIN_ID
    }

    /// Check addresses, chain id and endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for the first bad field.
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<()> {
        if self.chain_id == 0 {
            return Err(ConfigError::InvalidValue {
                field: "chain_id",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        for (field, value) in [
            ("forge_contract", &self.forge_contract),
            ("ledger_contract", &self.ledger_contract),
        ] {
            AccountId::parse(value).map_err(|e| ConfigError::InvalidValue {
                field,
                reason: e.to_string(),
            })?;
        }
        if self.rpc_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(ConfigError::MissingField { field: "rpc_url" }.into());
        }
        url::Url::parse(self.endpoint()).map_err(|e| ConfigError::InvalidValue {
            field: "rpc_url",
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Resolved settings for constructing an EVM ledger.
#[derive(Debug, Clone)]
pub struct EvmRuntimeConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    pub forge_contract: String,
    pub ledger_contract: String,
    /// Hex private key. Without one the ledger is read-only.
    pub private_key: Option<String>,
    pub poll_interval: Duration,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_reference_deployment() {
        let network = NetworkConfig::default();
        assert!(network.is_sepolia());
        assert_eq!(network.endpoint(), PUBLIC_SEPOLIA_RPC);
        assert!(network.validate().is_ok());
    }

    #[test]
    fn infura_key_fills_missing_endpoint() {
        let mut network = NetworkConfig::default();
        network.apply_env(None, Some("abc123".into()));
        assert_eq!(network.endpoint(), "https://sepolia.infura.io/v3/abc123");
    }

    #[test]
    fn infura_key_does_not_replace_configured_endpoint() {
        let mut network = NetworkConfig {
            rpc_url: Some("http://localhost:8545".into()),
            ..NetworkConfig::default()
        };
        network.apply_env(None, Some("abc123".into()));
        assert_eq!(network.endpoint(), "http://localhost:8545");
    }

    #[test]
    fn rpc_override_wins() {
        let mut network = NetworkConfig {
            rpc_url: Some("http://localhost:8545".into()),
            ..NetworkConfig::default()
        };
        network.apply_env(Some("http://10.0.0.2:8545".into()), Some("abc".into()));
        assert_eq!(network.endpoint(), "http://10.0.0.2:8545");
    }

    #[test]
    fn malformed_contract_is_rejected() {
        let network = NetworkConfig {
            forge_contract: "0x1234".into(),
            ..NetworkConfig::default()
        };
        let err = network.validate().unwrap_err();
        assert!(err.to_string().contains("forge_contract"));
    }

    #[test]
    fn zero_chain_id_is_rejected() {
        let network = NetworkConfig {
            chain_id: 0,
            ..NetworkConfig::default()
        };
        assert!(network.validate().is_err());
    }
}
