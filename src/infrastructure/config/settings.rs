//! Application configuration loading and validation.
//!
//! Provides the main [`Config`] struct that aggregates all application settings.
//! Configuration is loaded from a TOML file with environment variable overrides
//! for the endpoint and for sensitive values like `WALLET_PRIVATE_KEY`.
//!
//! # Example
//!
//! ```no_run
//! use forgekeeper::infrastructure::config::settings::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::confirmation::ConfirmationConfig;
use super::logging::LoggingConfig;
use super::wallet::{decrypt_keystore_private_key, WalletConfig};
use crate::adapter::outbound::evm::settings::{EvmRuntimeConfig, NetworkConfig};
use crate::application::orchestration::OrchestratorConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
///
/// Every table is optional; an empty file targets the reference Sepolia
/// deployment through a public endpoint.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Endpoint, chain and contract addresses.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Receipt polling and tracking limits.
    #[serde(default)]
    pub confirmation: ConfirmationConfig,

    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Wallet configuration for signing writes.
    ///
    /// Private key is loaded from `WALLET_PRIVATE_KEY` environment variable.
    #[serde(default)]
    pub wallet: WalletConfig,
}

fn read_keystore_password(env: &dyn Fn(&str) -> Option<String>) -> Result<String> {
    if let Some(password) = env("FORGEKEEPER_KEYSTORE_PASSWORD") {
        return Ok(password);
    }
    if let Some(path) = env("FORGEKEEPER_KEYSTORE_PASSWORD_FILE") {
        let contents = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let password = contents.trim().to_string();
        if password.is_empty() {
            return Err(ConfigError::MissingField {
                field: "FORGEKEEPER_KEYSTORE_PASSWORD_FILE",
            }
            .into());
        }
        return Ok(password);
    }

    Err(ConfigError::MissingField {
        field: "FORGEKEEPER_KEYSTORE_PASSWORD",
    }
    .into())
}

impl Config {
    /// Parse configuration from TOML content, reading overrides from the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The TOML content is malformed
    /// - Validation fails (e.g., a malformed contract address)
    /// - Keystore decryption fails when using keystore authentication
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        Self::parse_toml_with_env(content, &|key| std::env::var(key).ok())
    }

    /// Parse configuration from TOML content with an explicit environment.
    ///
    /// # Errors
    ///
    /// See [`parse_toml`](Self::parse_toml).
    #[allow(clippy::result_large_err)]
    pub fn parse_toml_with_env(
        content: &str,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;

        config
            .network
            .apply_env(env("FORGEKEEPER_RPC_URL"), env("INFURA_API_KEY"));

        // Load private key from environment variable (never from config file for security)
        config.wallet.private_key = env("WALLET_PRIVATE_KEY").filter(|k| !k.trim().is_empty());
        if config.wallet.private_key.is_none() {
            if let Some(ref keystore_path) = config.wallet.keystore_path {
                let password = read_keystore_password(env)?;
                config.wallet.private_key =
                    Some(decrypt_keystore_private_key(keystore_path, &password)?);
            }
        }

        config.validate()?;

        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Load from `path` if it exists, otherwise use defaults plus the
    /// environment.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    #[allow(clippy::result_large_err)]
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Self::parse_toml("")
        }
    }

    /// Validate configuration values.
    #[allow(clippy::result_large_err)]
    fn validate(&self) -> Result<()> {
        self.network.validate()?;

        if self.confirmation.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "poll_interval_ms",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.confirmation.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "timeout_secs",
                reason: "must be greater than 0 when set".to_string(),
            }
            .into());
        }
        if self.confirmation.event_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "event_capacity",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if let Err(reason) = self.logging.validate() {
            return Err(ConfigError::InvalidValue {
                field: "format",
                reason: reason.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Orchestrator settings derived from `[confirmation]`.
    #[must_use]
    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            confirmation_timeout: self.confirmation.timeout(),
            event_capacity: self.confirmation.event_capacity,
        }
    }

    /// Settings for constructing the EVM ledger.
    #[must_use]
    pub fn evm_runtime(&self) -> EvmRuntimeConfig {
        EvmRuntimeConfig {
            rpc_url: self.network.endpoint().to_string(),
            chain_id: self.network.chain_id,
            forge_contract: self.network.forge_contract.clone(),
            ledger_contract: self.network.ledger_contract.clone(),
            private_key: self.wallet.private_key.clone(),
            poll_interval: self.confirmation.poll_interval(),
        }
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}
