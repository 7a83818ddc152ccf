//! Wallet configuration for signing writes.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Wallet configuration for signing writes.
/// Private key is loaded from `WALLET_PRIVATE_KEY` env var at runtime (never from config file).
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WalletConfig {
    /// Optional keystore path for encrypted wallet storage.
    #[serde(default)]
    pub keystore_path: Option<String>,
    /// Private key loaded from `WALLET_PRIVATE_KEY` env var at runtime
    #[serde(skip)]
    pub private_key: Option<String>,
}

impl WalletConfig {
    /// True when a signing key is available.
    #[must_use]
    pub fn has_signer(&self) -> bool {
        self.private_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

#[cfg(feature = "evm")]
#[allow(clippy::result_large_err)]
pub(crate) fn decrypt_keystore_private_key(path: &str, password: &str) -> Result<String> {
    use alloy_signer_local::PrivateKeySigner;

    let signer = PrivateKeySigner::decrypt_keystore(path, password).map_err(|e| {
        ConfigError::InvalidValue {
            field: "keystore_path",
            reason: e.to_string(),
        }
    })?;
    Ok(format!("{:x}", signer.to_bytes()))
}

#[cfg(not(feature = "evm"))]
#[allow(clippy::result_large_err)]
pub(crate) fn decrypt_keystore_private_key(_path: &str, _password: &str) -> Result<String> {
    Err(ConfigError::InvalidValue {
        field: "keystore_path",
        reason: "keystore support requires the evm feature".to_string(),
    }
    .into())
}
