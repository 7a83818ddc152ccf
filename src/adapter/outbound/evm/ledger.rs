//! JSON-RPC [`Ledger`] backed by the forge and balance-ledger contracts.

use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{Address, TxHash, U256};
use alloy_provider::network::{EthereumWallet, ReceiptResponse};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use super::contract::{IForge, IGameLogic};
use super::settings::EvmRuntimeConfig;
use crate::domain::{AccountId, AssetKind, BlockInfo, Receipt, ReceiptStatus, SubmissionHandle};
use crate::error::{ConfigError, Error, LedgerError, Result};
use crate::port::Ledger;

/// Decimals of the chain's native coin.
const NATIVE_DECIMALS: u32 = 18;

/// Consecutive receipt-poll failures tolerated before giving up.
const MAX_POLL_FAILURES: u32 = 3;

/// EVM ledger client.
///
/// Reads go to the balance-ledger contract; writes are signed locally and
/// sent to the forge contract. Without a signing key the ledger is
/// read-only and every write is rejected.
pub struct EvmLedger {
    provider: DynProvider,
    forge: Address,
    game_logic: Address,
    signer: Option<Address>,
    chain_id: u64,
    poll_interval: Duration,
}

impl EvmLedger {
    /// Build a client for the configured endpoint and contracts.
    ///
    /// No request is made; use [`verify_network`](Self::verify_network) to
    /// check the endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a malformed URL, address or
    /// private key.
    #[allow(clippy::result_large_err)]
    pub fn connect(config: &EvmRuntimeConfig) -> Result<Self> {
        let rpc_url: url::Url =
            config
                .rpc_url
                .parse()
                .map_err(|e: url::ParseError| ConfigError::InvalidValue {
                    field: "rpc_url",
                    reason: e.to_string(),
                })?;
        let forge = parse_address("forge_contract", &config.forge_contract)?;
        let game_logic = parse_address("ledger_contract", &config.ledger_contract)?;

        let signer = config
            .private_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(|key| {
                PrivateKeySigner::from_str(key).map_err(|e| ConfigError::InvalidValue {
                    field: "WALLET_PRIVATE_KEY",
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let (provider, signer) = match signer {
            Some(signer) => {
                let address = signer.address();
                let wallet = EthereumWallet::from(signer);
                let provider = ProviderBuilder::new()
                    .wallet(wallet)
                    .connect_http(rpc_url)
                    .erased();
                (provider, Some(address))
            }
            None => (ProviderBuilder::new().connect_http(rpc_url).erased(), None),
        };

        debug!(
            forge = %forge,
            game_logic = %game_logic,
            signer = ?signer,
            chain_id = config.chain_id,
            "EVM ledger configured"
        );

        Ok(Self {
            provider,
            forge,
            game_logic,
            signer,
            chain_id: config.chain_id,
            poll_interval: config.poll_interval,
        })
    }

    /// Account of the configured signing key.
    #[must_use]
    pub fn signer(&self) -> Option<AccountId> {
        self.signer.and_then(|a| AccountId::parse(&a.to_string()).ok())
    }

    /// Chain id this client expects.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Check that the endpoint serves the configured chain.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NetworkMismatch`] on a different chain, or a
    /// [`LedgerError::Unavailable`] if the endpoint cannot be queried.
    pub async fn verify_network(&self) -> Result<()> {
        let actual = self
            .provider
            .get_chain_id()
            .await
            .map_err(|e| LedgerError::Unavailable(format!("eth_chainId failed: {e}")))?;
        if actual != self.chain_id {
            return Err(Error::NetworkMismatch {
                expected: self.chain_id,
                actual,
            });
        }
        info!(chain_id = actual, "Connected to expected network");
        Ok(())
    }

    /// Native coin balance of `account`, in whole coins.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Unavailable`] if the balance cannot be read.
    pub async fn native_balance(&self, account: &AccountId) -> std::result::Result<Decimal, LedgerError> {
        let address = to_address(account)?;
        let wei = self
            .provider
            .get_balance(address)
            .await
            .map_err(|e| LedgerError::Unavailable(format!("eth_getBalance failed: {e}")))?;
        from_wei(wei)
    }

    fn authorize(&self, account: &AccountId) -> std::result::Result<(), LedgerError> {
        let signer = self
            .signer
            .ok_or_else(|| LedgerError::Rejected("no signing key configured".into()))?;
        if to_address(account)? != signer {
            return Err(LedgerError::Rejected(format!(
                "account {account} is not the configured signer"
            )));
        }
        Ok(())
    }

    fn forge_contract(&self) -> IForge::IForgeInstance<DynProvider> {
        IForge::new(self.forge, self.provider.clone())
    }

    fn game_logic_contract(&self) -> IGameLogic::IGameLogicInstance<DynProvider> {
        IGameLogic::new(self.game_logic, self.provider.clone())
    }
}

#[async_trait]
impl Ledger for EvmLedger {
    async fn batch_balance_of(
        &self,
        accounts: &[AccountId],
        kinds: &[AssetKind],
    ) -> std::result::Result<Vec<u128>, LedgerError> {
        let owners = accounts
            .iter()
            .map(to_address)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let ids = kinds.iter().map(|k| U256::from(k.id())).collect::<Vec<_>>();

        let values = self
            .game_logic_contract()
            .balanceOfBatch(owners, ids)
            .call()
            .await
            .map_err(|e| LedgerError::Unavailable(format!("balanceOfBatch failed: {e}")))?;

        values
            .into_iter()
            .map(|v| {
                u128::try_from(v)
                    .map_err(|_| LedgerError::Unavailable(format!("balance {v} exceeds u128")))
            })
            .collect()
    }

    async fn last_acquire_timestamp(&self, account: &AccountId) -> std::result::Result<u64, LedgerError> {
        let last = self
            .game_logic_contract()
            .lastMint(to_address(account)?)
            .call()
            .await
            .map_err(|e| LedgerError::Unavailable(format!("lastMint failed: {e}")))?;
        Ok(u64::try_from(last).unwrap_or(u64::MAX))
    }

    async fn write_acquire(
        &self,
        account: &AccountId,
        kind: AssetKind,
    ) -> std::result::Result<SubmissionHandle, LedgerError> {
        self.authorize(account)?;
        let pending = self
            .forge_contract()
            .mintToken(U256::from(kind.id()))
            .send()
            .await
            .map_err(classify_send_error)?;
        Ok(handle_for(*pending.tx_hash(), "mintToken"))
    }

    async fn write_transform(
        &self,
        account: &AccountId,
        kind: AssetKind,
    ) -> std::result::Result<SubmissionHandle, LedgerError> {
        self.authorize(account)?;
        let pending = self
            .forge_contract()
            .forgeItem(U256::from(kind.id()))
            .send()
            .await
            .map_err(classify_send_error)?;
        Ok(handle_for(*pending.tx_hash(), "forgeItem"))
    }

    async fn write_exchange(
        &self,
        account: &AccountId,
        want: AssetKind,
        give: AssetKind,
    ) -> std::result::Result<SubmissionHandle, LedgerError> {
        self.authorize(account)?;
        let pending = self
            .forge_contract()
            .tradeItem(U256::from(want.id()), U256::from(give.id()))
            .send()
            .await
            .map_err(classify_send_error)?;
        Ok(handle_for(*pending.tx_hash(), "tradeItem"))
    }

    async fn await_receipt(&self, handle: &SubmissionHandle) -> std::result::Result<Receipt, LedgerError> {
        let hash = TxHash::from_str(handle.as_str())
            .map_err(|e| LedgerError::Unavailable(format!("malformed handle {handle}: {e}")))?;

        let mut failures = 0;
        loop {
            match self.provider.get_transaction_receipt(hash).await {
                Ok(Some(receipt)) => {
                    let status = if receipt.status() {
                        ReceiptStatus::Success
                    } else {
                        ReceiptStatus::Reverted
                    };
                    return Ok(Receipt {
                        status,
                        block: BlockInfo {
                            number: receipt.block_number().unwrap_or_default(),
                            hash: receipt.block_hash().map(|h| h.to_string()),
                        },
                    });
                }
                Ok(None) => failures = 0,
                Err(e) => {
                    failures += 1;
                    warn!(handle = %handle, attempt = failures, error = %e, "Receipt poll failed");
                    if failures >= MAX_POLL_FAILURES {
                        return Err(LedgerError::Unavailable(format!(
                            "eth_getTransactionReceipt failed: {e}"
                        )));
                    }
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    fn ledger_name(&self) -> &'static str {
        "evm"
    }
}

fn handle_for(hash: TxHash, method: &'static str) -> SubmissionHandle {
    info!(tx_hash = %hash, method, "Transaction broadcast");
    SubmissionHandle::new(hash.to_string())
}

/// A node error response means the write was refused (reverting estimate,
/// bad nonce, insufficient funds); anything on the transport is transient.
fn classify_send_error(error: alloy_contract::Error) -> LedgerError {
    match error {
        alloy_contract::Error::TransportError(e) if e.is_error_resp() => {
            LedgerError::Rejected(e.to_string())
        }
        alloy_contract::Error::TransportError(e) => LedgerError::Unavailable(e.to_string()),
        other => LedgerError::Rejected(other.to_string()),
    }
}

#[allow(clippy::result_large_err)]
fn parse_address(field: &'static str, value: &str) -> Result<Address> {
    Address::from_str(value).map_err(|e| {
        ConfigError::InvalidValue {
            field,
            reason: e.to_string(),
        }
        .into()
    })
}

fn to_address(account: &AccountId) -> std::result::Result<Address, LedgerError> {
    Address::from_str(account.as_str())
        .map_err(|e| LedgerError::Rejected(format!("invalid account {account}: {e}")))
}

fn from_wei(wei: U256) -> std::result::Result<Decimal, LedgerError> {
    let units = u128::try_from(wei)
        .ok()
        .and_then(|u| i128::try_from(u).ok())
        .ok_or_else(|| LedgerError::Unavailable(format!("balance {wei} out of range")))?;
    Decimal::try_from_i128_with_scale(units, NATIVE_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|e| LedgerError::Unavailable(format!("balance {wei} out of range: {e}")))
}
