//! # Chain Client
//!
//! Builds, signs, broadcasts and confirms transactions for one signing
//! account.
//!
//! ## Send sequence
//!
//! 1. Read the account nonce.
//! 2. Estimate gas and scale it by the configured multiplier.
//! 3. Refuse to broadcast if the balance cannot cover
//!    `gas_limit * gas_price + value`.
//! 4. Sign locally and broadcast the raw transaction.
//! 5. Poll for a mined receipt, bounded by the configured attempt budget.
//!
//! Steps 1 through 5 run under a per-client lock. Two sends from the same
//! account never read the same nonce.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use evp_core::{ChainAddress, NetworkId};

use crate::account::SigningAccount;
use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::rpc::{EthRpc, HttpRpc};
use crate::transaction::{CallRequest, LegacyTransaction, Receipt, TxHash};

/// Signs and submits transactions against a node.
///
/// Shared by reference (`Arc<ChainClient>`) between the registry, the
/// identity proxy and every proof engine in a process.
pub struct ChainClient {
    rpc: Arc<dyn EthRpc>,
    account: SigningAccount,
    config: ChainConfig,
    send_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainClient")
            .field("account", &self.account)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ChainClient {
    /// Connect to the node in `config` over HTTP.
    ///
    /// Without a signing account a random key is generated; anything it
    /// sends must be funded first.
    pub fn connect(config: ChainConfig, account: Option<SigningAccount>) -> Result<Self, ChainError> {
        let rpc = HttpRpc::new(&config)?;
        Self::with_rpc(Arc::new(rpc), config, account)
    }

    /// Build a client over any transport.
    pub fn with_rpc(
        rpc: Arc<dyn EthRpc>,
        config: ChainConfig,
        account: Option<SigningAccount>,
    ) -> Result<Self, ChainError> {
        config.validate()?;
        let account = match account {
            Some(account) => account,
            None => {
                let account = SigningAccount::generate();
                tracing::warn!(
                    address = %account.address(),
                    "no signing key configured, generated an ephemeral key"
                );
                account
            }
        };
        Ok(Self {
            rpc,
            account,
            config,
            send_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// The signing account's address.
    pub fn address(&self) -> ChainAddress {
        self.account.address()
    }

    /// The client configuration.
    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// The network id reported by the node.
    pub async fn network_id(&self) -> Result<NetworkId, ChainError> {
        self.rpc.net_version().await
    }

    /// The node's gas estimate for calling `to` with `data` from `from`.
    ///
    /// Node-side failures surface as [`ChainError::GasEstimation`].
    pub async fn estimate_gas(
        &self,
        from: ChainAddress,
        data: &[u8],
        to: ChainAddress,
    ) -> Result<u64, ChainError> {
        self.estimate(&CallRequest {
            from: Some(from),
            to,
            data: data.to_vec(),
            value: 0,
        })
        .await
    }

    async fn estimate(&self, call: &CallRequest) -> Result<u64, ChainError> {
        match self.rpc.estimate_gas(call).await {
            Ok(gas) => Ok(gas),
            Err(ChainError::Rpc { message, .. }) => Err(ChainError::GasEstimation(message)),
            Err(ChainError::InvalidResponse { reason, .. }) => Err(ChainError::GasEstimation(reason)),
            Err(e) => Err(e),
        }
    }

    /// `round(estimate * multiplier)`.
    pub fn gas_limit_for(&self, estimate: u64) -> u64 {
        (estimate as f64 * self.config.gas_limit_multiplier).round() as u64
    }

    /// Read-only contract call from this account.
    pub async fn call(&self, to: ChainAddress, data: Vec<u8>) -> Result<Vec<u8>, ChainError> {
        self.rpc
            .call(&CallRequest {
                from: Some(self.address()),
                to,
                data,
                value: 0,
            })
            .await
    }

    /// Sign, broadcast and confirm a call to `to`.
    ///
    /// Returns the mined receipt. A receipt with `status == false` is still
    /// returned; interpreting a revert is the caller's business.
    pub async fn send_transaction(
        &self,
        to: ChainAddress,
        data: Vec<u8>,
        value: u128,
    ) -> Result<Receipt, ChainError> {
        let _guard = self.send_lock.lock().await;
        let from = self.address();

        let nonce = self.rpc.transaction_count(from).await?;
        let call = CallRequest {
            from: Some(from),
            to,
            data,
            value,
        };
        let estimate = self.estimate(&call).await?;
        let gas_limit = self.gas_limit_for(estimate);
        let gas_price = self.config.gas_price;
        let cost = u128::from(gas_limit)
            .checked_mul(gas_price)
            .and_then(|fee| fee.checked_add(value))
            .unwrap_or(u128::MAX);
        tracing::debug!(%from, %to, nonce, estimate, gas_limit, gas_price, cost, "prepared transaction");

        let balance = self.rpc.balance(from).await?;
        if balance < cost {
            return Err(ChainError::InsufficientBalance {
                gas_price,
                cost,
                balance,
            });
        }

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to,
            value,
            data: call.data,
            chain_id: self.config.chain_id,
        };
        let raw = self.account.sign(&tx)?;
        let tx_hash = self.rpc.send_raw_transaction(&raw).await?;
        tracing::info!(%tx_hash, %to, nonce, "transaction broadcast");

        let receipt = self.wait_for_receipt(&tx_hash).await?;
        tracing::info!(
            %tx_hash,
            block = ?receipt.block_number,
            status = receipt.status,
            "transaction mined"
        );
        Ok(receipt)
    }

    /// Poll for the mined receipt of `tx_hash`.
    ///
    /// Sleeps the poll interval before each of exactly
    /// `receipt_poll_attempts` polls. Only a receipt for this hash with a
    /// block number counts. Node errors abort immediately.
    pub async fn wait_for_receipt(&self, tx_hash: &TxHash) -> Result<Receipt, ChainError> {
        let attempts = self.config.receipt_poll_attempts;
        let mut last_receipt = None;

        for attempt in 1..=attempts {
            tokio::time::sleep(self.config.receipt_poll_interval).await;
            let receipt = self.rpc.transaction_receipt(tx_hash).await?;
            tracing::debug!(%tx_hash, attempt, found = receipt.is_some(), "polled receipt");

            match receipt {
                Some(r) if r.transaction_hash == *tx_hash && r.block_number.is_some() => return Ok(r),
                other => last_receipt = other,
            }
        }

        Err(ChainError::ReceiptTimeout {
            tx_hash: tx_hash.to_hex(),
            attempts,
            last_receipt,
        })
    }

    /// Run `fut` under an overall deadline.
    ///
    /// On expiry the future is dropped, which stops any receipt polling in
    /// progress, and [`ChainError::Cancelled`] is returned.
    pub async fn within<T, F>(deadline: Duration, fut: F) -> Result<T, ChainError>
    where
        F: Future<Output = Result<T, ChainError>>,
    {
        match tokio::time::timeout(deadline, fut).await {
            Ok(result) => result,
            Err(_) => Err(ChainError::Cancelled {
                elapsed_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
