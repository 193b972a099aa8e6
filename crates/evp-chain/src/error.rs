//! Chain client error types.

use evp_core::{ChainAddress, ResolveError, ValidationError};

use crate::transaction::Receipt;

/// Errors from chain interaction.
///
/// Every variant is surfaced to the caller unmodified. The only condition
/// handled internally is receipt polling, which is bounded and ends in
/// [`ChainError::ReceiptTimeout`].
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Configuration error (missing node URL, bad key, bad numeric option).
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// HTTP transport error talking to the node.
    #[error("HTTP error calling {method}: {source}")]
    Http {
        method: String,
        source: reqwest::Error,
    },

    /// The node answered with a JSON-RPC error object.
    #[error("node rejected {method}: {message}")]
    Rpc { method: String, message: String },

    /// The node answered with something that is not the expected shape.
    #[error("unexpected response to {method}: {reason}")]
    InvalidResponse { method: String, reason: String },

    /// Gas estimation failed; wraps the node's message.
    #[error("gas estimation failed: {0}")]
    GasEstimation(String),

    /// Balance does not cover `gas_limit * gas_price + value`.
    #[error("insufficient balance: gas price {gas_price}, cost {cost}, balance {balance}")]
    InsufficientBalance {
        gas_price: u128,
        cost: u128,
        balance: u128,
    },

    /// No mined receipt was observed within the polling budget.
    #[error("no receipt for {tx_hash} after {attempts} attempts")]
    ReceiptTimeout {
        tx_hash: String,
        attempts: u32,
        last_receipt: Option<Receipt>,
    },

    /// The signing account lacks a capability on the proxy identity.
    #[error("required capability \"{capability}\" missing for device {device} on identity {identity}")]
    MissingCapability {
        capability: String,
        identity: ChainAddress,
        device: ChainAddress,
    },

    /// The caller's deadline expired before the operation completed.
    #[error("operation cancelled after {elapsed_ms}ms")]
    Cancelled { elapsed_ms: u64 },

    /// Local signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// RLP or ABI encoding/decoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// An attester identifier could not be resolved to an address.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A payload could not be canonicalized for hashing.
    #[error(transparent)]
    Canonicalization(#[from] evp_core::CanonicalizationError),
}

impl From<ValidationError> for ChainError {
    fn from(e: ValidationError) -> Self {
        Self::Resolve(ResolveError::Validation(e))
    }
}
