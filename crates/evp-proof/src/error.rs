//! Proof lifecycle errors.

use evp_chain::ChainError;
use evp_core::{CanonicalizationError, ResolveError};

use crate::descriptor::ProofKind;

/// Errors from generating, verifying or revoking a proof.
///
/// `verify_proof` returns `Ok(false)` only for a well-formed claim whose
/// record is absent, expired or revoked. Every other failure, including
/// network and configuration errors, is an `Err`.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    /// Chain interaction failed (gas, balance, receipt timeout, capability).
    #[error(transparent)]
    Chain(#[from] ChainError),

    /// The attester identifier could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The claim could not be hashed.
    #[error(transparent)]
    Canonicalization(#[from] CanonicalizationError),

    /// No proof of a known type, or a proof of another engine's type.
    #[error("unsupported proof type: {found}")]
    UnsupportedProofType { found: String },

    /// The claim names neither an issuer nor a holder.
    #[error("the issuer or holder is required")]
    IssuerOrHolderRequired,

    /// The accreditation transaction was mined but reverted.
    #[error("the information could not be accredited (transaction {tx_hash})")]
    AccreditationFailed { tx_hash: String },

    /// Engine options are malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The engine does not implement the operation.
    #[error("{operation} is not supported for {kind} proofs")]
    UnsupportedOperation {
        operation: &'static str,
        kind: ProofKind,
    },

    /// The claim is not a JSON object.
    #[error("invalid claim: {0}")]
    InvalidClaim(String),
}

impl From<serde_json::Error> for ProofError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidClaim(e.to_string())
    }
}
