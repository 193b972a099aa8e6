//! # Error Hierarchy
//!
//! Structured error types for the foundational layer, built with `thiserror`.
//! Each variant carries the offending input so operators can diagnose a
//! rejected identifier without re-running the call.

use thiserror::Error;

/// Validation errors for identifier newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// DID does not conform to W3C DID syntax (did:method:identifier).
    #[error("invalid DID format: \"{0}\" (expected did:<method>:<identifier>)")]
    InvalidDid(String),

    /// Chain address is not `0x` followed by 40 hex characters.
    #[error("invalid chain address: \"{0}\" (expected 0x followed by 40 hex characters)")]
    InvalidAddress(String),

    /// Network identifier is neither a decimal nor a `0x` hex integer.
    #[error("invalid network id: \"{0}\"")]
    InvalidNetworkId(String),

    /// Claim hash is not `0x` followed by 64 hex characters.
    #[error("invalid claim hash: \"{0}\" (expected 0x followed by 64 hex characters)")]
    InvalidHash(String),
}

/// Errors raised while turning an identifier string into an [`Identity`](crate::Identity).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// An empty identifier was supplied.
    #[error("a DID is required")]
    DidRequired,

    /// The DID uses a method this resolver does not know.
    #[error("unsupported DID method \"{method}\" in {did}")]
    UnsupportedMethod {
        /// The method segment that was not recognized.
        method: String,
        /// The full DID.
        did: String,
    },

    /// The input is neither a DID nor a raw chain address.
    #[error("identifier not recognized: \"{0}\" (required format: did:ev:<mnid>)")]
    UnrecognizedIdentifier(String),

    /// The method-specific identifier is not a well-formed MNID.
    #[error("invalid MNID \"{mnid}\": {reason}")]
    InvalidMnid {
        /// The encoded MNID.
        mnid: String,
        /// Why decoding failed.
        reason: String,
    },

    /// Identifier passed syntactic checks but a component failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_did_display() {
        let err = ValidationError::InvalidDid("bad:did".to_string());
        assert!(format!("{err}").contains("bad:did"));
    }

    #[test]
    fn invalid_address_display() {
        let err = ValidationError::InvalidAddress("0x12".to_string());
        let msg = format!("{err}");
        assert!(msg.contains("0x12"));
        assert!(msg.contains("40 hex"));
    }

    #[test]
    fn unsupported_method_display() {
        let err = ResolveError::UnsupportedMethod {
            method: "web".to_string(),
            did: "did:web:example.com".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("web"));
        assert!(msg.contains("did:web:example.com"));
    }

    #[test]
    fn validation_wraps_transparently() {
        let err = ResolveError::from(ValidationError::InvalidNetworkId("x".to_string()));
        assert_eq!(format!("{err}"), "invalid network id: \"x\"");
    }

    #[test]
    fn invalid_mnid_display() {
        let err = ResolveError::InvalidMnid {
            mnid: "abc".to_string(),
            reason: "checksum mismatch".to_string(),
        };
        assert!(format!("{err}").contains("checksum mismatch"));
    }
}
