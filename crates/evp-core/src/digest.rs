//! # Claim Hashes
//!
//! Defines [`ClaimHash`], the 32-byte Keccak-256 digest that the
//! verification registry is keyed by.
//!
//! ## Invariant
//!
//! `ClaimHash` can only be computed from [`CanonicalBytes`]. Generation and
//! verification therefore hash exactly the same byte sequence for the same
//! payload shape.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::canonical::CanonicalBytes;
use crate::error::{CanonicalizationError, ValidationError};

/// Compute a raw Keccak-256 digest.
///
/// Used for ABI selectors, address derivation, and transaction hashing.
/// Claim hashing must go through [`ClaimHash::of`] instead.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    Keccak256::digest(data).into()
}

/// Keccak-256 digest of a canonicalized claim payload, rendered as
/// `0x` followed by 64 lowercase hex characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimHash([u8; 32]);

impl ClaimHash {
    /// Hash canonical bytes.
    pub fn from_canonical(data: &CanonicalBytes) -> Self {
        Self(keccak256(data.as_bytes()))
    }

    /// Canonicalize and hash any serializable payload.
    ///
    /// # Errors
    ///
    /// Returns [`CanonicalizationError`] if the payload cannot be
    /// serialized to JSON.
    pub fn of(payload: &impl Serialize) -> Result<Self, CanonicalizationError> {
        Ok(Self::from_canonical(&CanonicalBytes::new(payload)?))
    }

    /// Wrap raw digest bytes, e.g. read back from a contract.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Parse a `0x`-prefixed 64-hex-character hash.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidHash`] on any other shape.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let hex_part = s
            .strip_prefix("0x")
            .filter(|h| h.len() == 64)
            .ok_or_else(|| ValidationError::InvalidHash(s.to_string()))?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(hex_part, &mut bytes)
            .map_err(|_| ValidationError::InvalidHash(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Access the raw 32 bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Return the hash as `0x` + lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Display for ClaimHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for ClaimHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ClaimHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
