//! # Canonical Serialization
//!
//! This module defines [`CanonicalBytes`], the sole construction path for
//! bytes that feed [`ClaimHash`](crate::ClaimHash) computation.
//!
//! ## Rules
//!
//! 1. A payload that serializes to a JSON string is hashed as its raw UTF-8
//!    text. A claim that has already been serialized is therefore hashed
//!    exactly as it was serialized.
//! 2. Any other payload is serialized in JCS form (RFC 8785) through
//!    `serde_jcs`: sorted keys at every depth, compact separators.
//!
//! Together these make `hash(s) == hash(parse(s))` for every string `s`
//! produced by [`CanonicalBytes::to_json_string`].

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by canonical serialization.
///
/// The inner `Vec<u8>` is private; downstream code cannot construct
/// `CanonicalBytes` except through [`CanonicalBytes::new()`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        match serde_json::to_value(obj)? {
            Value::String(s) => Ok(Self(s.into_bytes())),
            other => Ok(Self(serialize_canonical(&other)?.into_bytes())),
        }
    }

    /// Serialize a value to the canonical JSON text.
    ///
    /// Unlike [`CanonicalBytes::new`], a string payload is emitted as a
    /// quoted JSON string.
    pub fn to_json_string(obj: &impl Serialize) -> Result<String, CanonicalizationError> {
        serialize_canonical(&serde_json::to_value(obj)?)
    }

    /// Access the canonical bytes for hashing.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

fn serialize_canonical(value: &Value) -> Result<String, CanonicalizationError> {
    Ok(serde_jcs::to_string(value)?)
}
