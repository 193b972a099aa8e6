//! A credential or presentation, treated as an attribute bag.
//!
//! Engines read `issuer`, `holder` and `proof`, and write `proof`. Every
//! other attribute is opaque and hashed as given.

use evp_core::CanonicalBytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::descriptor::ProofDescriptor;
use crate::error::ProofError;

/// A claim: a JSON object with at least an `issuer` or a `holder`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claim(Map<String, Value>);

impl Claim {
    /// Wrap a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, ProofError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ProofError::InvalidClaim(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Parse JSON text, such as the serialized output of a smart-contract
    /// proof.
    pub fn parse(text: &str) -> Result<Self, ProofError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// The identifier of whoever attests the claim: `issuer`, falling back
    /// to `holder`. An issuer object contributes its `id`.
    pub fn attester(&self) -> Result<&str, ProofError> {
        ["issuer", "holder"]
            .iter()
            .filter_map(|field| match self.0.get(*field)? {
                Value::String(s) => Some(s.as_str()),
                Value::Object(obj) => obj.get("id").and_then(Value::as_str),
                _ => None,
            })
            .find(|s| !s.is_empty())
            .ok_or(ProofError::IssuerOrHolderRequired)
    }

    /// The raw `proof` attribute.
    pub fn proof(&self) -> Option<&Value> {
        self.0.get("proof")
    }

    /// `proof.type` when `proof` is a single object.
    pub fn proof_type(&self) -> Option<&str> {
        self.proof()?.get("type")?.as_str()
    }

    /// A copy of this claim with `proof` replaced by `descriptor`.
    pub fn with_proof(&self, descriptor: &ProofDescriptor) -> Result<Self, ProofError> {
        let mut map = self.0.clone();
        map.insert("proof".to_string(), serde_json::to_value(descriptor)?);
        Ok(Self(map))
    }

    /// Canonical JSON text (sorted keys, compact).
    pub fn to_canonical_string(&self) -> Result<String, ProofError> {
        Ok(CanonicalBytes::to_json_string(&self.0)?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
