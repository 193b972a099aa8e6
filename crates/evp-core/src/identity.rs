//! # Identity Newtypes
//!
//! Domain-primitive newtypes for the identifiers that flow through proof
//! generation and verification. Each is a distinct type: a [`Did`] cannot be
//! passed where a [`ChainAddress`] is expected.
//!
//! ## Validation
//!
//! All string-based identifiers validate their format at construction time.
//! An [`Identity`] is only produced by the
//! [`AddressResolver`](crate::AddressResolver) and is never persisted.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::digest::keccak256;
use crate::error::ValidationError;

// ---------------------------------------------------------------------------
// Did
// ---------------------------------------------------------------------------

/// W3C Decentralized Identifier (DID).
///
/// Format: `did:<method>:<method-specific-id>` where method is lowercase
/// alphanumeric and the method-specific identifier is non-empty.
///
/// Reference: <https://www.w3.org/TR/did-core/#did-syntax>
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Did {
    value: String,
    method_end: usize,
}

impl Did {
    /// Create a DID from a string, validating format.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDid`] if the string does not match
    /// the `did:method:identifier` format.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        let rest = value
            .strip_prefix("did:")
            .ok_or_else(|| ValidationError::InvalidDid(value.clone()))?;
        let colon = rest
            .find(':')
            .ok_or_else(|| ValidationError::InvalidDid(value.clone()))?;
        let method = &rest[..colon];
        let identifier = &rest[colon + 1..];

        if method.is_empty()
            || !method
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            || identifier.is_empty()
        {
            return Err(ValidationError::InvalidDid(value));
        }

        let method_end = 4 + colon;
        Ok(Self { value, method_end })
    }

    /// Access the DID string value.
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Return the DID method (the part between the first and second colons).
    pub fn method(&self) -> &str {
        &self.value[4..self.method_end]
    }

    /// Return the method-specific identifier (everything after `did:method:`).
    pub fn method_specific_id(&self) -> &str {
        &self.value[self.method_end + 1..]
    }
}

impl TryFrom<String> for Did {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Did> for String {
    fn from(did: Did) -> Self {
        did.value
    }
}

impl std::fmt::Display for Did {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.value)
    }
}

// ---------------------------------------------------------------------------
// ChainAddress
// ---------------------------------------------------------------------------

/// A 20-byte account or contract address on an EVM-compatible chain.
///
/// Parsing accepts any hex case. `Display` and serialization emit the
/// EIP-55 mixed-case checksum form, which is what node clients report for
/// contract addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChainAddress([u8; 20]);

impl ChainAddress {
    /// The all-zero address.
    pub const ZERO: ChainAddress = ChainAddress([0u8; 20]);

    /// Wrap raw address bytes.
    pub fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Parse a `0x`-prefixed, 40-hex-character address.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidAddress`] on any other shape.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        if !Self::looks_like_address(s) {
            return Err(ValidationError::InvalidAddress(s.to_string()));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(&s[2..], &mut bytes)
            .map_err(|_| ValidationError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }

    /// Whether `s` has the shape of a raw address (`0x` + 40 hex chars).
    pub fn looks_like_address(s: &str) -> bool {
        s.len() == 42
            && s.starts_with("0x")
            && s[2..].chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Access the raw address bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Lowercase `0x`-prefixed hex form, as sent in JSON-RPC requests.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case checksum form.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let hash = keccak256(lower.as_bytes());
        let mut out = String::with_capacity(42);
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl std::fmt::Display for ChainAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_checksum())
    }
}

impl std::str::FromStr for ChainAddress {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ChainAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum())
    }
}

impl<'de> Deserialize<'de> for ChainAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// NetworkId
// ---------------------------------------------------------------------------

/// Network identifier of an EVM-compatible chain (e.g. 1 for mainnet,
/// 80001 for Polygon Mumbai).
///
/// Serializes as a JSON number. Deserializes from a number, a decimal
/// string, or a `0x` hex string, since nodes and MNIDs report it in all
/// three shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkId(u64);

impl NetworkId {
    /// Wrap a numeric network id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Parse a decimal or `0x`-prefixed hex network id.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidNetworkId`] if the string is not an
    /// unsigned integer in either base.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let trimmed = s.trim();
        let parsed = match trimmed.strip_prefix("0x") {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse::<u64>(),
        };
        parsed
            .map(Self)
            .map_err(|_| ValidationError::InvalidNetworkId(s.to_string()))
    }

    /// The numeric value.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NetworkId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.0)
    }
}

impl<'de> Deserialize<'de> for NetworkId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u64),
            Text(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Number(n) => Ok(Self(n)),
            Repr::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A resolved attester: the identifier it was resolved from, the chain
/// address of its proxy identity, and the network the address lives on.
///
/// Created on demand for each generation or verification call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// The identifier exactly as supplied (a DID, or a raw address).
    pub did: String,
    /// The proxy identity address.
    pub address: ChainAddress,
    /// The network encoded in the DID; `None` for raw addresses.
    pub network: Option<NetworkId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn did_accepts_valid_format() {
        let did = Did::new("did:ev:2nQtiQG6Cgm1GYTBaaKAgr76uY7iSexUkqX").unwrap();
        assert_eq!(did.method(), "ev");
        assert_eq!(did.method_specific_id(), "2nQtiQG6Cgm1GYTBaaKAgr76uY7iSexUkqX");
    }

    #[test]
    fn did_keeps_colons_in_specific_id() {
        let did = Did::new("did:web:example.com:users:alice").unwrap();
        assert_eq!(did.method(), "web");
        assert_eq!(did.method_specific_id(), "example.com:users:alice");
    }

    #[test]
    fn did_rejects_malformed() {
        for bad in ["", "did:", "did:ev", "did::abc", "did:EV:abc", "did:ev:", "ev:abc"] {
            assert!(Did::new(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn did_serde_roundtrip_validates() {
        let json = serde_json::to_string(&Did::new("did:ev:abc").unwrap()).unwrap();
        assert_eq!(json, "\"did:ev:abc\"");
        assert!(serde_json::from_str::<Did>("\"not-a-did\"").is_err());
    }

    #[test]
    fn address_parses_any_case() {
        let lower = ChainAddress::parse("0xec42b9716cdb5d2471186f7b75c4570fdfb9f469").unwrap();
        let mixed = ChainAddress::parse("0xEC42B9716cDb5d2471186F7B75C4570fdfB9F469").unwrap();
        assert_eq!(lower, mixed);
    }

    #[test]
    fn address_rejects_bad_shapes() {
        for bad in ["", "0x", "0x123", "ec42b9716cdb5d2471186f7b75c4570fdfb9f469", "0xGG42b9716cdb5d2471186f7b75c4570fdfb9f469"] {
            assert!(ChainAddress::parse(bad).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn address_checksum_matches_eip55_vectors() {
        for expected in [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ] {
            let addr = ChainAddress::parse(&expected.to_lowercase()).unwrap();
            assert_eq!(addr.to_checksum(), expected);
        }
    }

    #[test]
    fn address_serializes_checksummed() {
        let addr = ChainAddress::parse("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed\"");
        let back: ChainAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn network_id_parses_decimal_and_hex() {
        assert_eq!(NetworkId::parse("80001").unwrap().value(), 80001);
        assert_eq!(NetworkId::parse("0x013881").unwrap().value(), 80001);
        assert!(NetworkId::parse("mumbai").is_err());
    }

    #[test]
    fn network_id_deserializes_number_or_string() {
        let a: NetworkId = serde_json::from_str("80001").unwrap();
        let b: NetworkId = serde_json::from_str("\"80001\"").unwrap();
        let c: NetworkId = serde_json::from_str("\"0x13881\"").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(serde_json::to_string(&a).unwrap(), "80001");
    }
}
