//! # Accreditation Registry
//!
//! Hashes claim payloads and builds, reads and revokes accreditation
//! records on the verification registry contract.
//!
//! Records are keyed by `(hash, attester)`. A record with `issued_at == 0`
//! does not exist. `expires_at == 0` never expires. Otherwise the record is
//! valid while `expires_at * 1000 >= now` in milliseconds.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use evp_core::{AddressResolver, ChainAddress, ClaimHash, Clock, SystemClock};
use serde::Serialize;

use crate::abi::{self, ParamType, Token};
use crate::client::ChainClient;
use crate::error::ChainError;

/// `verify(bytes32 hash, uint256 validDays)`
pub const VERIFY: &str = "verify(bytes32,uint256)";
/// `verifications(bytes32 hash, address attester) -> (uint256 iat, uint256 exp)`
pub const VERIFICATIONS: &str = "verifications(bytes32,address)";
/// `revoke(bytes32 hash)`
pub const REVOKE: &str = "revoke(bytes32)";

/// An unsigned contract call, ready to be sent or relayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    /// Target contract.
    pub to: ChainAddress,
    /// ABI-encoded calldata.
    pub data: Vec<u8>,
}

/// An on-chain accreditation record, in seconds since the epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AccreditationRecord {
    /// When the record was written; zero if absent.
    pub issued_at: u64,
    /// When it lapses; zero if never.
    pub expires_at: u64,
}

impl AccreditationRecord {
    /// Apply the validity rule at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if self.issued_at == 0 {
            return false;
        }
        if self.expires_at == 0 {
            return true;
        }
        i128::from(self.expires_at) * 1000 >= i128::from(now.timestamp_millis())
    }
}

/// Outcome of a registry lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Accreditation {
    /// The record is present and not expired.
    pub valid: bool,
    /// Seconds since the epoch; zero if absent.
    pub issued_at: u64,
    /// Seconds since the epoch; zero if never expiring.
    pub expires_at: u64,
}

/// Handle on a deployed verification registry.
#[derive(Debug, Clone)]
pub struct AccreditationRegistry {
    address: ChainAddress,
    client: Arc<ChainClient>,
    resolver: AddressResolver,
    clock: Arc<dyn Clock>,
}

impl AccreditationRegistry {
    /// Bind to the registry at `address`, judging expiry by the system clock.
    pub fn new(address: ChainAddress, client: Arc<ChainClient>) -> Self {
        Self {
            address,
            client,
            resolver: AddressResolver::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Judge expiry by `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The registry contract address.
    pub fn address(&self) -> ChainAddress {
        self.address
    }

    /// The same registry deployed at another address.
    pub fn at(&self, address: ChainAddress) -> Self {
        Self {
            address,
            ..self.clone()
        }
    }

    /// Canonical Keccak-256 hash of a claim payload.
    pub fn canonical_hash(payload: &impl Serialize) -> Result<ClaimHash, ChainError> {
        Ok(ClaimHash::of(payload)?)
    }

    /// Call that accredits `hash` for `valid_days` (zero: no expiry).
    pub fn accredit(&self, hash: &ClaimHash, valid_days: u64) -> ContractCall {
        ContractCall {
            to: self.address,
            data: abi::encode_call(
                VERIFY,
                &[
                    Token::FixedBytes32(*hash.as_bytes()),
                    Token::Uint(u128::from(valid_days)),
                ],
            ),
        }
    }

    /// Call that revokes the sender's accreditation of `hash`.
    pub fn revoke(&self, hash: &ClaimHash) -> ContractCall {
        ContractCall {
            to: self.address,
            data: abi::encode_call(REVOKE, &[Token::FixedBytes32(*hash.as_bytes())]),
        }
    }

    /// Revoke `hash` as this client's own account. Returns the receipt status.
    pub async fn revoke_direct(&self, hash: &ClaimHash) -> Result<bool, ChainError> {
        let call = self.revoke(hash);
        let receipt = self.client.send_transaction(call.to, call.data, 0).await?;
        Ok(receipt.status)
    }

    /// Read the raw record for `(hash, attester)`.
    pub async fn verifications(
        &self,
        hash: &ClaimHash,
        attester: ChainAddress,
    ) -> Result<AccreditationRecord, ChainError> {
        let data = abi::encode_call(
            VERIFICATIONS,
            &[Token::FixedBytes32(*hash.as_bytes()), Token::Address(attester)],
        );
        let output = self.client.call(self.address, data).await?;
        match abi::decode(&[ParamType::Uint, ParamType::Uint], &output)?.as_slice() {
            [Token::Uint(iat), Token::Uint(exp)] => Ok(AccreditationRecord {
                issued_at: timestamp(*iat)?,
                expires_at: timestamp(*exp)?,
            }),
            other => Err(ChainError::Encoding(format!("verifications returned {other:?}"))),
        }
    }

    /// Hash `payload` and check its accreditation by `attester` (a DID).
    pub async fn verify(&self, payload: &impl Serialize, attester: &str) -> Result<Accreditation, ChainError> {
        let hash = Self::canonical_hash(payload)?;
        self.verify_hash(&hash, attester).await
    }

    /// Check the accreditation of an already-computed hash.
    pub async fn verify_hash(&self, hash: &ClaimHash, attester: &str) -> Result<Accreditation, ChainError> {
        let identity = self.resolver.resolve(attester)?;
        let record = self.verifications(hash, identity.address).await?;
        let valid = record.is_valid_at(self.clock.now());
        tracing::debug!(%hash, attester, valid, issued_at = record.issued_at, expires_at = record.expires_at, "checked accreditation");
        Ok(Accreditation {
            valid,
            issued_at: record.issued_at,
            expires_at: record.expires_at,
        })
    }
}

fn timestamp(value: u128) -> Result<u64, ChainError> {
    u64::try_from(value).map_err(|_| ChainError::Encoding(format!("timestamp {value} exceeds 64 bits")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at_secs(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().unwrap()
    }

    #[test]
    fn absent_record_is_invalid() {
        let record = AccreditationRecord { issued_at: 0, expires_at: 0 };
        assert!(!record.is_valid_at(at_secs(0)));
        let record = AccreditationRecord { issued_at: 0, expires_at: u64::MAX };
        assert!(!record.is_valid_at(at_secs(1)));
    }

    #[test]
    fn zero_expiry_never_lapses() {
        let record = AccreditationRecord { issued_at: 1_600_000_000, expires_at: 0 };
        assert!(record.is_valid_at(at_secs(4_000_000_000)));
    }

    #[test]
    fn expiry_is_inclusive_to_the_millisecond() {
        let record = AccreditationRecord { issued_at: 1, expires_at: 1_000 };
        assert!(record.is_valid_at(Utc.timestamp_millis_opt(1_000_000).single().unwrap()));
        assert!(!record.is_valid_at(Utc.timestamp_millis_opt(1_000_001).single().unwrap()));
    }

    proptest! {
        #[test]
        fn validity_rule_holds(iat in 0u64..u64::MAX / 2, exp in 0u64..4_000_000_000, now in 0i64..4_000_000_000_000) {
            let record = AccreditationRecord { issued_at: iat, expires_at: exp };
            let now_dt = Utc.timestamp_millis_opt(now).single().unwrap();
            let expected = iat != 0 && (exp == 0 || i128::from(exp) * 1000 >= i128::from(now));
            prop_assert_eq!(record.is_valid_at(now_dt), expected);
        }
    }

    #[test]
    fn accredit_and_revoke_calldata() {
        let hash = ClaimHash::from_bytes([0x11; 32]);
        let data = abi::encode_call(VERIFY, &[Token::FixedBytes32([0x11; 32]), Token::Uint(30)]);
        assert_eq!(&data[..4], &hex::decode("382262fc").unwrap()[..]);
        assert_eq!(data.len(), 4 + 64);
        let revoke = abi::encode_call(REVOKE, &[Token::FixedBytes32(*hash.as_bytes())]);
        assert_eq!(&revoke[..4], &hex::decode("b75c7dc6").unwrap()[..]);
    }
}
