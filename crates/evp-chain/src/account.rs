//! # Signing Account
//!
//! Owns the secp256k1 key used to sign every transaction. The key never
//! leaves this type: it is not serialized, not logged, and not sent to the
//! node. Transactions are signed locally and broadcast raw.

use evp_core::{keccak256, ChainAddress};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use zeroize::Zeroizing;

use crate::config::ConfigError;
use crate::error::ChainError;
use crate::transaction::{LegacyTransaction, TxSignature};

/// A secp256k1 signing key and the address derived from it.
pub struct SigningAccount {
    key: SigningKey,
    address: ChainAddress,
}

impl std::fmt::Debug for SigningAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningAccount")
            .field("address", &self.address)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl SigningAccount {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        Self::from_key(SigningKey::random(&mut rand_core::OsRng))
    }

    /// Load a key from 64 hex characters, with or without `0x`.
    pub fn from_hex(hex_key: &str) -> Result<Self, ConfigError> {
        let digits = hex_key.trim();
        let digits = digits.strip_prefix("0x").unwrap_or(digits);
        let bytes = Zeroizing::new(
            hex::decode(digits).map_err(|e| ConfigError::InvalidSigningKey(e.to_string()))?,
        );
        if bytes.len() != 32 {
            return Err(ConfigError::InvalidSigningKey(format!(
                "expected 32 bytes, got {}",
                bytes.len()
            )));
        }
        let key = SigningKey::from_slice(&bytes)
            .map_err(|_| ConfigError::InvalidSigningKey("scalar out of range".to_string()))?;
        Ok(Self::from_key(key))
    }

    /// Load the key from `EVP_PRIVATE_KEY`. `None` if the variable is unset.
    pub fn from_env() -> Result<Option<Self>, ConfigError> {
        match std::env::var("EVP_PRIVATE_KEY") {
            Ok(raw) => {
                let raw = Zeroizing::new(raw);
                Self::from_hex(&raw).map(Some)
            }
            Err(_) => Ok(None),
        }
    }

    fn from_key(key: SigningKey) -> Self {
        let address = address_of(key.verifying_key());
        Self { key, address }
    }

    /// The account address.
    pub fn address(&self) -> ChainAddress {
        self.address
    }

    /// Sign a transaction and return its raw RLP encoding.
    pub fn sign(&self, tx: &LegacyTransaction) -> Result<Vec<u8>, ChainError> {
        let hash = tx.signing_hash();
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(&hash)
            .map_err(|e| ChainError::Signing(e.to_string()))?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        let signature = TxSignature {
            v: TxSignature::v_for(recovery_id.to_byte(), tx.chain_id),
            r,
            s,
        };
        Ok(tx.encode_signed(&signature))
    }
}

/// Address of a public key: the last 20 bytes of the Keccak-256 of the
/// uncompressed point without its `0x04` tag.
pub fn address_of(key: &VerifyingKey) -> ChainAddress {
    let point = key.as_affine().to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    ChainAddress::from_bytes(addr)
}

/// Recover the sender of a signed transaction.
pub fn recover_sender(tx: &LegacyTransaction, signature: &TxSignature) -> Result<ChainAddress, ChainError> {
    let (recid, _) = signature.recovery()?;
    let recovery_id = RecoveryId::from_byte(recid)
        .ok_or_else(|| ChainError::Signing(format!("invalid recovery id {recid}")))?;
    let mut rs = [0u8; 64];
    rs[..32].copy_from_slice(&signature.r);
    rs[32..].copy_from_slice(&signature.s);
    let sig = Signature::from_slice(&rs).map_err(|e| ChainError::Signing(e.to_string()))?;
    let key = VerifyingKey::recover_from_prehash(&tx.signing_hash(), &sig, recovery_id)
        .map_err(|e| ChainError::Signing(e.to_string()))?;
    Ok(address_of(&key))
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_ONE: &str = "0x0000000000000000000000000000000000000000000000000000000000000001";

    #[test]
    fn address_of_key_one() {
        let account = SigningAccount::from_hex(KEY_ONE).unwrap();
        assert_eq!(
            account.address().to_checksum(),
            "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf"
        );
    }

    #[test]
    fn eip155_signed_transaction_vector() {
        let account = SigningAccount::from_hex(&"46".repeat(32)).unwrap();
        let tx = LegacyTransaction {
            nonce: 9,
            gas_price: 20_000_000_000,
            gas_limit: 21_000,
            to: ChainAddress::from_bytes([0x35; 20]),
            value: 1_000_000_000_000_000_000,
            data: vec![],
            chain_id: Some(1),
        };
        assert_eq!(
            hex::encode(account.sign(&tx).unwrap()),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn recover_sender_matches_signer() {
        let account = SigningAccount::generate();
        let tx = LegacyTransaction {
            nonce: 0,
            gas_price: 0,
            gas_limit: 50_000,
            to: ChainAddress::from_bytes([0x11; 20]),
            value: 0,
            data: vec![1, 2, 3],
            chain_id: None,
        };
        let raw = account.sign(&tx).unwrap();
        let (decoded, sig) = LegacyTransaction::decode_signed(&raw).unwrap();
        assert_eq!(recover_sender(&decoded, &sig).unwrap(), account.address());
    }

    #[test]
    fn rejects_malformed_keys() {
        assert!(SigningAccount::from_hex("0x1234").is_err());
        assert!(SigningAccount::from_hex("zz").is_err());
        assert!(SigningAccount::from_hex(&"00".repeat(32)).is_err());
    }

    #[test]
    fn debug_redacts_key() {
        let account = SigningAccount::from_hex(KEY_ONE).unwrap();
        let debug = format!("{account:?}");
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("0000000000000000000000000000000000000000000000000000000000000001"));
    }
}
