//! # MNID -- Multi-Network Identifier
//!
//! The method-specific identifier of a `did:ev:` DID. An MNID packs a
//! network id and a 20-byte address into one base58 string:
//!
//! ```text
//! base58( version(0x01) || network bytes || address(20) || checksum(4) )
//! ```
//!
//! The checksum is the first four bytes of SHA3-256 over everything that
//! precedes it. The network bytes are the big-endian network id.

use sha3::{Digest, Sha3_256};

use crate::error::ResolveError;
use crate::identity::{ChainAddress, NetworkId};

const MNID_VERSION: u8 = 0x01;
const CHECKSUM_LEN: usize = 4;
const ADDRESS_LEN: usize = 20;

/// A decoded MNID.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mnid {
    /// The network the address lives on.
    pub network: NetworkId,
    /// The encoded address.
    pub address: ChainAddress,
}

impl Mnid {
    /// Decode a base58 MNID string.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidMnid`] if the string is not valid
    /// base58, is too short, carries an unknown version, has an empty or
    /// oversized network segment, or fails the checksum.
    pub fn decode(encoded: &str) -> Result<Self, ResolveError> {
        let invalid = |reason: &str| ResolveError::InvalidMnid {
            mnid: encoded.to_string(),
            reason: reason.to_string(),
        };

        let data = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| invalid(&format!("base58 decode failed: {e}")))?;
        if data.len() < 1 + ADDRESS_LEN + CHECKSUM_LEN + 1 {
            return Err(invalid("payload too short"));
        }
        if data[0] != MNID_VERSION {
            return Err(invalid(&format!("unknown version {:#04x}", data[0])));
        }

        let net_end = data.len() - ADDRESS_LEN - CHECKSUM_LEN;
        let addr_end = net_end + ADDRESS_LEN;
        let network_bytes = &data[1..net_end];
        if network_bytes.len() > 8 {
            return Err(invalid("network segment longer than 8 bytes"));
        }

        let expected = checksum(&data[..addr_end]);
        if data[addr_end..] != expected {
            return Err(invalid("checksum mismatch"));
        }

        let network = network_bytes
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b));
        let mut address = [0u8; ADDRESS_LEN];
        address.copy_from_slice(&data[net_end..addr_end]);

        Ok(Self {
            network: NetworkId::new(network),
            address: ChainAddress::from_bytes(address),
        })
    }

    /// Encode to the base58 MNID string.
    pub fn encode(&self) -> String {
        let network = self.network.value().to_be_bytes();
        let first = network.iter().position(|b| *b != 0).unwrap_or(network.len() - 1);

        let mut payload = Vec::with_capacity(1 + 8 + ADDRESS_LEN + CHECKSUM_LEN);
        payload.push(MNID_VERSION);
        payload.extend_from_slice(&network[first..]);
        payload.extend_from_slice(self.address.as_bytes());
        let check = checksum(&payload);
        payload.extend_from_slice(&check);
        bs58::encode(payload).into_string()
    }
}

fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = Sha3_256::digest(payload);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_reference_vector() {
        let mnid = Mnid::decode("2nQtiQG6Cgm1GYTBaaKAgr76uY7iSexUkqX").unwrap();
        assert_eq!(mnid.network.value(), 1);
        assert_eq!(
            mnid.address.to_hex(),
            "0x00521965e7bd230323c423d96c657db5b79d099f"
        );
    }

    #[test]
    fn decodes_mumbai_identity() {
        let mnid = Mnid::decode("bmM8YE5vpmntRLWrMV4n5YMYBUSE5xzwYK6nU").unwrap();
        assert_eq!(mnid.network.value(), 80001);
        assert_eq!(
            mnid.address.to_hex(),
            "0xb23ed97aa64ebeb5df0095b025b016526418dcf4"
        );
    }

    #[test]
    fn encode_reproduces_reference_vector() {
        let mnid = Mnid {
            network: NetworkId::new(1),
            address: ChainAddress::parse("0x00521965e7bd230323c423d96c657db5b79d099f").unwrap(),
        };
        assert_eq!(mnid.encode(), "2nQtiQG6Cgm1GYTBaaKAgr76uY7iSexUkqX");
    }

    #[test]
    fn rejects_corrupted_checksum() {
        // Last character altered.
        let err = Mnid::decode("2nQtiQG6Cgm1GYTBaaKAgr76uY7iSexUkqY").unwrap_err();
        assert!(matches!(err, ResolveError::InvalidMnid { .. }));
    }

    #[test]
    fn rejects_non_base58() {
        assert!(Mnid::decode("0OIl").is_err());
        assert!(Mnid::decode("").is_err());
    }
}
