//! # Proof Descriptors
//!
//! The `proof` object attached to a claim after accreditation. It records
//! which mechanism backs the claim and where:
//!
//! ```json
//! {"contractAddress": "0x…", "networkId": 80001, "type": "SmartContract"}
//! ```
//!
//! `hash` and `status` are optional and carried through when present.

use evp_core::{ChainAddress, ClaimHash, NetworkId};
use serde::{Deserialize, Serialize};

/// The closed set of proof mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ProofKind {
    /// Registry accreditation of the serialized claim, tagged for the 2019
    /// attestation registry.
    EthereumAttestationRegistry2019,
    /// Accreditation of a `{hash, status}` record, so a revocation can be
    /// written alongside the valid record.
    EthereumAttestationRegistryIntermediateStatus2021,
    /// Registry accreditation of the serialized claim.
    SmartContract,
}

impl ProofKind {
    /// All kinds, in declaration order.
    pub const ALL: [ProofKind; 3] = [
        ProofKind::EthereumAttestationRegistry2019,
        ProofKind::EthereumAttestationRegistryIntermediateStatus2021,
        ProofKind::SmartContract,
    ];

    /// The `type` tag carried in the proof descriptor.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::EthereumAttestationRegistry2019 => "EthereumAttestationRegistry2019",
            Self::EthereumAttestationRegistryIntermediateStatus2021 => {
                "EthereumAttestationRegistryIntermediateStatus2021"
            }
            Self::SmartContract => "SmartContract",
        }
    }

    /// Look up a kind by its tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

impl std::fmt::Display for ProofKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

impl std::str::FromStr for ProofKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("unknown proof type \"{s}\""))
    }
}

/// Status carried by an intermediate-status record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccreditationStatus {
    /// The claim is attested.
    Valid,
    /// The attestation was withdrawn.
    Revoked,
}

/// Metadata attached to a claim identifying the accreditation behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofDescriptor {
    /// Verification registry holding the record.
    pub contract_address: ChainAddress,
    /// Network the registry is deployed on.
    pub network_id: NetworkId,
    /// Mechanism tag.
    #[serde(rename = "type")]
    pub kind: ProofKind,
    /// Hash the record was written under, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<ClaimHash>,
    /// Status of the record, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AccreditationStatus>,
}

impl ProofDescriptor {
    /// Descriptor with no hash or status.
    pub fn new(contract_address: ChainAddress, network_id: NetworkId, kind: ProofKind) -> Self {
        Self {
            contract_address,
            network_id,
            kind,
            hash: None,
            status: None,
        }
    }
}
