//! # evp-proof -- Proof lifecycle for the EVP attestation stack
//!
//! Binds claims (credentials and presentations) to on-chain accreditation
//! records. Three engines implement [`ProofEngine`]:
//!
//! | Kind | Hashed and accredited | Revocation |
//! |------|-----------------------|------------|
//! | `SmartContract` | canonical text of the claim with its proof | unsupported |
//! | `EthereumAttestationRegistry2019` | same as `SmartContract` | unsupported |
//! | `EthereumAttestationRegistryIntermediateStatus2021` | `{hash, status}` record over the claim hash | `Revoked` record, never expires |
//!
//! The two hash shapes differ and both are fixed: records already on chain
//! were written under them.
//!
//! [`ProofTypeSelector`] picks which proof in a claim to act on, and
//! [`VerifierSet`] routes verification to the engine for that kind.

pub mod claim;
pub mod descriptor;
pub mod engine;
pub mod engines;
pub mod error;
pub mod selector;
pub mod verifier;

pub use claim::Claim;
pub use descriptor::{AccreditationStatus, ProofDescriptor, ProofKind};
pub use engine::{GeneratedProof, ProofEngine, ProofOptions, DEFAULT_VALID_DAYS};
pub use engines::{
    engine_for, status_record_hash, EthereumRegistryProof, IntermediateStatusProof, SmartContractProof,
};
pub use error::ProofError;
pub use selector::{ProofTypeSelector, SelectedProof};
pub use verifier::VerifierSet;
