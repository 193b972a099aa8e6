//! # Intermediate-Status Proofs
//!
//! Instead of accrediting the claim hash directly, this engine accredits a
//! status record `{hash, status}` where `hash` is the canonical hash of the
//! claim with its proof attached. Revocation writes a second record with
//! status `Revoked` and no expiry. Verification checks the revoked record
//! first; a current revocation wins over a coexisting valid record.

use std::sync::Arc;

use async_trait::async_trait;
use evp_chain::{AccreditationRegistry, ChainClient};
use evp_core::{ChainAddress, ClaimHash, Clock};
use serde::Serialize;

use crate::claim::Claim;
use crate::descriptor::{AccreditationStatus, ProofDescriptor, ProofKind};
use crate::engine::{Contracts, GeneratedProof, ProofEngine, ProofOptions};
use crate::error::ProofError;

const KIND: ProofKind = ProofKind::EthereumAttestationRegistryIntermediateStatus2021;

#[derive(Serialize)]
struct StatusRecord<'a> {
    hash: &'a ClaimHash,
    status: AccreditationStatus,
}

/// Hash of the `{hash, status}` record for a claim hash.
pub fn status_record_hash(claim_hash: &ClaimHash, status: AccreditationStatus) -> Result<ClaimHash, ProofError> {
    Ok(AccreditationRegistry::canonical_hash(&StatusRecord {
        hash: claim_hash,
        status,
    })?)
}

/// Engine for [`ProofKind::EthereumAttestationRegistryIntermediateStatus2021`].
#[derive(Debug, Clone)]
pub struct IntermediateStatusProof {
    contracts: Contracts,
}

impl IntermediateStatusProof {
    /// Bind to the contracts in `options`.
    pub fn new(client: Arc<ChainClient>, options: ProofOptions) -> Self {
        Self {
            contracts: Contracts::new(client, options),
        }
    }

    /// Judge expiry by `clock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.contracts = self.contracts.with_clock(clock);
        self
    }

    /// The claim must carry a single proof of this kind and name an attester.
    fn check(&self, claim: &Claim) -> Result<(), ProofError> {
        match claim.proof_type() {
            Some(tag) if tag == KIND.tag() => {}
            other => {
                return Err(ProofError::UnsupportedProofType {
                    found: other.unwrap_or("none").to_string(),
                })
            }
        }
        claim.attester()?;
        Ok(())
    }

    /// Registry recorded in the claim's proof, else the configured one.
    fn revocation_registry(&self, claim: &Claim) -> ChainAddress {
        claim
            .proof()
            .and_then(|p| p.get("contractAddress"))
            .and_then(|a| a.as_str())
            .and_then(|a| ChainAddress::parse(a).ok())
            .unwrap_or_else(|| self.contracts.registry.address())
    }
}

#[async_trait]
impl ProofEngine for IntermediateStatusProof {
    fn kind(&self) -> ProofKind {
        KIND
    }

    async fn generate_proof(
        &self,
        claim: &Claim,
        valid_days: Option<u64>,
    ) -> Result<GeneratedProof, ProofError> {
        let identity = self.contracts.resolve_attester(claim)?;
        let network_id = self.contracts.client.network_id().await?;
        let registry = &self.contracts.registry;

        let descriptor = ProofDescriptor::new(registry.address(), network_id, KIND);
        let annotated = claim.with_proof(&descriptor)?;
        let claim_hash = AccreditationRegistry::canonical_hash(&annotated)?;
        let record_hash = status_record_hash(&claim_hash, AccreditationStatus::Valid)?;
        let valid_days = valid_days.unwrap_or(self.contracts.valid_days);

        tracing::info!(kind = %KIND, %claim_hash, %record_hash, attester = %identity.did, valid_days, "accrediting claim status");
        let receipt = self
            .contracts
            .proxy
            .relay(identity.address, registry.accredit(&record_hash, valid_days))
            .await?;
        Contracts::ensure_accredited(&receipt)?;

        Ok(GeneratedProof::Annotated(annotated))
    }

    async fn verify_proof(&self, claim: &Claim) -> Result<bool, ProofError> {
        self.check(claim)?;
        let attester = claim.attester()?;
        let claim_hash = AccreditationRegistry::canonical_hash(claim)?;
        let registry = &self.contracts.registry;

        let revoked = status_record_hash(&claim_hash, AccreditationStatus::Revoked)?;
        if registry.verify_hash(&revoked, attester).await?.valid {
            tracing::debug!(%claim_hash, attester, "claim revoked");
            return Ok(false);
        }

        let valid = status_record_hash(&claim_hash, AccreditationStatus::Valid)?;
        Ok(registry.verify_hash(&valid, attester).await?.valid)
    }

    async fn revoke_proof(&self, claim: &Claim) -> Result<bool, ProofError> {
        self.check(claim)?;
        let identity = self.contracts.resolve_attester(claim)?;
        let claim_hash = AccreditationRegistry::canonical_hash(claim)?;
        let revoked = status_record_hash(&claim_hash, AccreditationStatus::Revoked)?;

        let registry = self.contracts.registry.at(self.revocation_registry(claim));
        tracing::info!(%claim_hash, registry = %registry.address(), attester = %identity.did, "revoking claim");
        let receipt = self
            .contracts
            .proxy
            .relay(identity.address, registry.accredit(&revoked, 0))
            .await?;
        Ok(receipt.status)
    }
}
