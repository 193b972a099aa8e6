//! Generic smart-contract proofs.
//!
//! The accredited hash is taken over the canonical text of the whole claim,
//! proof descriptor included. Verification hashes the claim as presented,
//! which yields the same digest because the canonical serializer is
//! deterministic.

use std::sync::Arc;

use async_trait::async_trait;
use evp_chain::{AccreditationRegistry, ChainClient};
use evp_core::Clock;

use crate::claim::Claim;
use crate::descriptor::{ProofDescriptor, ProofKind};
use crate::engine::{Contracts, GeneratedProof, ProofEngine, ProofOptions};
use crate::error::ProofError;
use crate::selector::ProofTypeSelector;

/// Engine for [`ProofKind::SmartContract`].
#[derive(Debug, Clone)]
pub struct SmartContractProof {
    kind: ProofKind,
    contracts: Contracts,
}

impl SmartContractProof {
    /// Bind to the contracts in `options`.
    pub fn new(client: Arc<ChainClient>, options: ProofOptions) -> Self {
        Self::tagged(ProofKind::SmartContract, client, options)
    }

    pub(crate) fn tagged(kind: ProofKind, client: Arc<ChainClient>, options: ProofOptions) -> Self {
        Self {
            kind,
            contracts: Contracts::new(client, options),
        }
    }

    /// Judge expiry by `clock`.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.contracts = self.contracts.with_clock(clock);
        self
    }
}

#[async_trait]
impl ProofEngine for SmartContractProof {
    fn kind(&self) -> ProofKind {
        self.kind
    }

    async fn generate_proof(
        &self,
        claim: &Claim,
        valid_days: Option<u64>,
    ) -> Result<GeneratedProof, ProofError> {
        let identity = self.contracts.resolve_attester(claim)?;
        let network_id = self.contracts.client.network_id().await?;
        let registry = &self.contracts.registry;

        let descriptor = ProofDescriptor::new(registry.address(), network_id, self.kind);
        let serialized = claim.with_proof(&descriptor)?.to_canonical_string()?;
        let hash = AccreditationRegistry::canonical_hash(&serialized)?;
        let valid_days = valid_days.unwrap_or(self.contracts.valid_days);

        tracing::info!(kind = %self.kind, %hash, attester = %identity.did, valid_days, "accrediting claim");
        let receipt = self
            .contracts
            .proxy
            .relay(identity.address, registry.accredit(&hash, valid_days))
            .await?;
        Contracts::ensure_accredited(&receipt)?;

        Ok(GeneratedProof::Serialized(serialized))
    }

    async fn verify_proof(&self, claim: &Claim) -> Result<bool, ProofError> {
        let selected = ProofTypeSelector::select(claim.proof())?;
        if selected.kind != self.kind {
            return Err(ProofError::UnsupportedProofType {
                found: selected.kind.tag().to_string(),
            });
        }
        let attester = claim.attester()?;
        let accreditation = self.contracts.registry.verify(claim, attester).await?;
        Ok(accreditation.valid)
    }

    async fn revoke_proof(&self, _claim: &Claim) -> Result<bool, ProofError> {
        Err(ProofError::UnsupportedOperation {
            operation: "revoke_proof",
            kind: self.kind,
        })
    }
}
