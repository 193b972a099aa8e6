//! Attestation-registry proofs: smart-contract semantics under the
//! `EthereumAttestationRegistry2019` tag.

use std::sync::Arc;

use async_trait::async_trait;
use evp_chain::ChainClient;
use evp_core::Clock;

use super::SmartContractProof;
use crate::claim::Claim;
use crate::descriptor::ProofKind;
use crate::engine::{GeneratedProof, ProofEngine, ProofOptions};
use crate::error::ProofError;

/// Engine for [`ProofKind::EthereumAttestationRegistry2019`].
#[derive(Debug, Clone)]
pub struct EthereumRegistryProof {
    inner: SmartContractProof,
}

impl EthereumRegistryProof {
    /// Bind to the contracts in `options`.
    pub fn new(client: Arc<ChainClient>, options: ProofOptions) -> Self {
        Self {
            inner: SmartContractProof::tagged(ProofKind::EthereumAttestationRegistry2019, client, options),
        }
    }

    /// Judge expiry by `clock`.
    pub fn with_clock(self, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: self.inner.with_clock(clock),
        }
    }
}

#[async_trait]
impl ProofEngine for EthereumRegistryProof {
    fn kind(&self) -> ProofKind {
        self.inner.kind()
    }

    async fn generate_proof(
        &self,
        claim: &Claim,
        valid_days: Option<u64>,
    ) -> Result<GeneratedProof, ProofError> {
        self.inner.generate_proof(claim, valid_days).await
    }

    async fn verify_proof(&self, claim: &Claim) -> Result<bool, ProofError> {
        self.inner.verify_proof(claim).await
    }

    async fn revoke_proof(&self, claim: &Claim) -> Result<bool, ProofError> {
        self.inner.revoke_proof(claim).await
    }
}
