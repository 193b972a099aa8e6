//! A registry of proof engines keyed by kind.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::claim::Claim;
use crate::descriptor::ProofKind;
use crate::engine::ProofEngine;
use crate::error::ProofError;
use crate::selector::ProofTypeSelector;

/// Proof engines available for verification, one per kind.
#[derive(Default, Clone)]
pub struct VerifierSet {
    engines: BTreeMap<ProofKind, Arc<dyn ProofEngine>>,
}

impl std::fmt::Debug for VerifierSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifierSet")
            .field("kinds", &self.kinds())
            .finish()
    }
}

impl VerifierSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `engine` under its kind.
    ///
    /// An engine already registered for the kind is kept unless `overwrite`
    /// is set. Returns whether `engine` was registered.
    pub fn add(&mut self, engine: Arc<dyn ProofEngine>, overwrite: bool) -> bool {
        let kind = engine.kind();
        if !overwrite && self.engines.contains_key(&kind) {
            tracing::warn!(%kind, "verifier already registered; pass overwrite to replace it");
            return false;
        }
        self.engines.insert(kind, engine);
        true
    }

    /// Remove the engine for `kind`.
    pub fn remove(&mut self, kind: ProofKind) -> Option<Arc<dyn ProofEngine>> {
        self.engines.remove(&kind)
    }

    /// The engine for `kind`.
    pub fn get(&self, kind: ProofKind) -> Option<&Arc<dyn ProofEngine>> {
        self.engines.get(&kind)
    }

    /// Registered kinds, in [`ProofKind`] order.
    pub fn kinds(&self) -> Vec<ProofKind> {
        self.engines.keys().copied().collect()
    }

    /// Verify `claim` with the engine matching its proof.
    ///
    /// # Errors
    ///
    /// [`ProofError::UnsupportedProofType`] if the claim has no proof of a
    /// known kind or no engine is registered for it; otherwise whatever the
    /// engine returns.
    pub async fn verify(&self, claim: &Claim) -> Result<bool, ProofError> {
        let selected = ProofTypeSelector::select(claim.proof())?;
        let engine = self
            .engines
            .get(&selected.kind)
            .ok_or_else(|| ProofError::UnsupportedProofType {
                found: selected.kind.tag().to_string(),
            })?;
        engine.verify_proof(claim).await
    }
}
