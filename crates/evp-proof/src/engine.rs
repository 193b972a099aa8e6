//! # Proof Engines
//!
//! One capability interface, [`ProofEngine`], implemented by three
//! variants with different accreditation semantics. All variants share a
//! [`ChainClient`] and resolve their contract addresses once, at
//! construction.

use std::sync::Arc;

use async_trait::async_trait;
use evp_chain::{AccreditationRegistry, ChainClient, IdentityProxy, Receipt};
use evp_core::{AddressResolver, ChainAddress, Clock, Identity};

use crate::claim::Claim;
use crate::descriptor::ProofKind;
use crate::error::ProofError;

/// Default accreditation lifetime in days.
pub const DEFAULT_VALID_DAYS: u64 = 30;

/// Contract addresses and accreditation lifetime for an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofOptions {
    /// Identity-manager contract relaying accreditation calls.
    pub identity_manager: ChainAddress,
    /// Verification registry holding the records.
    pub verification_registry: ChainAddress,
    /// Lifetime used when `generate_proof` is not given one. Zero: no expiry.
    pub valid_days: u64,
}

impl ProofOptions {
    /// Options with the default lifetime.
    pub fn new(identity_manager: ChainAddress, verification_registry: ChainAddress) -> Self {
        Self {
            identity_manager,
            verification_registry,
            valid_days: DEFAULT_VALID_DAYS,
        }
    }

    /// Parse both contract addresses.
    ///
    /// # Errors
    ///
    /// [`ProofError::Configuration`] naming the malformed address.
    pub fn parse(identity_manager: &str, verification_registry: &str) -> Result<Self, ProofError> {
        let parse = |name: &str, raw: &str| {
            ChainAddress::parse(raw)
                .map_err(|_| ProofError::Configuration(format!("invalid {name} address \"{raw}\"")))
        };
        Ok(Self::new(
            parse("identity manager", identity_manager)?,
            parse("verification registry", verification_registry)?,
        ))
    }

    /// Override the default lifetime.
    pub fn with_valid_days(mut self, valid_days: u64) -> Self {
        self.valid_days = valid_days;
        self
    }
}

/// Result of `generate_proof`.
#[derive(Debug, Clone, PartialEq)]
pub enum GeneratedProof {
    /// The claim with its proof descriptor attached.
    Annotated(Claim),
    /// The canonical JSON text of the annotated claim. This exact text was
    /// hashed and accredited.
    Serialized(String),
}

impl GeneratedProof {
    /// The annotated claim, parsing it back if serialized.
    pub fn into_claim(self) -> Result<Claim, ProofError> {
        match self {
            Self::Annotated(claim) => Ok(claim),
            Self::Serialized(text) => Claim::parse(&text),
        }
    }

    /// JSON text for output.
    pub fn to_json_string(&self) -> Result<String, ProofError> {
        match self {
            Self::Annotated(claim) => claim.to_canonical_string(),
            Self::Serialized(text) => Ok(text.clone()),
        }
    }
}

/// Generates, verifies and revokes proofs of one [`ProofKind`].
#[async_trait]
pub trait ProofEngine: Send + Sync {
    /// The kind this engine handles.
    fn kind(&self) -> ProofKind;

    /// Accredit `claim` and return it with a proof attached. `valid_days`
    /// falls back to the engine's configured lifetime.
    async fn generate_proof(
        &self,
        claim: &Claim,
        valid_days: Option<u64>,
    ) -> Result<GeneratedProof, ProofError>;

    /// Whether the claim's accreditation is present and current.
    async fn verify_proof(&self, claim: &Claim) -> Result<bool, ProofError>;

    /// Withdraw the claim's accreditation. Returns the receipt status.
    async fn revoke_proof(&self, claim: &Claim) -> Result<bool, ProofError>;
}

/// The live handles an engine works through.
#[derive(Debug, Clone)]
pub(crate) struct Contracts {
    pub(crate) client: Arc<ChainClient>,
    pub(crate) proxy: IdentityProxy,
    pub(crate) registry: AccreditationRegistry,
    pub(crate) resolver: AddressResolver,
    pub(crate) valid_days: u64,
}

impl Contracts {
    pub(crate) fn new(client: Arc<ChainClient>, options: ProofOptions) -> Self {
        Self {
            proxy: IdentityProxy::new(options.identity_manager, client.clone()),
            registry: AccreditationRegistry::new(options.verification_registry, client.clone()),
            resolver: AddressResolver::new(),
            valid_days: options.valid_days,
            client,
        }
    }

    pub(crate) fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.registry = self.registry.with_clock(clock);
        self
    }

    pub(crate) fn resolve_attester(&self, claim: &Claim) -> Result<Identity, ProofError> {
        Ok(self.resolver.resolve(claim.attester()?)?)
    }

    /// Fail with [`ProofError::AccreditationFailed`] on a reverted receipt.
    pub(crate) fn ensure_accredited(receipt: &Receipt) -> Result<(), ProofError> {
        if receipt.status {
            Ok(())
        } else {
            Err(ProofError::AccreditationFailed {
                tx_hash: receipt.transaction_hash.to_hex(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_parse_addresses_eagerly() {
        let options = ProofOptions::parse(
            "0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb",
            "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
        )
        .unwrap();
        assert_eq!(options.valid_days, 30);
        assert_eq!(options.verification_registry, ChainAddress::from_bytes([0xaa; 20]));

        let err = ProofOptions::parse("0xbb", "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa").unwrap_err();
        assert!(matches!(err, ProofError::Configuration(ref m) if m.contains("identity manager")));
    }

    #[test]
    fn generated_proof_text_parses_back() {
        let claim = Claim::from_value(serde_json::json!({"issuer": "did:ev:a"})).unwrap();
        let text = claim.to_canonical_string().unwrap();
        let generated = GeneratedProof::Serialized(text.clone());
        assert_eq!(generated.to_json_string().unwrap(), text);
        assert_eq!(generated.into_claim().unwrap(), claim);
    }
}
