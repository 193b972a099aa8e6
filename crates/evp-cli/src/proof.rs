//! # Proof Subcommands
//!
//! `evp generate`, `evp verify` and `evp revoke`. Each reads a claim file,
//! connects with the `EVP_*` environment and delegates to an engine from
//! `evp-proof`.
//!
//! `evp verify` exits 0 when the proof is valid and 2 when it is not; any
//! error exits 1.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use evp_chain::ChainClient;
use evp_proof::{
    engine_for, Claim, ProofEngine, ProofKind, ProofOptions, ProofTypeSelector, VerifierSet,
    DEFAULT_VALID_DAYS,
};

use crate::{connect, read_claim};

/// Exit code for a proof that checks out as invalid.
pub const EXIT_INVALID: u8 = 2;

/// Contract addresses shared by the proof subcommands.
#[derive(Args, Debug, Clone)]
pub struct ContractArgs {
    /// Identity-manager contract relaying accreditation calls.
    #[arg(long, env = "EVP_IDENTITY_MANAGER")]
    pub identity_manager: String,

    /// Verification registry contract.
    #[arg(long, env = "EVP_VERIFICATION_REGISTRY")]
    pub verification_registry: String,
}

impl ContractArgs {
    fn options(&self) -> Result<ProofOptions> {
        ProofOptions::parse(&self.identity_manager, &self.verification_registry)
            .context("invalid contract address")
    }
}

/// Arguments for `evp generate`.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub contracts: ContractArgs,

    /// Proof type to generate.
    #[arg(long)]
    pub kind: ProofKind,

    /// Days the accreditation stays valid; 0 never expires.
    #[arg(long, default_value_t = DEFAULT_VALID_DAYS)]
    pub valid_days: u64,

    /// Write the proved claim here instead of stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Claim file.
    pub file: PathBuf,
}

/// Arguments for `evp verify` and `evp revoke`.
#[derive(Args, Debug)]
pub struct ClaimArgs {
    #[command(flatten)]
    pub contracts: ContractArgs,

    /// Claim file carrying a proof.
    pub file: PathBuf,
}

/// Generate a proof and write the proved claim.
pub async fn run_generate(args: &GenerateArgs) -> Result<u8> {
    let claim = read_claim(&args.file)?;
    let options = args.contracts.options()?;
    let output = generate(connect()?, options, &claim, args.kind, args.valid_days).await?;
    match &args.out {
        Some(path) => {
            std::fs::write(path, format!("{output}\n"))
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), "proved claim written");
        }
        None => println!("{output}"),
    }
    Ok(0)
}

/// Verify the proof in a claim file.
pub async fn run_verify(args: &ClaimArgs) -> Result<u8> {
    let claim = read_claim(&args.file)?;
    let options = args.contracts.options()?;
    let valid = verify(connect()?, options, &claim).await?;
    println!("{}", if valid { "valid" } else { "invalid" });
    Ok(if valid { 0 } else { EXIT_INVALID })
}

/// Revoke the proof in a claim file.
pub async fn run_revoke(args: &ClaimArgs) -> Result<u8> {
    let claim = read_claim(&args.file)?;
    let options = args.contracts.options()?;
    let status = revoke(connect()?, options, &claim).await?;
    println!("{}", if status { "revoked" } else { "revocation failed" });
    Ok(if status { 0 } else { 1 })
}

async fn generate(
    client: Arc<ChainClient>,
    options: ProofOptions,
    claim: &Claim,
    kind: ProofKind,
    valid_days: u64,
) -> Result<String> {
    let engine = engine_for(kind, client, options);
    let proved = engine
        .generate_proof(claim, Some(valid_days))
        .await
        .with_context(|| format!("{kind} proof generation failed"))?;
    Ok(proved.to_json_string()?)
}

async fn verify(client: Arc<ChainClient>, options: ProofOptions, claim: &Claim) -> Result<bool> {
    let mut verifiers = VerifierSet::new();
    for kind in ProofKind::ALL {
        verifiers.add(engine_for(kind, client.clone(), options), false);
    }
    verifiers.verify(claim).await.context("verification failed")
}

async fn revoke(client: Arc<ChainClient>, options: ProofOptions, claim: &Claim) -> Result<bool> {
    let kind = ProofTypeSelector::select(claim.proof())?.kind;
    engine_for(kind, client, options)
        .revoke_proof(claim)
        .await
        .with_context(|| format!("{kind} revocation failed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use evp_chain::identity_proxy::FORWARD_CAPABILITY;
    use evp_chain::{MockChain, SigningAccount};
    use evp_core::{ChainAddress, Mnid, NetworkId};
    use serde_json::json;

    const KEY: &str = "0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

    fn setup() -> (Arc<MockChain>, Arc<ChainClient>, Claim) {
        let chain = Arc::new(MockChain::new(NetworkId::new(80001)));
        let account = SigningAccount::from_hex(KEY).unwrap();
        let client = Arc::new(
            ChainClient::with_rpc(chain.clone(), MockChain::config().unwrap(), Some(account)).unwrap(),
        );
        let identity = ChainAddress::from_bytes([0x11; 20]);
        chain.grant_capability(identity, client.address(), FORWARD_CAPABILITY);
        let did = format!(
            "did:ev:{}",
            Mnid {
                network: NetworkId::new(80001),
                address: identity
            }
            .encode()
        );
        let claim = Claim::from_value(json!({"issuer": did, "credentialSubject": {"age": 42}})).unwrap();
        (chain, client, claim)
    }

    fn options() -> ProofOptions {
        ProofOptions::new(ChainAddress::from_bytes([0xbb; 20]), ChainAddress::from_bytes([0xaa; 20]))
    }

    #[tokio::test]
    async fn every_kind_generates_and_verifies() {
        let (_chain, client, claim) = setup();
        for kind in ProofKind::ALL {
            let text = generate(client.clone(), options(), &claim, kind, 30).await.unwrap();
            let proved = Claim::parse(&text).unwrap();
            assert_eq!(proved.proof_type(), Some(kind.tag()));
            assert!(verify(client.clone(), options(), &proved).await.unwrap(), "{kind}");
        }
    }

    #[tokio::test]
    async fn revoke_dispatches_on_proof_type() {
        let (_chain, client, claim) = setup();
        let kind = ProofKind::EthereumAttestationRegistryIntermediateStatus2021;
        let proved = Claim::parse(&generate(client.clone(), options(), &claim, kind, 0).await.unwrap()).unwrap();
        assert!(revoke(client.clone(), options(), &proved).await.unwrap());
        assert!(!verify(client.clone(), options(), &proved).await.unwrap());

        let sc = Claim::parse(
            &generate(client.clone(), options(), &claim, ProofKind::SmartContract, 0)
                .await
                .unwrap(),
        )
        .unwrap();
        let err = revoke(client, options(), &sc).await.unwrap_err();
        assert!(format!("{err:#}").contains("SmartContract revocation failed"));
    }

    #[tokio::test]
    async fn unproved_claim_cannot_be_verified() {
        let (_chain, client, claim) = setup();
        assert!(verify(client, options(), &claim).await.is_err());
    }

    #[test]
    fn contract_args_reject_bad_address() {
        let args = ContractArgs {
            identity_manager: "0x1234".to_string(),
            verification_registry: format!("0x{}", "aa".repeat(20)),
        };
        assert!(args.options().is_err());
    }
}
