//! # evp-cli -- Operator CLI for the EVP attestation stack
//!
//! ## Subcommands
//!
//! - `evp address` -- Address of the configured signing key.
//! - `evp resolve` -- Resolve a DID to its proxy identity and network.
//! - `evp hash` -- Canonical hash of a claim file.
//! - `evp generate` / `evp verify` / `evp revoke` -- Proof lifecycle.
//!
//! Chain access is configured from the environment (`EVP_NODE_URL`,
//! `EVP_PRIVATE_KEY` and the other `EVP_*` variables read by
//! [`ChainConfig::from_env`]).
//!
//! ```bash
//! evp generate --kind SmartContract credential.json > proved.json
//! evp verify proved.json
//! ```

pub mod hash;
pub mod identity;
pub mod proof;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use evp_chain::{ChainClient, ChainConfig, SigningAccount};
use evp_proof::Claim;

/// Read and parse a claim from a JSON file.
pub fn read_claim(path: &Path) -> Result<Claim> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Claim::parse(&text).with_context(|| format!("{} does not hold a claim object", path.display()))
}

/// Connect a chain client using the `EVP_*` environment.
pub fn connect() -> Result<Arc<ChainClient>> {
    let config = ChainConfig::from_env().context("chain configuration")?;
    let account = SigningAccount::from_env().context("signing key")?;
    let client = ChainClient::connect(config, account).context("failed to build chain client")?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_claim_parses_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claim.json");
        std::fs::write(&path, br#"{"issuer":"did:ev:x","credentialSubject":{}}"#).unwrap();
        let claim = read_claim(&path).unwrap();
        assert_eq!(claim.attester().unwrap(), "did:ev:x");
    }

    #[test]
    fn read_claim_rejects_non_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claim.json");
        std::fs::write(&path, b"[1, 2]").unwrap();
        let err = read_claim(&path).unwrap_err();
        assert!(format!("{err:#}").contains("does not hold a claim object"));
    }

    #[test]
    fn read_claim_reports_missing_file() {
        let err = read_claim(Path::new("/nonexistent/claim.json")).unwrap_err();
        assert!(err.to_string().starts_with("failed to read"));
    }
}
