//! # Identity Subcommands
//!
//! `evp address` prints the signer address; `evp resolve` prints what a DID
//! resolves to.

use anyhow::{Context, Result};
use clap::Args;
use evp_chain::SigningAccount;
use evp_core::{AddressResolver, Identity, Mnid};
use serde_json::json;

/// Arguments for `evp resolve`.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// A `did:ev:` DID, or a raw `0x` address.
    pub did: String,
}

/// Print the address of the key in `EVP_PRIVATE_KEY`.
pub fn run_address() -> Result<u8> {
    let account = SigningAccount::from_env()
        .context("signing key")?
        .context("EVP_PRIVATE_KEY is not set")?;
    println!("{}", account.address());
    Ok(0)
}

/// Resolve a DID and print the identity as JSON.
pub fn run_resolve(args: &ResolveArgs) -> Result<u8> {
    let identity = AddressResolver::new()
        .resolve(&args.did)
        .with_context(|| format!("cannot resolve {}", args.did))?;
    println!("{}", serde_json::to_string_pretty(&describe(&identity))?);
    Ok(0)
}

/// JSON view of an identity. `canonicalDid` re-encodes the address and
/// network, and is null for a raw address.
fn describe(identity: &Identity) -> serde_json::Value {
    let canonical = identity.network.map(|network| {
        let mnid = Mnid {
            network,
            address: identity.address,
        };
        format!("did:ev:{}", mnid.encode())
    });
    json!({
        "did": identity.did,
        "address": identity.address,
        "network": identity.network,
        "canonicalDid": canonical,
    })
}
