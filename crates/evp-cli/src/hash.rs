//! `evp hash`: canonical claim hash of a file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use evp_core::ClaimHash;

/// Arguments for `evp hash`.
#[derive(Args, Debug)]
pub struct HashArgs {
    /// Claim file.
    pub file: PathBuf,

    /// Hash the file text verbatim instead of its canonical JSON form, as a
    /// serialized smart-contract proof is accredited.
    #[arg(long)]
    pub raw: bool,
}

/// Print the hash of the file.
pub fn run_hash(args: &HashArgs) -> Result<u8> {
    let text = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    println!("{}", hash_text(&text, args.raw)?);
    Ok(0)
}

fn hash_text(text: &str, raw: bool) -> Result<ClaimHash> {
    if raw {
        return Ok(ClaimHash::of(&text.trim_end_matches('\n'))?);
    }
    let value: serde_json::Value = serde_json::from_str(text).context("file is not JSON")?;
    Ok(ClaimHash::of(&value)?)
}
