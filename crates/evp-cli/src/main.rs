//! # evp CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use evp_cli::hash::{run_hash, HashArgs};
use evp_cli::identity::{run_address, run_resolve, ResolveArgs};
use evp_cli::proof::{run_generate, run_revoke, run_verify, ClaimArgs, GenerateArgs};

/// EVP attestation CLI.
///
/// Generates, verifies and revokes on-chain accreditation proofs for
/// credentials and presentations.
#[derive(Parser, Debug)]
#[command(name = "evp", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the address of the configured signing key.
    Address,

    /// Resolve a DID to its proxy identity address and network.
    Resolve(ResolveArgs),

    /// Print the canonical hash of a claim file.
    Hash(HashArgs),

    /// Accredit a claim on chain and print it with its proof attached.
    Generate(GenerateArgs),

    /// Check the proof of a claim against the verification registry.
    Verify(ClaimArgs),

    /// Revoke the proof of a claim.
    Revoke(ClaimArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Address => run_address(),
        Commands::Resolve(args) => run_resolve(args),
        Commands::Hash(args) => run_hash(args),
        Commands::Generate(args) => run_generate(args).await,
        Commands::Verify(args) => run_verify(args).await,
        Commands::Revoke(args) => run_revoke(args).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}
