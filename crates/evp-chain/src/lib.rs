//! # evp-chain -- Chain client for the EVP attestation stack
//!
//! Everything that talks to the chain node:
//! - **ChainClient** signs transactions locally, checks gas cost against the
//!   balance, broadcasts, and polls for a mined receipt.
//! - **IdentityProxy** checks the `fw` capability on an identity-manager
//!   contract and relays calls through it.
//! - **AccreditationRegistry** hashes claims and reads, writes and revokes
//!   records on the verification registry contract.
//!
//! ## Architecture
//!
//! The node is reached through the [`EthRpc`] trait. [`HttpRpc`] is the
//! JSON-RPC transport; [`MockChain`] is an in-memory node that executes the
//! two contracts, used by tests across the workspace.
//!
//! The signing key lives only inside [`SigningAccount`]. It is never sent
//! to the node and never logged.

pub mod abi;
pub mod account;
pub mod client;
pub mod config;
pub mod error;
pub mod identity_proxy;
pub mod mock;
pub mod registry;
pub mod rlp;
pub mod rpc;
pub mod transaction;

pub use account::SigningAccount;
pub use client::ChainClient;
pub use config::{ChainConfig, ConfigError};
pub use error::ChainError;
pub use identity_proxy::IdentityProxy;
pub use mock::MockChain;
pub use registry::{Accreditation, AccreditationRecord, AccreditationRegistry, ContractCall};
pub use rpc::{EthRpc, HttpRpc};
pub use transaction::{Receipt, TxHash};
