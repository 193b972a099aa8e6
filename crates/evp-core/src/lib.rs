#![deny(missing_docs)]

//! # evp-core -- Foundational Types for the EVP Attestation Stack
//!
//! This crate defines the types every other crate in the workspace depends
//! on. It performs no network I/O. External dependencies are limited to
//! `serde`, `serde_json`, `thiserror`, `chrono`, `sha3`, `bs58`, and `hex`.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** A [`Did`] is not a
//!    [`ChainAddress`], and a [`ChainAddress`] is not a [`NetworkId`].
//!    Each validates its format at construction.
//!
//! 2. **[`CanonicalBytes`] is the sole path to claim hashing.** Every
//!    [`ClaimHash`] accredited on chain or looked up during verification is
//!    computed from `CanonicalBytes`, so generation and verification cannot
//!    drift apart.
//!
//! 3. **One resolver for identifiers.** [`AddressResolver`] is the single
//!    place where a DID string becomes an [`Identity`].

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod mnid;
pub mod resolver;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use digest::{keccak256, ClaimHash};
pub use error::{CanonicalizationError, ResolveError, ValidationError};
pub use identity::{ChainAddress, Did, Identity, NetworkId};
pub use mnid::Mnid;
pub use resolver::{AddressResolver, DidMethod};
pub use temporal::{Clock, ManualClock, SystemClock};
