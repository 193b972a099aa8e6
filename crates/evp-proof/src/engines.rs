//! The three proof engine variants.

mod ethereum;
mod intermediate_status;
mod smart_contract;

use std::sync::Arc;

use evp_chain::ChainClient;

pub use ethereum::EthereumRegistryProof;
pub use intermediate_status::{status_record_hash, IntermediateStatusProof};
pub use smart_contract::SmartContractProof;

use crate::descriptor::ProofKind;
use crate::engine::{ProofEngine, ProofOptions};

/// Build the engine for `kind`.
pub fn engine_for(kind: ProofKind, client: Arc<ChainClient>, options: ProofOptions) -> Arc<dyn ProofEngine> {
    match kind {
        ProofKind::EthereumAttestationRegistry2019 => Arc::new(EthereumRegistryProof::new(client, options)),
        ProofKind::EthereumAttestationRegistryIntermediateStatus2021 => {
            Arc::new(IntermediateStatusProof::new(client, options))
        }
        ProofKind::SmartContract => Arc::new(SmartContractProof::new(client, options)),
    }
}
