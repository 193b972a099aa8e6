//! Identity-manager proxy: capability checks and relayed calls.

use std::sync::Arc;

use evp_core::ChainAddress;

use crate::abi::{self, ParamType, Token};
use crate::client::ChainClient;
use crate::error::ChainError;
use crate::registry::ContractCall;
use crate::transaction::Receipt;

/// Capability a device needs to relay calls through an identity.
pub const FORWARD_CAPABILITY: &str = "fw";

/// `hasCap(address identity, address device, string capability) -> bool`
pub const HAS_CAP: &str = "hasCap(address,address,string)";
/// `forwardTo(address identity, address destination, uint256 value, bytes data)`
pub const FORWARD_TO: &str = "forwardTo(address,address,uint256,bytes)";

/// Handle on a deployed identity-manager contract.
#[derive(Debug, Clone)]
pub struct IdentityProxy {
    address: ChainAddress,
    client: Arc<ChainClient>,
}

impl IdentityProxy {
    /// Bind to the identity manager at `address`.
    pub fn new(address: ChainAddress, client: Arc<ChainClient>) -> Self {
        Self { address, client }
    }

    /// The identity-manager contract address.
    pub fn address(&self) -> ChainAddress {
        self.address
    }

    /// Whether `device` holds `capability` on `identity`.
    pub async fn has_capability(
        &self,
        identity: ChainAddress,
        device: ChainAddress,
        capability: &str,
    ) -> Result<bool, ChainError> {
        let data = abi::encode_call(
            HAS_CAP,
            &[
                Token::Address(identity),
                Token::Address(device),
                Token::String(capability.to_string()),
            ],
        );
        let output = self.client.call(self.address, data).await?;
        match abi::decode(&[ParamType::Bool], &output)?.as_slice() {
            [Token::Bool(granted)] => Ok(*granted),
            other => Err(ChainError::Encoding(format!("hasCap returned {other:?}"))),
        }
    }

    /// Relay `data` to `destination` as `identity`.
    ///
    /// Fails with [`ChainError::MissingCapability`] unless this client's
    /// account holds the forward capability on `identity`.
    pub async fn forward(
        &self,
        identity: ChainAddress,
        destination: ChainAddress,
        data: Vec<u8>,
        value: u128,
    ) -> Result<Receipt, ChainError> {
        let device = self.client.address();
        if !self
            .has_capability(identity, device, FORWARD_CAPABILITY)
            .await?
        {
            return Err(ChainError::MissingCapability {
                capability: FORWARD_CAPABILITY.to_string(),
                identity,
                device,
            });
        }

        tracing::debug!(%identity, %destination, value = %value, "forwarding call through identity");
        let calldata = abi::encode_call(
            FORWARD_TO,
            &[
                Token::Address(identity),
                Token::Address(destination),
                Token::Uint(value),
                Token::Bytes(data),
            ],
        );
        self.client.send_transaction(self.address, calldata, value).await
    }

    /// Relay an unsigned registry call as `identity`.
    pub async fn relay(&self, identity: ChainAddress, call: ContractCall) -> Result<Receipt, ChainError> {
        self.forward(identity, call.to, call.data, 0).await
    }
}
