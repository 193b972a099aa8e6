//! # In-Memory Chain
//!
//! [`MockChain`] implements [`EthRpc`] without a node. It decodes each raw
//! transaction it receives, recovers the sender, checks the nonce, and
//! executes the two contracts the stack talks to:
//!
//! - any address called with `forwardTo` acts as an identity manager,
//!   enforcing the `fw` capability and re-dispatching the inner call with
//!   the identity as sender;
//! - any address called with `verify`/`revoke`/`verifications` acts as a
//!   verification registry.
//!
//! Block timestamps come from a shared [`ManualClock`], so expiry can be
//! exercised by advancing the clock.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use evp_core::{ChainAddress, ClaimHash, Clock, ManualClock, NetworkId};
use parking_lot::Mutex;

use crate::abi::{self, ParamType, Token};
use crate::account::recover_sender;
use crate::config::ChainConfig;
use crate::error::ChainError;
use crate::identity_proxy::{FORWARD_CAPABILITY, FORWARD_TO, HAS_CAP};
use crate::registry::{AccreditationRecord, REVOKE, VERIFICATIONS, VERIFY};
use crate::rpc::EthRpc;
use crate::transaction::{CallRequest, LegacyTransaction, Receipt, TxHash};

const DEFAULT_GAS_ESTIMATE: u64 = 60_000;
const SECONDS_PER_DAY: u64 = 86_400;

type RecordKey = (ChainAddress, [u8; 32], ChainAddress);

#[derive(Debug)]
struct State {
    network: NetworkId,
    balances: HashMap<ChainAddress, u128>,
    nonces: HashMap<ChainAddress, u64>,
    capabilities: HashSet<(ChainAddress, ChainAddress, String)>,
    records: HashMap<RecordKey, AccreditationRecord>,
    receipts: HashMap<TxHash, Receipt>,
    gas_estimate: u64,
    gas_estimation_error: Option<String>,
    mining: bool,
    reverting: bool,
    block: u64,
}

/// An in-memory node simulating the registry and identity-manager contracts.
#[derive(Debug)]
pub struct MockChain {
    state: Mutex<State>,
    clock: Arc<ManualClock>,
    receipt_polls: AtomicU32,
    broadcasts: AtomicU32,
}

impl MockChain {
    /// A chain on `network` with its clock at the current time.
    pub fn new(network: NetworkId) -> Self {
        Self {
            state: Mutex::new(State {
                network,
                balances: HashMap::new(),
                nonces: HashMap::new(),
                capabilities: HashSet::new(),
                records: HashMap::new(),
                receipts: HashMap::new(),
                gas_estimate: DEFAULT_GAS_ESTIMATE,
                gas_estimation_error: None,
                mining: true,
                reverting: false,
                block: 1,
            }),
            clock: Arc::new(ManualClock::new(Utc::now())),
            receipt_polls: AtomicU32::new(0),
            broadcasts: AtomicU32::new(0),
        }
    }

    /// A client configuration suited to this chain: millisecond polling.
    pub fn config() -> Result<ChainConfig, ChainError> {
        let url = url::Url::parse("http://127.0.0.1:8545")
            .map_err(|e| crate::config::ConfigError::InvalidUrl("mock".to_string(), e.to_string()))?;
        Ok(ChainConfig::new(url).with_receipt_polling(Duration::from_millis(1), 30))
    }

    /// The block-timestamp clock. Share it with the registry under test.
    pub fn clock(&self) -> Arc<ManualClock> {
        Arc::clone(&self.clock)
    }

    /// Credit `address` with `wei`.
    pub fn fund(&self, address: ChainAddress, wei: u128) {
        self.state.lock().balances.insert(address, wei);
    }

    /// Grant `device` a capability on `identity`.
    pub fn grant_capability(&self, identity: ChainAddress, device: ChainAddress, capability: &str) {
        self.state
            .lock()
            .capabilities
            .insert((identity, device, capability.to_string()));
    }

    /// Set the gas the node reports for every estimate.
    pub fn set_gas_estimate(&self, gas: u64) {
        self.state.lock().gas_estimate = gas;
    }

    /// Make every gas estimate fail with `message`.
    pub fn fail_gas_estimation(&self, message: &str) {
        self.state.lock().gas_estimation_error = Some(message.to_string());
    }

    /// Stop (or resume) mining: broadcast transactions never get receipts.
    pub fn set_mining(&self, mining: bool) {
        self.state.lock().mining = mining;
    }

    /// Make every mined transaction revert (`status == 0x0`).
    pub fn set_reverting(&self, reverting: bool) {
        self.state.lock().reverting = reverting;
    }

    /// Read a registry record directly.
    pub fn record(&self, registry: ChainAddress, hash: &ClaimHash, attester: ChainAddress) -> AccreditationRecord {
        self.state
            .lock()
            .records
            .get(&(registry, *hash.as_bytes(), attester))
            .copied()
            .unwrap_or_default()
    }

    /// Write a registry record directly.
    pub fn set_record(
        &self,
        registry: ChainAddress,
        hash: &ClaimHash,
        attester: ChainAddress,
        record: AccreditationRecord,
    ) {
        self.state
            .lock()
            .records
            .insert((registry, *hash.as_bytes(), attester), record);
    }

    /// Number of `eth_getTransactionReceipt` calls served.
    pub fn receipt_polls(&self) -> u32 {
        self.receipt_polls.load(Ordering::SeqCst)
    }

    /// Number of transactions accepted by `eth_sendRawTransaction`.
    pub fn broadcasts(&self) -> u32 {
        self.broadcasts.load(Ordering::SeqCst)
    }

    fn now_secs(&self) -> u64 {
        u64::try_from(self.clock.now().timestamp()).unwrap_or(0)
    }
}

fn reverted(reason: &str) -> ChainError {
    ChainError::Rpc {
        method: "eth_call".to_string(),
        message: format!("execution reverted: {reason}"),
    }
}

impl State {
    /// Execute `data` against `to` as `sender`. Returns whether it succeeded.
    fn execute(&mut self, now: u64, sender: ChainAddress, to: ChainAddress, data: &[u8]) -> bool {
        let Ok((selector, args)) = abi::split_selector(data) else {
            return false;
        };

        if selector == abi::selector(FORWARD_TO) {
            let decoded = abi::decode(
                &[ParamType::Address, ParamType::Address, ParamType::Uint, ParamType::Bytes],
                args,
            );
            return match decoded.as_deref() {
                Ok([Token::Address(identity), Token::Address(destination), Token::Uint(_), Token::Bytes(inner)]) => {
                    let allowed = self
                        .capabilities
                        .contains(&(*identity, sender, FORWARD_CAPABILITY.to_string()));
                    allowed && self.execute(now, *identity, *destination, inner)
                }
                _ => false,
            };
        }

        if selector == abi::selector(VERIFY) {
            return match abi::decode(&[ParamType::FixedBytes32, ParamType::Uint], args).as_deref() {
                Ok([Token::FixedBytes32(hash), Token::Uint(days)]) => {
                    let expires_at = match u64::try_from(*days) {
                        Ok(0) => 0,
                        Ok(days) => now.saturating_add(days.saturating_mul(SECONDS_PER_DAY)),
                        Err(_) => return false,
                    };
                    self.records.insert(
                        (to, *hash, sender),
                        AccreditationRecord {
                            issued_at: now,
                            expires_at,
                        },
                    );
                    true
                }
                _ => false,
            };
        }

        if selector == abi::selector(REVOKE) {
            return match abi::decode(&[ParamType::FixedBytes32], args).as_deref() {
                Ok([Token::FixedBytes32(hash)]) => self.records.remove(&(to, *hash, sender)).is_some(),
                _ => false,
            };
        }

        false
    }

    fn read(&self, to: ChainAddress, data: &[u8]) -> Result<Vec<u8>, ChainError> {
        let (selector, args) = abi::split_selector(data)?;

        if selector == abi::selector(HAS_CAP) {
            return match abi::decode(&[ParamType::Address, ParamType::Address, ParamType::String], args)?.as_slice() {
                [Token::Address(identity), Token::Address(device), Token::String(cap)] => {
                    let granted = self.capabilities.contains(&(*identity, *device, cap.clone()));
                    Ok(abi::encode(&[Token::Bool(granted)]))
                }
                _ => Err(reverted("hasCap arguments")),
            };
        }

        if selector == abi::selector(VERIFICATIONS) {
            return match abi::decode(&[ParamType::FixedBytes32, ParamType::Address], args)?.as_slice() {
                [Token::FixedBytes32(hash), Token::Address(attester)] => {
                    let record = self.records.get(&(to, *hash, *attester)).copied().unwrap_or_default();
                    Ok(abi::encode(&[
                        Token::Uint(u128::from(record.issued_at)),
                        Token::Uint(u128::from(record.expires_at)),
                    ]))
                }
                _ => Err(reverted("verifications arguments")),
            };
        }

        Err(reverted("unknown function"))
    }
}

#[async_trait]
impl EthRpc for MockChain {
    async fn transaction_count(&self, address: ChainAddress) -> Result<u64, ChainError> {
        Ok(self.state.lock().nonces.get(&address).copied().unwrap_or(0))
    }

    async fn balance(&self, address: ChainAddress) -> Result<u128, ChainError> {
        Ok(self.state.lock().balances.get(&address).copied().unwrap_or(0))
    }

    async fn estimate_gas(&self, _call: &CallRequest) -> Result<u64, ChainError> {
        let state = self.state.lock();
        match &state.gas_estimation_error {
            Some(message) => Err(ChainError::Rpc {
                method: "eth_estimateGas".to_string(),
                message: message.clone(),
            }),
            None => Ok(state.gas_estimate),
        }
    }

    async fn net_version(&self) -> Result<NetworkId, ChainError> {
        Ok(self.state.lock().network)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, ChainError> {
        let (tx, signature) = LegacyTransaction::decode_signed(raw)?;
        let sender = recover_sender(&tx, &signature)?;
        let now = self.now_secs();
        let hash = TxHash::of_raw(raw);

        let mut state = self.state.lock();
        let expected = state.nonces.get(&sender).copied().unwrap_or(0);
        if tx.nonce != expected {
            return Err(ChainError::Rpc {
                method: "eth_sendRawTransaction".to_string(),
                message: format!("nonce mismatch: expected {expected}, got {}", tx.nonce),
            });
        }
        let cost = u128::from(tx.gas_limit)
            .saturating_mul(tx.gas_price)
            .saturating_add(tx.value);
        let balance = state.balances.get(&sender).copied().unwrap_or(0);
        if balance < cost {
            return Err(ChainError::Rpc {
                method: "eth_sendRawTransaction".to_string(),
                message: "insufficient funds for gas * price + value".to_string(),
            });
        }
        state.balances.insert(sender, balance - cost);
        state.nonces.insert(sender, expected + 1);

        let status = !state.reverting && state.execute(now, sender, tx.to, &tx.data);
        if state.mining {
            state.block += 1;
            let receipt = Receipt {
                transaction_hash: hash,
                block_number: Some(state.block),
                status,
            };
            state.receipts.insert(hash, receipt);
        }
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        Ok(hash)
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<Receipt>, ChainError> {
        self.receipt_polls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().receipts.get(hash).cloned())
    }

    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, ChainError> {
        self.state.lock().read(call.to, &call.data)
    }
}
