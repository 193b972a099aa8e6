//! # Transactions and Receipts
//!
//! Legacy (type 0) transactions, signed locally and broadcast raw. With a
//! chain id the signing payload carries `chainId, 0, 0` and `v` encodes the
//! chain (EIP-155); without one, `v = 27 + recovery id`.

use evp_core::{keccak256, ChainAddress};
use serde_json::Value;

use crate::error::ChainError;
use crate::rlp::RlpItem;

/// A 32-byte transaction hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash([u8; 32]);

impl TxHash {
    /// Wrap raw hash bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The hash of a raw signed transaction.
    pub fn of_raw(raw: &[u8]) -> Self {
        Self(keccak256(raw))
    }

    /// Parse `0x` + 64 hex characters.
    pub fn parse(s: &str) -> Result<Self, ChainError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits)
            .map_err(|e| ChainError::Encoding(format!("transaction hash \"{s}\": {e}")))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ChainError::Encoding(format!("transaction hash \"{s}\": expected 32 bytes")))?;
        Ok(Self(arr))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Display for TxHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A mined (or pending) transaction receipt as reported by the node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Hash of the transaction this receipt belongs to.
    pub transaction_hash: TxHash,
    /// Block the transaction was included in; `None` while pending.
    pub block_number: Option<u64>,
    /// Execution succeeded (`status == 0x1`).
    pub status: bool,
}

impl Receipt {
    /// Parse an `eth_getTransactionReceipt` result object.
    pub fn from_json(value: &Value) -> Result<Self, String> {
        let hash = value
            .get("transactionHash")
            .and_then(Value::as_str)
            .ok_or("receipt missing transactionHash")?;
        let transaction_hash = TxHash::parse(hash).map_err(|e| e.to_string())?;

        let block_number = match value.get("blockNumber") {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                v.as_str()
                    .and_then(|s| u64::from_str_radix(s.trim_start_matches("0x"), 16).ok())
                    .ok_or("receipt blockNumber is not a hex quantity")?,
            ),
        };

        // Pre-Byzantium receipts carry no status; treated as failure.
        let status = value
            .get("status")
            .and_then(Value::as_str)
            .and_then(|s| u8::from_str_radix(s.trim_start_matches("0x"), 16).ok())
            .map(|s| s == 1)
            .unwrap_or(false);

        Ok(Self {
            transaction_hash,
            block_number,
            status,
        })
    }

    /// JSON-RPC representation, as a node would return it.
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "transactionHash": self.transaction_hash.to_hex(),
            "blockNumber": self.block_number.map(|n| format!("0x{n:x}")),
            "status": if self.status { "0x1" } else { "0x0" },
        })
    }
}

/// Parameters for `eth_call` and `eth_estimateGas`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Sender, if the call depends on `msg.sender`.
    pub from: Option<ChainAddress>,
    /// Target contract.
    pub to: ChainAddress,
    /// Calldata.
    pub data: Vec<u8>,
    /// Wei attached to the call.
    pub value: u128,
}

impl CallRequest {
    /// JSON-RPC transaction object with hex quantities.
    pub fn to_json(&self) -> Value {
        let mut obj = serde_json::json!({
            "to": self.to.to_hex(),
            "data": format!("0x{}", hex::encode(&self.data)),
            "value": format!("0x{:x}", self.value),
        });
        if let Some(from) = self.from {
            obj["from"] = Value::String(from.to_hex());
        }
        obj
    }
}

/// ECDSA signature components as carried in a legacy transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxSignature {
    /// Recovery value, chain-adjusted under EIP-155.
    pub v: u64,
    /// Signature `r`.
    pub r: [u8; 32],
    /// Signature `s`.
    pub s: [u8; 32],
}

impl TxSignature {
    /// Build `v` from a recovery id and optional chain id.
    pub fn v_for(recovery_id: u8, chain_id: Option<u64>) -> u64 {
        match chain_id {
            Some(id) => u64::from(recovery_id) + 35 + 2 * id,
            None => 27 + u64::from(recovery_id),
        }
    }

    /// Split `v` back into (recovery id, chain id).
    pub fn recovery(&self) -> Result<(u8, Option<u64>), ChainError> {
        match self.v {
            27 | 28 => Ok(((self.v - 27) as u8, None)),
            v if v >= 35 => Ok((((v - 35) % 2) as u8, Some((v - 35) / 2))),
            v => Err(ChainError::Encoding(format!("invalid signature v value {v}"))),
        }
    }
}

/// An unsigned legacy transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    /// Sender account nonce.
    pub nonce: u64,
    /// Gas price in wei.
    pub gas_price: u128,
    /// Gas limit.
    pub gas_limit: u64,
    /// Recipient contract.
    pub to: ChainAddress,
    /// Wei transferred.
    pub value: u128,
    /// Calldata.
    pub data: Vec<u8>,
    /// EIP-155 chain id.
    pub chain_id: Option<u64>,
}

impl LegacyTransaction {
    fn base_fields(&self) -> Vec<RlpItem> {
        vec![
            RlpItem::uint(u128::from(self.nonce)),
            RlpItem::uint(self.gas_price),
            RlpItem::uint(u128::from(self.gas_limit)),
            RlpItem::Bytes(self.to.as_bytes().to_vec()),
            RlpItem::uint(self.value),
            RlpItem::Bytes(self.data.clone()),
        ]
    }

    /// The Keccak-256 hash that gets signed.
    pub fn signing_hash(&self) -> [u8; 32] {
        let mut fields = self.base_fields();
        if let Some(chain_id) = self.chain_id {
            fields.push(RlpItem::uint(u128::from(chain_id)));
            fields.push(RlpItem::uint(0));
            fields.push(RlpItem::uint(0));
        }
        keccak256(&RlpItem::List(fields).encode())
    }

    /// RLP of the signed transaction, ready for `eth_sendRawTransaction`.
    pub fn encode_signed(&self, signature: &TxSignature) -> Vec<u8> {
        let mut fields = self.base_fields();
        fields.push(RlpItem::uint(u128::from(signature.v)));
        fields.push(RlpItem::trimmed(&signature.r));
        fields.push(RlpItem::trimmed(&signature.s));
        RlpItem::List(fields).encode()
    }

    /// Decode a raw signed transaction. Contract creation (empty `to`) is
    /// rejected.
    pub fn decode_signed(raw: &[u8]) -> Result<(Self, TxSignature), ChainError> {
        let item = RlpItem::decode(raw)?;
        let fields = item
            .as_list()
            .filter(|f| f.len() == 9)
            .ok_or_else(|| ChainError::Encoding("transaction is not a 9-item list".into()))?;

        let uint = |i: usize| {
            fields[i]
                .as_uint()
                .ok_or_else(|| ChainError::Encoding(format!("transaction field {i} is not an integer")))
        };
        let bytes = |i: usize| {
            fields[i]
                .as_bytes()
                .ok_or_else(|| ChainError::Encoding(format!("transaction field {i} is not a byte string")))
        };
        let word = |i: usize| -> Result<[u8; 32], ChainError> {
            let b = bytes(i)?;
            if b.len() > 32 {
                return Err(ChainError::Encoding(format!("transaction field {i} exceeds 32 bytes")));
            }
            let mut out = [0u8; 32];
            out[32 - b.len()..].copy_from_slice(b);
            Ok(out)
        };
        let narrow = |i: usize| -> Result<u64, ChainError> {
            u64::try_from(uint(i)?)
                .map_err(|_| ChainError::Encoding(format!("transaction field {i} exceeds 64 bits")))
        };

        let to: [u8; 20] = bytes(3)?
            .try_into()
            .map_err(|_| ChainError::Encoding("transaction recipient is not 20 bytes".into()))?;
        let signature = TxSignature {
            v: narrow(6)?,
            r: word(7)?,
            s: word(8)?,
        };
        let (_, chain_id) = signature.recovery()?;

        let tx = Self {
            nonce: narrow(0)?,
            gas_price: uint(1)?,
            gas_limit: narrow(2)?,
            to: ChainAddress::from_bytes(to),
            value: uint(4)?,
            data: bytes(5)?.to_vec(),
            chain_id,
        };
        Ok((tx, signature))
    }
}
