//! # Node Transport
//!
//! [`EthRpc`] is the seam between the chain client and the node. The
//! production implementation, [`HttpRpc`], speaks JSON-RPC 2.0 over HTTP(S);
//! tests substitute [`MockChain`](crate::mock::MockChain).

use async_trait::async_trait;
use evp_core::{ChainAddress, NetworkId};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;

use crate::config::{ChainConfig, ConfigError};
use crate::error::ChainError;
use crate::transaction::{CallRequest, Receipt, TxHash};

/// The node operations the chain client depends on.
#[async_trait]
pub trait EthRpc: Send + Sync {
    /// Nonce of the next transaction from `address` (`latest` block).
    async fn transaction_count(&self, address: ChainAddress) -> Result<u64, ChainError>;

    /// Balance of `address` in wei.
    async fn balance(&self, address: ChainAddress) -> Result<u128, ChainError>;

    /// Gas the node estimates for `call`.
    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, ChainError>;

    /// The network id (`net_version`).
    async fn net_version(&self) -> Result<NetworkId, ChainError>;

    /// Broadcast a signed transaction; returns its hash once pooled.
    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, ChainError>;

    /// The receipt for `hash`, or `None` if not yet mined.
    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<Receipt>, ChainError>;

    /// Execute a read-only call and return its raw return data.
    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, ChainError>;
}

/// JSON-RPC 2.0 transport over HTTP.
#[derive(Debug, Clone)]
pub struct HttpRpc {
    client: reqwest::Client,
    url: url::Url,
}

impl HttpRpc {
    /// Build a transport from the node URL, headers and timeout in `config`.
    pub fn new(config: &ChainConfig) -> Result<Self, ChainError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConfigError::InvalidHeader(name.clone()))?;
            let mut value = HeaderValue::from_str(value)
                .map_err(|_| ConfigError::InvalidHeader(name.as_str().to_string()))?;
            value.set_sensitive(true);
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|source| ChainError::Http {
                method: "client".to_string(),
                source,
            })?;

        Ok(Self {
            client,
            url: config.node_url.clone(),
        })
    }

    /// Send a JSON-RPC request and return the `result` field.
    async fn rpc_call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        let resp = self
            .client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|source| ChainError::Http {
                method: method.to_string(),
                source,
            })?;

        if !resp.status().is_success() {
            return Err(ChainError::InvalidResponse {
                method: method.to_string(),
                reason: format!("HTTP {}", resp.status()),
            });
        }

        let json: Value = resp.json().await.map_err(|source| ChainError::Http {
            method: method.to_string(),
            source,
        })?;

        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown RPC error");
            return Err(ChainError::Rpc {
                method: method.to_string(),
                message: message.to_string(),
            });
        }

        json.get("result")
            .cloned()
            .ok_or_else(|| ChainError::InvalidResponse {
                method: method.to_string(),
                reason: "missing 'result' field".to_string(),
            })
    }
}

/// Parse a hex quantity (`0x1a`) as returned by the node.
pub fn parse_quantity(method: &str, value: &Value) -> Result<u128, ChainError> {
    let invalid = || ChainError::InvalidResponse {
        method: method.to_string(),
        reason: format!("expected hex quantity, got {value}"),
    };
    let s = value.as_str().ok_or_else(invalid)?;
    let digits = s.strip_prefix("0x").ok_or_else(invalid)?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16).map_err(|_| invalid())
}

fn parse_data(method: &str, value: &Value) -> Result<Vec<u8>, ChainError> {
    let invalid = |reason: String| ChainError::InvalidResponse {
        method: method.to_string(),
        reason,
    };
    let s = value
        .as_str()
        .ok_or_else(|| invalid(format!("expected hex data, got {value}")))?;
    hex::decode(s.strip_prefix("0x").unwrap_or(s)).map_err(|e| invalid(e.to_string()))
}

fn narrow(method: &str, value: u128) -> Result<u64, ChainError> {
    u64::try_from(value).map_err(|_| ChainError::InvalidResponse {
        method: method.to_string(),
        reason: format!("quantity {value} exceeds 64 bits"),
    })
}

#[async_trait]
impl EthRpc for HttpRpc {
    async fn transaction_count(&self, address: ChainAddress) -> Result<u64, ChainError> {
        const METHOD: &str = "eth_getTransactionCount";
        let result = self
            .rpc_call(METHOD, serde_json::json!([address.to_hex(), "latest"]))
            .await?;
        narrow(METHOD, parse_quantity(METHOD, &result)?)
    }

    async fn balance(&self, address: ChainAddress) -> Result<u128, ChainError> {
        const METHOD: &str = "eth_getBalance";
        let result = self
            .rpc_call(METHOD, serde_json::json!([address.to_hex(), "latest"]))
            .await?;
        parse_quantity(METHOD, &result)
    }

    async fn estimate_gas(&self, call: &CallRequest) -> Result<u64, ChainError> {
        const METHOD: &str = "eth_estimateGas";
        let result = self.rpc_call(METHOD, serde_json::json!([call.to_json()])).await?;
        narrow(METHOD, parse_quantity(METHOD, &result)?)
    }

    async fn net_version(&self) -> Result<NetworkId, ChainError> {
        const METHOD: &str = "net_version";
        let result = self.rpc_call(METHOD, serde_json::json!([])).await?;
        let raw = result.as_str().ok_or_else(|| ChainError::InvalidResponse {
            method: METHOD.to_string(),
            reason: format!("expected string, got {result}"),
        })?;
        Ok(NetworkId::parse(raw)?)
    }

    async fn send_raw_transaction(&self, raw: &[u8]) -> Result<TxHash, ChainError> {
        const METHOD: &str = "eth_sendRawTransaction";
        let result = self
            .rpc_call(METHOD, serde_json::json!([format!("0x{}", hex::encode(raw))]))
            .await?;
        let hash = result.as_str().ok_or_else(|| ChainError::InvalidResponse {
            method: METHOD.to_string(),
            reason: "non-string transaction hash".to_string(),
        })?;
        TxHash::parse(hash)
    }

    async fn transaction_receipt(&self, hash: &TxHash) -> Result<Option<Receipt>, ChainError> {
        const METHOD: &str = "eth_getTransactionReceipt";
        let result = self
            .rpc_call(METHOD, serde_json::json!([hash.to_hex()]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        Receipt::from_json(&result)
            .map(Some)
            .map_err(|reason| ChainError::InvalidResponse {
                method: METHOD.to_string(),
                reason,
            })
    }

    async fn call(&self, call: &CallRequest) -> Result<Vec<u8>, ChainError> {
        const METHOD: &str = "eth_call";
        let result = self
            .rpc_call(METHOD, serde_json::json!([call.to_json(), "latest"]))
            .await?;
        parse_data(METHOD, &result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quantities() {
        assert_eq!(parse_quantity("m", &serde_json::json!("0x0")).unwrap(), 0);
        assert_eq!(parse_quantity("m", &serde_json::json!("0x")).unwrap(), 0);
        assert_eq!(parse_quantity("m", &serde_json::json!("0x5208")).unwrap(), 21000);
        assert!(parse_quantity("m", &serde_json::json!("5208")).is_err());
        assert!(parse_quantity("m", &serde_json::json!(21000)).is_err());
    }

    #[test]
    fn rejects_invalid_header_names() {
        let config = ChainConfig::new(url::Url::parse("http://127.0.0.1:8545").unwrap())
            .with_header("Bad Header", "x");
        assert!(matches!(
            HttpRpc::new(&config),
            Err(ChainError::Config(ConfigError::InvalidHeader(_)))
        ));
    }

    #[test]
    fn narrow_rejects_oversized_quantities() {
        assert!(narrow("m", u128::from(u64::MAX) + 1).is_err());
        assert_eq!(narrow("m", 7).unwrap(), 7);
    }
}
