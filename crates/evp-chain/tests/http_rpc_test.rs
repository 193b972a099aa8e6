//! Contract tests for HttpRpc against a JSON-RPC 2.0 node.
//!
//! ## Methods Tested
//!
//! | Method | Test |
//! |--------|------|
//! | `eth_getBalance` | `balance_*` |
//! | `eth_getTransactionCount` | `transaction_count_*` |
//! | `eth_estimateGas` | `estimate_gas_*` |
//! | `net_version` | `net_version_*` |
//! | `eth_sendRawTransaction` | `send_raw_*` |
//! | `eth_getTransactionReceipt` | `receipt_*` |
//! | `eth_call` | `call_*` |

use evp_chain::transaction::CallRequest;
use evp_chain::{ChainConfig, ChainError, EthRpc, HttpRpc, TxHash};
use evp_core::ChainAddress;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn rpc(mock_server: &MockServer) -> HttpRpc {
    let config = ChainConfig::new(mock_server.uri().parse().unwrap())
        .with_header("Authorization", "Bearer test-token");
    HttpRpc::new(&config).unwrap()
}

fn ok(result: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn address() -> ChainAddress {
    ChainAddress::parse("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf").unwrap()
}

// ── eth_getBalance ───────────────────────────────────────────────────

#[tokio::test]
async fn balance_sends_headers_and_parses_quantity() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "jsonrpc": "2.0",
            "method": "eth_getBalance",
            "params": ["0x7e5f4552091a69125d5dfcb7b8c2659029395bdf", "latest"]
        })))
        .respond_with(ok(json!("0xde0b6b3a7640000")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let balance = rpc(&mock_server).balance(address()).await.unwrap();
    assert_eq!(balance, 1_000_000_000_000_000_000);
}

#[tokio::test]
async fn balance_surfaces_rpc_error_object() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "header not found"}
        })))
        .mount(&mock_server)
        .await;

    let err = rpc(&mock_server).balance(address()).await.unwrap_err();
    match err {
        ChainError::Rpc { method, message } => {
            assert_eq!(method, "eth_getBalance");
            assert_eq!(message, "header not found");
        }
        other => panic!("expected Rpc error, got {other:?}"),
    }
}

#[tokio::test]
async fn balance_rejects_http_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let err = rpc(&mock_server).balance(address()).await.unwrap_err();
    assert!(matches!(err, ChainError::InvalidResponse { .. }));
}

// ── eth_getTransactionCount ──────────────────────────────────────────

#[tokio::test]
async fn transaction_count_parses_nonce() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionCount"})))
        .respond_with(ok(json!("0x9")))
        .expect(1)
        .mount(&mock_server)
        .await;

    assert_eq!(rpc(&mock_server).transaction_count(address()).await.unwrap(), 9);
}

// ── eth_estimateGas ──────────────────────────────────────────────────

#[tokio::test]
async fn estimate_gas_sends_call_object() {
    let mock_server = MockServer::start().await;
    let to = ChainAddress::from_bytes([0x35; 20]);

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "eth_estimateGas",
            "params": [{"to": to.to_hex(), "data": "0xb75c7dc6", "value": "0x0"}]
        })))
        .respond_with(ok(json!("0x5208")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let call = CallRequest {
        from: Some(address()),
        to,
        data: vec![0xb7, 0x5c, 0x7d, 0xc6],
        value: 0,
    };
    assert_eq!(rpc(&mock_server).estimate_gas(&call).await.unwrap(), 21000);
}

// ── net_version ──────────────────────────────────────────────────────

#[tokio::test]
async fn net_version_parses_decimal_string() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "net_version"})))
        .respond_with(ok(json!("80001")))
        .mount(&mock_server)
        .await;

    assert_eq!(rpc(&mock_server).net_version().await.unwrap().value(), 80001);
}

// ── eth_sendRawTransaction ───────────────────────────────────────────

#[tokio::test]
async fn send_raw_hex_encodes_payload_and_returns_hash() {
    let mock_server = MockServer::start().await;
    let hash = format!("0x{}", "ab".repeat(32));

    Mock::given(method("POST"))
        .and(body_partial_json(json!({
            "method": "eth_sendRawTransaction",
            "params": ["0xf86c09"]
        })))
        .respond_with(ok(json!(hash)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let tx_hash = rpc(&mock_server).send_raw_transaction(&[0xf8, 0x6c, 0x09]).await.unwrap();
    assert_eq!(tx_hash.to_hex(), hash);
}

// ── eth_getTransactionReceipt ────────────────────────────────────────

#[tokio::test]
async fn receipt_null_means_pending() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(ok(json!(null)))
        .mount(&mock_server)
        .await;

    let hash = TxHash::from_bytes([0xab; 32]);
    assert_eq!(rpc(&mock_server).transaction_receipt(&hash).await.unwrap(), None);
}

#[tokio::test]
async fn receipt_parses_status_and_block() {
    let mock_server = MockServer::start().await;
    let hash = TxHash::from_bytes([0xab; 32]);

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_getTransactionReceipt"})))
        .respond_with(ok(json!({
            "transactionHash": hash.to_hex(),
            "blockNumber": "0x10",
            "status": "0x1",
            "gasUsed": "0x5208"
        })))
        .mount(&mock_server)
        .await;

    let receipt = rpc(&mock_server).transaction_receipt(&hash).await.unwrap().unwrap();
    assert_eq!(receipt.transaction_hash, hash);
    assert_eq!(receipt.block_number, Some(16));
    assert!(receipt.status);
}

// ── eth_call ─────────────────────────────────────────────────────────

#[tokio::test]
async fn call_decodes_return_data() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_partial_json(json!({"method": "eth_call"})))
        .respond_with(ok(json!(format!("0x{}01", "00".repeat(31)))))
        .mount(&mock_server)
        .await;

    let call = CallRequest {
        from: None,
        to: address(),
        data: vec![0x14, 0x0c, 0x5a, 0x4e],
        value: 0,
    };
    let output = rpc(&mock_server).call(&call).await.unwrap();
    assert_eq!(output.len(), 32);
    assert_eq!(output[31], 1);
}

#[tokio::test]
async fn call_rejects_missing_result() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1})))
        .mount(&mock_server)
        .await;

    let call = CallRequest {
        from: None,
        to: address(),
        data: vec![],
        value: 0,
    };
    let err = rpc(&mock_server).call(&call).await.unwrap_err();
    assert!(matches!(err, ChainError::InvalidResponse { .. }));
}
