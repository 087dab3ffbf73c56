//! End-to-end adapter tests over scripted transport and custody mocks.

use alloy_primitives::address;
use async_trait::async_trait;
use config::CustodyConfig;
use custody::{
    CustodyApi, CustodyError, SignRequest, SignSession, SignedTransaction, TransactionStatus,
    TxKey,
};
use provider::{
    CustodyProvider, JsonRpcRequest, NonceTracker, ProviderError, RequestTransport, Transport,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn custody_config() -> CustodyConfig {
    CustodyConfig {
        base_url: "https://api.custody.example".to_string(),
        api_key: "key-123".to_string(),
        rsa_private_key: "pem".to_string(),
        custody_rsa_public_key: "pem".to_string(),
        request_timeout_ms: None,
        account_key: "account-abc".to_string(),
        address: address!("5CFFA347b0aE99cc01E5c01714cA5658e54a23D1"),
    }
}

/// Request-style transport answering from a canned table, recording calls.
#[derive(Default)]
struct ScriptedTransport {
    chain_id: Option<&'static str>,
    transaction_count: Option<&'static str>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn sepolia() -> Arc<Self> {
        Arc::new(Self {
            chain_id: Some("0xaa36a7"),
            transaction_count: Some("0x7"),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RequestTransport for ScriptedTransport {
    async fn request(&self, method: &str, _params: Value) -> eyre::Result<Value> {
        self.calls.lock().unwrap().push(method.to_string());
        match method {
            "eth_chainId" => match self.chain_id {
                Some(hex) => Ok(json!(hex)),
                None => eyre::bail!("node unreachable"),
            },
            "eth_getTransactionCount" => Ok(json!(self.transaction_count.unwrap_or("0x0"))),
            "eth_blockNumber" => Ok(json!("0x100")),
            other => eyre::bail!("unexpected method {other}"),
        }
    }
}

/// Custody mock that approves after a fixed number of pending polls and
/// records every submitted request.
struct ApprovingCustody {
    pending_polls: usize,
    polls: AtomicUsize,
    submitted: Mutex<Vec<SignRequest>>,
}

impl ApprovingCustody {
    fn new(pending_polls: usize) -> Arc<Self> {
        Arc::new(Self {
            pending_polls,
            polls: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        })
    }
}

impl CustodyApi for ApprovingCustody {
    async fn create_sign_transaction(&self, request: &SignRequest) -> Result<TxKey, CustodyError> {
        self.submitted.lock().unwrap().push(request.clone());
        Ok("tx-key-1".to_string())
    }

    async fn one_sign_request(&self, tx_key: &str) -> Result<SignSession, CustodyError> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst);
        let (status, transaction) = if poll < self.pending_polls {
            (TransactionStatus::InProgress, None)
        } else {
            (
                TransactionStatus::SignCompleted,
                Some(SignedTransaction {
                    signed_transaction: "0x02f870deadbeef".to_string(),
                }),
            )
        };

        Ok(SignSession {
            tx_key: tx_key.to_string(),
            transaction_status: status,
            transaction,
        })
    }
}

fn adapter(
    transport: Arc<ScriptedTransport>,
    custody: Arc<ApprovingCustody>,
) -> CustodyProvider<Arc<ApprovingCustody>> {
    CustodyProvider::new(
        Transport::request_style(transport),
        custody,
        &custody_config(),
        NonceTracker::new(),
    )
    .with_poll_interval(Duration::from_millis(1))
}

#[tokio::test]
async fn test_sign_dispatch_answers_with_custody_signature() {
    let transport = ScriptedTransport::sepolia();
    let custody = ApprovingCustody::new(2);
    let provider = adapter(transport.clone(), custody.clone());

    let request = JsonRpcRequest::new(
        "eth_signTransaction",
        json!([{
            "to": "0x0d83dab629f0e0f9d36c0cbc89b69a489f0751bd",
            "value": "0xde0b6b3a7640000",
            "gas": "0x5208",
            "maxFeePerGas": "0x77359400",
            "maxPriorityFeePerGas": "0x3b9aca00",
            "nonce": "0x2a"
        }]),
    );
    let response = provider.send(request).await.unwrap();

    assert_eq!(response.result, Some(json!("0x02f870deadbeef")));
    assert!(response.error.is_none());

    // the submitted request carries the bootstrapped chain id and the
    // translated decimal fields
    let submitted = custody.submitted.lock().unwrap();
    let tx = &submitted[0].transaction;
    assert_eq!(submitted[0].account_key, "account-abc");
    assert_eq!(tx.chain_id, 11155111);
    assert_eq!(tx.gas_limit, 21000);
    assert_eq!(tx.nonce, 42);
    assert_eq!(tx.value, "1000000000000000000");
}

#[tokio::test]
async fn test_chain_id_fetched_once_across_calls() {
    let transport = ScriptedTransport::sepolia();
    let provider = adapter(transport.clone(), ApprovingCustody::new(0));

    assert_eq!(provider.chain_id().await.unwrap(), 11155111);
    assert_eq!(provider.chain_id().await.unwrap(), 11155111);
    provider
        .send(JsonRpcRequest::new("eth_blockNumber", json!([])))
        .await
        .unwrap();

    let chain_id_queries = transport
        .calls()
        .iter()
        .filter(|m| *m == "eth_chainId")
        .count();
    assert_eq!(chain_id_queries, 1);
}

#[tokio::test]
async fn test_malformed_chain_id_fails_bootstrap_permanently() {
    let transport = Arc::new(ScriptedTransport {
        chain_id: Some("not-a-number"),
        ..Default::default()
    });
    let provider = adapter(transport.clone(), ApprovingCustody::new(0));

    let err = provider.chain_id().await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedChainId(_)));

    // the failure is cached, not retried
    let err = provider.chain_id().await.unwrap_err();
    assert!(matches!(err, ProviderError::MalformedChainId(_)));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn test_unreachable_node_fails_initialization() {
    let transport = Arc::new(ScriptedTransport::default());
    let provider = adapter(transport, ApprovingCustody::new(0));

    let err = provider
        .send(JsonRpcRequest::new("eth_blockNumber", json!([])))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Initialization(_)));
}

#[tokio::test]
async fn test_other_methods_forwarded_unmodified() {
    let transport = ScriptedTransport::sepolia();
    let provider = adapter(transport.clone(), ApprovingCustody::new(0));

    let response = provider
        .send(JsonRpcRequest::new("eth_blockNumber", json!([])))
        .await
        .unwrap();
    assert_eq!(response.result, Some(json!("0x100")));
    assert!(transport.calls().contains(&"eth_blockNumber".to_string()));
}

#[tokio::test]
async fn test_accounts_answered_with_bound_address() {
    let transport = ScriptedTransport::sepolia();
    let provider = adapter(transport.clone(), ApprovingCustody::new(0));

    let response = provider
        .send(JsonRpcRequest::new("eth_accounts", json!([])))
        .await
        .unwrap();
    let accounts = response.result.unwrap();
    assert_eq!(accounts.as_array().unwrap().len(), 1);

    // answered locally, never forwarded
    assert!(!transport.calls().contains(&"eth_accounts".to_string()));
}

#[tokio::test]
async fn test_missing_nonce_filled_from_network() {
    let transport = ScriptedTransport::sepolia();
    let custody = ApprovingCustody::new(0);
    let provider = adapter(transport.clone(), custody.clone());

    let request = JsonRpcRequest::new(
        "eth_signTransaction",
        json!([{
            "to": "0x0d83dab629f0e0f9d36c0cbc89b69a489f0751bd",
            "gas": "0x5208",
            "gasPrice": "0x3b9aca00"
        }]),
    );
    provider.send(request).await.unwrap();

    let submitted = custody.submitted.lock().unwrap();
    let tx = &submitted[0].transaction;
    assert_eq!(tx.nonce, 7); // from the scripted eth_getTransactionCount
    assert_eq!(tx.value, "0"); // missing value defaults to zero
    assert!(transport
        .calls()
        .contains(&"eth_getTransactionCount".to_string()));
}

#[tokio::test]
async fn test_malformed_sign_params_rejected() {
    let transport = ScriptedTransport::sepolia();
    let provider = adapter(transport, ApprovingCustody::new(0));

    let err = provider
        .send(JsonRpcRequest::new("eth_signTransaction", json!([])))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::InvalidParams(_)));
}

/// Custody mock whose workflow is always rejected on the mobile app.
struct RejectingCustody {
    submitted: Mutex<Vec<SignRequest>>,
}

impl RejectingCustody {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            submitted: Mutex::new(Vec::new()),
        })
    }
}

impl CustodyApi for RejectingCustody {
    async fn create_sign_transaction(&self, request: &SignRequest) -> Result<TxKey, CustodyError> {
        self.submitted.lock().unwrap().push(request.clone());
        Ok("tx-key-2".to_string())
    }

    async fn one_sign_request(&self, tx_key: &str) -> Result<SignSession, CustodyError> {
        Ok(SignSession {
            tx_key: tx_key.to_string(),
            transaction_status: TransactionStatus::Rejected,
            transaction: None,
        })
    }
}

#[tokio::test]
async fn test_rejected_workflow_releases_reserved_nonce() {
    let transport = ScriptedTransport::sepolia();
    let custody = RejectingCustody::new();
    let provider = CustodyProvider::new(
        Transport::request_style(transport),
        Arc::clone(&custody),
        &custody_config(),
        NonceTracker::new(),
    )
    .with_poll_interval(Duration::from_millis(1));

    let sign_request = || {
        JsonRpcRequest::new(
            "eth_signTransaction",
            json!([{
                "to": "0x0d83dab629f0e0f9d36c0cbc89b69a489f0751bd",
                "gas": "0x5208",
                "gasPrice": "0x3b9aca00"
            }]),
        )
    };

    for _ in 0..2 {
        let err = provider.send(sign_request()).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::Custody(CustodyError::Workflow {
                status: TransactionStatus::Rejected
            })
        ));
    }

    // the nonce reserved for the first rejected attempt was handed back, so
    // the second attempt starts from the network count again instead of 8
    let submitted = custody.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].transaction.nonce, 7);
    assert_eq!(submitted[1].transaction.nonce, 7);
}

#[tokio::test]
async fn test_malformed_hex_field_fails_before_submission() {
    let transport = ScriptedTransport::sepolia();
    let custody = ApprovingCustody::new(0);
    let provider = adapter(transport, custody.clone());

    let request = JsonRpcRequest::new(
        "eth_signTransaction",
        json!([{
            "gas": "0xzz",
            "nonce": "0x1",
            "gasPrice": "0x3b9aca00"
        }]),
    );
    let err = provider.send(request).await.unwrap_err();

    assert!(matches!(
        err,
        ProviderError::Custody(CustodyError::Translate(_))
    ));
    assert!(custody.submitted.lock().unwrap().is_empty());
}
