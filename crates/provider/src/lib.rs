//! Provider adapter that answers `eth_signTransaction` through a custody
//! service instead of a local wallet.
//!
//! The adapter sits in front of an ordinary JSON-RPC transport. Signing
//! requests are translated to the custody service's shape, submitted, and
//! polled until a human approves them; every other call is forwarded to the
//! underlying transport unmodified. Call sites built against a local wallet
//! provider keep working unchanged.

mod error;
mod nonce;
mod rpc;
mod transport;

pub use error::ProviderError;
pub use nonce::NonceTracker;
pub use rpc::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
pub use transport::{RequestTransport, SendTransport, Transport};

use alloy_primitives::{Address, Bytes};
use config::{Config, CustodyConfig};
use custody::{translate, CustodyApi, CustodyClient, CustodyError, RawTransaction, SessionPoller};
use error::BootstrapError;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// The one JSON-RPC method answered by the custody workflow.
pub const SIGN_METHOD: &str = "eth_signTransaction";

/// Provider adapter bound to one custody account.
///
/// The chain id is resolved through the underlying transport exactly once,
/// on first use; every signing and dispatch call awaits that bootstrap, and
/// a bootstrap failure is permanent for the instance.
pub struct CustodyProvider<C = CustodyClient> {
    transport: Transport,
    poller: SessionPoller<C>,
    account_key: String,
    address: Address,
    nonces: Arc<NonceTracker>,
    chain_id: OnceCell<Result<u64, BootstrapError>>,
}

impl<C> std::fmt::Debug for CustodyProvider<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustodyProvider")
            .field("account_key", &self.account_key)
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl CustodyProvider<CustodyClient> {
    /// Build an adapter over an endpoint URL.
    ///
    /// Fails synchronously, before any network use, on local-network
    /// endpoints, unsupported protocols, and incomplete configuration.
    pub fn connect(
        endpoint: &str,
        config: &Config,
        nonces: Arc<NonceTracker>,
    ) -> Result<Self, ProviderError> {
        let transport = Transport::parse(endpoint)?;
        Self::with_transport(transport, &config.custody, nonces)
    }

    /// Build an adapter over an already-constructed transport.
    pub fn with_transport(
        transport: Transport,
        custody_config: &CustodyConfig,
        nonces: Arc<NonceTracker>,
    ) -> Result<Self, ProviderError> {
        transport.ensure_public()?;
        custody_config.validate()?;

        let client = CustodyClient::new(custody_config)?;
        Ok(Self::new(transport, client, custody_config, nonces))
    }
}

impl<C: CustodyApi> CustodyProvider<C> {
    /// Build an adapter over an explicit custody client. Tests plug a
    /// scripted client in here.
    pub fn new(
        transport: Transport,
        custody: C,
        custody_config: &CustodyConfig,
        nonces: Arc<NonceTracker>,
    ) -> Self {
        Self {
            transport,
            poller: SessionPoller::new(custody),
            account_key: custody_config.account_key.clone(),
            address: custody_config.address,
            nonces,
            chain_id: OnceCell::new(),
        }
    }

    /// Override the fixed delay between session polls.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poller = self.poller.with_poll_interval(interval);
        self
    }

    /// Bound the session poll loop. Unbounded by default.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.poller = self.poller.with_max_attempts(attempts);
        self
    }

    /// The custody-bound address this adapter manages.
    pub const fn address(&self) -> Address {
        self.address
    }

    /// All managed addresses. Always exactly one.
    pub fn addresses(&self) -> Vec<Address> {
        vec![self.address]
    }

    /// Index-addressed lookup. The index is ignored: the adapter manages a
    /// single custody-bound address.
    pub const fn address_at(&self, _index: usize) -> Address {
        self.address
    }

    /// The chain id resolved from the underlying node.
    ///
    /// The first caller triggers the `eth_chainId` query; concurrent and
    /// later callers share its outcome. Failure is never retried.
    pub async fn chain_id(&self) -> Result<u64, ProviderError> {
        let outcome = self
            .chain_id
            .get_or_init(|| async {
                let chain_id = self.fetch_chain_id().await?;
                info!(chain_id, "Resolved chain id from the underlying node");
                Ok(chain_id)
            })
            .await;

        outcome.clone().map_err(ProviderError::from)
    }

    async fn fetch_chain_id(&self) -> Result<u64, BootstrapError> {
        let result = self
            .transport
            .request("eth_chainId", json!([]))
            .await
            .map_err(|e| BootstrapError::Failed(e.to_string()))?;

        result
            .as_str()
            .and_then(parse_quantity)
            .ok_or_else(|| BootstrapError::Malformed(result.to_string()))
    }

    /// Sign a transaction through the custody workflow.
    ///
    /// Blocks until a human approves or rejects the request on the custody
    /// mobile app. A failed workflow only fails this call; the adapter stays
    /// usable.
    pub async fn sign_transaction(&self, tx: RawTransaction) -> Result<Bytes, ProviderError> {
        let chain_id = self.chain_id().await?;
        let reserved = tx.nonce.is_none();
        let tx = self.fill_nonce(tx).await?;
        let request = translate(&tx, chain_id, &self.account_key).map_err(CustodyError::from)?;

        match self.poller.sign(request).await {
            Ok(signed) => Ok(signed),
            Err(err) => {
                // a nonce reserved for a transaction the custody workflow
                // never signed would leave a gap; hand it back
                if reserved && matches!(err, CustodyError::Workflow { .. }) {
                    self.nonces.release(self.address);
                }
                Err(err.into())
            }
        }
    }

    /// Dispatch one JSON-RPC call.
    ///
    /// `eth_signTransaction` is answered by the custody workflow and
    /// `eth_accounts`/`eth_requestAccounts` by the bound address; everything
    /// else is forwarded through the underlying transport unmodified.
    pub async fn send(&self, payload: JsonRpcRequest) -> Result<JsonRpcResponse, ProviderError> {
        // every call waits for the one-time bootstrap
        self.chain_id().await?;

        match payload.method.as_str() {
            SIGN_METHOD => {
                let tx = sign_params(&payload)?;
                let signed = self.sign_transaction(tx).await?;
                Ok(JsonRpcResponse::result(
                    payload.id,
                    Value::String(signed.to_string()),
                ))
            }
            "eth_accounts" | "eth_requestAccounts" => {
                Ok(JsonRpcResponse::result(payload.id, json!(self.addresses())))
            }
            _ => {
                debug!(method = %payload.method, "Forwarding call to the underlying transport");
                let result = self.transport.request(&payload.method, payload.params).await?;
                Ok(JsonRpcResponse::result(payload.id, result))
            }
        }
    }

    /// Fill a missing nonce from the network, routed through the shared
    /// nonce tracker so interleaved signing requests stay distinct.
    async fn fill_nonce(&self, mut tx: RawTransaction) -> Result<RawTransaction, ProviderError> {
        if tx.nonce.is_some() {
            return Ok(tx);
        }

        let result = self
            .transport
            .request("eth_getTransactionCount", json!([self.address, "pending"]))
            .await?;
        let network_count = result.as_str().and_then(parse_quantity).ok_or_else(|| {
            ProviderError::Transport(format!("malformed transaction count: {result}"))
        })?;

        let nonce = self.nonces.reserve(self.address, network_count);
        debug!(address = %self.address, nonce, "Reserved nonce for signing request");
        tx.nonce = Some(format!("0x{nonce:x}"));
        Ok(tx)
    }
}

/// Extract the transaction object from `eth_signTransaction` params.
fn sign_params(payload: &JsonRpcRequest) -> Result<RawTransaction, ProviderError> {
    let tx = payload
        .params
        .as_array()
        .and_then(|params| params.first())
        .cloned()
        .ok_or_else(|| {
            ProviderError::InvalidParams(
                "eth_signTransaction expects a transaction object".to_string(),
            )
        })?;

    serde_json::from_value(tx).map_err(|e| ProviderError::InvalidParams(e.to_string()))
}

/// Parse a 0x-prefixed hex quantity.
fn parse_quantity(value: &str) -> Option<u64> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u64::from_str_radix(digits, 16).ok()
}
