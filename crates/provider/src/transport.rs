//! The underlying JSON-RPC transport the adapter forwards through.
//!
//! Callers hand us either an endpoint URL or an already-constructed provider
//! object. Instead of duck-typing the object's call surface, the accepted
//! shapes form a closed capability set: [`Transport::Url`] for
//! http(s)/ws(s) endpoints (protocol plumbing delegated to alloy),
//! [`Transport::RequestStyle`] for EIP-1193 style providers, and
//! [`Transport::SendStyle`] for legacy whole-payload providers.

use crate::error::ProviderError;
use crate::rpc::{JsonRpcRequest, JsonRpcResponse};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;
use tokio::sync::OnceCell;
use url::{Host, Url};

/// An EIP-1193 style provider: takes a method and params, returns the result.
#[async_trait]
pub trait RequestTransport: Send + Sync {
    async fn request(&self, method: &str, params: Value) -> eyre::Result<Value>;
}

/// A legacy provider: takes a whole JSON-RPC payload, returns a whole
/// response.
#[async_trait]
pub trait SendTransport: Send + Sync {
    async fn send(&self, payload: JsonRpcRequest) -> eyre::Result<JsonRpcResponse>;
}

/// The closed set of transports the adapter accepts.
pub enum Transport {
    /// A JSON-RPC endpoint url; the connection is established lazily on
    /// first use, so constructing the adapter stays network-free.
    Url {
        url: Url,
        provider: OnceCell<DynProvider>,
    },
    /// An EIP-1193 style provider object.
    RequestStyle(Arc<dyn RequestTransport>),
    /// A legacy send-style provider object.
    SendStyle(Arc<dyn SendTransport>),
}

impl Transport {
    /// Validate an endpoint string. Only http, https, ws and wss are valid.
    pub fn parse(endpoint: &str) -> Result<Self, ProviderError> {
        let url = Url::parse(endpoint)
            .map_err(|_| ProviderError::InvalidTransport(endpoint.to_string()))?;

        match url.scheme() {
            "http" | "https" | "ws" | "wss" => Ok(Self::Url {
                url,
                provider: OnceCell::new(),
            }),
            _ => Err(ProviderError::InvalidTransport(endpoint.to_string())),
        }
    }

    /// Wrap an EIP-1193 style provider object.
    pub fn request_style(transport: Arc<dyn RequestTransport>) -> Self {
        Self::RequestStyle(transport)
    }

    /// Wrap a legacy send-style provider object.
    pub fn send_style(transport: Arc<dyn SendTransport>) -> Self {
        Self::SendStyle(transport)
    }

    /// Reject endpoints on the local network. Object transports carry no
    /// endpoint and pass unchecked.
    pub fn ensure_public(&self) -> Result<(), ProviderError> {
        let Self::Url { url, .. } = self else {
            return Ok(());
        };

        let local = match url.host() {
            Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
            Some(Host::Ipv4(ip)) => ip.is_loopback(),
            Some(Host::Ipv6(ip)) => ip.is_loopback(),
            None => false,
        };

        if local {
            return Err(ProviderError::LocalEndpoint(url.to_string()));
        }
        Ok(())
    }

    /// Perform one JSON-RPC call through this transport.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        match self {
            Self::Url { url, provider } => {
                let provider = provider
                    .get_or_try_init(|| async {
                        ProviderBuilder::new()
                            .connect(url.as_str())
                            .await
                            .map(|provider| provider.erased())
                            .map_err(|e| ProviderError::Transport(e.to_string()))
                    })
                    .await?;

                provider
                    .raw_request::<Value, Value>(Cow::Owned(method.to_string()), params)
                    .await
                    .map_err(|e| ProviderError::Transport(e.to_string()))
            }
            Self::RequestStyle(transport) => transport
                .request(method, params)
                .await
                .map_err(|e| ProviderError::Transport(e.to_string())),
            Self::SendStyle(transport) => {
                let response = transport
                    .send(JsonRpcRequest::new(method, params))
                    .await
                    .map_err(|e| ProviderError::Transport(e.to_string()))?;

                response.into_result().map_err(|e| ProviderError::Rpc {
                    code: e.code,
                    message: e.message,
                })
            }
        }
    }
}
