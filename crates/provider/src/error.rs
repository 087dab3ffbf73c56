use config::ConfigError;
use custody::CustodyError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    /// Missing or invalid configuration, detected at construction.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The endpoint points at a local network. The custody workflow requires
    /// a publicly reachable target.
    #[error("only public network endpoints are supported, got {0}")]
    LocalEndpoint(String),

    /// The supplied transport is not a valid provider.
    #[error(
        "invalid provider: {0}; specify a valid provider or URL using the \
         http, https, ws, or wss protocol"
    )]
    InvalidTransport(String),

    /// Chain-id bootstrap failed. Fatal for this adapter instance.
    #[error("failed to initialize chain id: {0}")]
    Initialization(String),

    /// The node answered the chain-id query with a non-numeric result.
    #[error("node returned a malformed chain id: {0}")]
    MalformedChainId(String),

    /// Forwarding a call through the underlying transport failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The underlying node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Intercepted call carried parameters we could not understand.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),

    /// The custody workflow failed. Scoped to the one signing call; the
    /// adapter itself stays usable.
    #[error(transparent)]
    Custody(#[from] CustodyError),
}

/// Outcome of the one-time chain-id bootstrap, cached for the lifetime of
/// the adapter and cloned out to every later caller.
#[derive(Debug, Clone)]
pub(crate) enum BootstrapError {
    /// The query itself failed (transport or RPC-level error).
    Failed(String),
    /// The node answered, but not with a hex quantity.
    Malformed(String),
}

impl From<BootstrapError> for ProviderError {
    fn from(err: BootstrapError) -> Self {
        match err {
            BootstrapError::Failed(msg) => Self::Initialization(msg),
            BootstrapError::Malformed(msg) => Self::MalformedChainId(msg),
        }
    }
}
