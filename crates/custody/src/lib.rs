//! Client for the remote custody service that holds signing authority.
//!
//! Signing a transaction is a two-step, human-gated workflow:
//! 1. Submit a signing request ([`SignRequest`]) and receive an opaque
//!    session key (`tx_key`).
//! 2. Poll the session until a human approves or rejects it on the custody
//!    mobile app, then extract the signed transaction bytes.
//!
//! The [`SessionPoller`] drives step 2; the [`CustodyApi`] trait is the seam
//! between the poller and the HTTP client so tests can script session states.

pub mod client;
pub mod session;
pub mod translate;
pub mod types;

mod error;

pub use client::CustodyClient;
pub use error::CustodyError;
pub use session::SessionPoller;
pub use translate::{translate, RawTransaction, TranslateError};
pub use types::{
    SignRequest, SignSession, SignedTransaction, TransactionFields, TransactionStatus, TxKey,
};

use std::future::Future;
use std::sync::Arc;

/// The custody service call surface.
///
/// The wire protocol behind these two calls is the custody vendor's concern;
/// this trait only fixes the request/response shapes the signer depends on.
pub trait CustodyApi: Send + Sync {
    /// Submit a signing request, returning the session key to poll on.
    fn create_sign_transaction(
        &self,
        request: &SignRequest,
    ) -> impl Future<Output = Result<TxKey, CustodyError>> + Send;

    /// Fetch the current state of a signing session.
    fn one_sign_request(
        &self,
        tx_key: &str,
    ) -> impl Future<Output = Result<SignSession, CustodyError>> + Send;
}

impl<T: CustodyApi> CustodyApi for &T {
    fn create_sign_transaction(
        &self,
        request: &SignRequest,
    ) -> impl Future<Output = Result<TxKey, CustodyError>> + Send {
        (**self).create_sign_transaction(request)
    }

    fn one_sign_request(
        &self,
        tx_key: &str,
    ) -> impl Future<Output = Result<SignSession, CustodyError>> + Send {
        (**self).one_sign_request(tx_key)
    }
}

/// Clients are often shared between a poller and the caller that inspects
/// them; an `Arc`-wrapped client is as good as the client itself.
impl<T: CustodyApi> CustodyApi for Arc<T> {
    fn create_sign_transaction(
        &self,
        request: &SignRequest,
    ) -> impl Future<Output = Result<TxKey, CustodyError>> + Send {
        (**self).create_sign_transaction(request)
    }

    fn one_sign_request(
        &self,
        tx_key: &str,
    ) -> impl Future<Output = Result<SignSession, CustodyError>> + Send {
        (**self).one_sign_request(tx_key)
    }
}
