use crate::translate::TranslateError;
use crate::types::TransactionStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CustodyError {
    /// Transport-level failure talking to the custody API.
    #[error("custody request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The custody API answered with an application-level error.
    #[error("custody api error {code}: {message}")]
    Api { code: i64, message: String },

    /// The approval workflow ended unsuccessfully. The transaction was not
    /// signed; the caller must re-initiate signing.
    #[error("signing request ended {status}, please try again")]
    Workflow { status: TransactionStatus },

    /// The transaction parameters could not be translated.
    #[error(transparent)]
    Translate(#[from] TranslateError),

    /// A session reported `SIGN_COMPLETED` without a signed transaction.
    #[error("session {tx_key} completed without a signed transaction")]
    MissingSignature { tx_key: String },

    /// The signed transaction returned by the service is not valid hex.
    #[error("session {tx_key} returned a malformed signed transaction")]
    MalformedSignature { tx_key: String },

    /// The configured poll bound was reached before the session turned
    /// terminal.
    #[error("signature not obtained after {attempts} polls")]
    Exhausted { attempts: usize },
}
