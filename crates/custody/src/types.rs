use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque session key returned when a signing request is created.
pub type TxKey = String;

/// A signing request as submitted to the custody service.
///
/// `customer_ref_id` is the idempotency key: freshly generated for every
/// submission, never reused, so the custody service can deduplicate retries
/// while still treating each logical submission as distinct.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignRequest {
    /// Idempotency key, unique per submission
    pub customer_ref_id: String,
    /// Custody account the request is created under
    pub account_key: String,
    /// The transaction to sign
    pub transaction: TransactionFields,
}

/// Transaction fields in the custody service's typed shape.
///
/// Gas limit and nonce travel as integers; value and the fee fields travel as
/// base-10 integer strings. Fee fields are optional because a transaction
/// carries either the EIP-1559 pair or a legacy gas price, not both.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFields {
    /// Transfer amount in wei, base-10 string
    pub value: String,
    /// Chain id resolved from the underlying node at bootstrap
    pub chain_id: u64,
    /// Gas limit
    pub gas_limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    /// Account nonce
    pub nonce: u64,
    /// Call data, 0x-prefixed hex
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Recipient address; absent for contract creation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// A signing session as reported by the custody service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignSession {
    /// Session key this state belongs to
    pub tx_key: TxKey,
    /// Where the approval workflow currently stands
    pub transaction_status: TransactionStatus,
    /// Present once the session reaches `SIGN_COMPLETED`
    #[serde(default)]
    pub transaction: Option<SignedTransaction>,
}

/// Signed transaction payload carried by a completed session.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTransaction {
    /// The signed, RLP-encoded transaction as 0x-prefixed hex
    pub signed_transaction: String,
}

/// Status of a custody signing session.
///
/// `SIGN_COMPLETED`, `FAILED` and `REJECTED` are terminal; every other status
/// the service may report (queued, pending approval, broadcasting, ...) maps
/// to [`TransactionStatus::InProgress`] and keeps the poll loop running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TransactionStatus {
    #[serde(rename = "SIGN_COMPLETED")]
    SignCompleted,
    #[serde(rename = "FAILED")]
    Failed,
    #[serde(rename = "REJECTED")]
    Rejected,
    #[serde(other)]
    InProgress,
}

impl TransactionStatus {
    /// Terminal sessions are never polled again.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::SignCompleted | Self::Failed | Self::Rejected)
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::SignCompleted => "SIGN_COMPLETED",
            Self::Failed => "FAILED",
            Self::Rejected => "REJECTED",
            Self::InProgress => "IN_PROGRESS",
        };
        f.write_str(s)
    }
}
