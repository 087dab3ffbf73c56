//! Translation from the hex-encoded JSON-RPC transaction shape into the
//! custody service's typed request shape.
//!
//! JSON-RPC quantities arrive as 0x-prefixed base-16 strings; the custody
//! service wants integers for gas limit and nonce and base-10 strings for
//! value and the fee fields. A malformed quantity fails the whole translation
//! before anything is submitted.

use crate::types::{SignRequest, TransactionFields};
use alloy_primitives::U256;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// A field the custody request cannot do without was not supplied.
    #[error("transaction is missing required field `{0}`")]
    MissingField(&'static str),

    /// A numeric field was present but is not a valid hex quantity.
    #[error("transaction field `{field}` is not a valid hex quantity: `{value}`")]
    InvalidQuantity {
        field: &'static str,
        value: String,
    },
}

/// An `eth_signTransaction` parameter object as it arrives over JSON-RPC.
///
/// All numeric fields are 0x-prefixed hex strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub from: Option<String>,
    pub to: Option<String>,
    pub value: Option<String>,
    pub gas: Option<String>,
    pub gas_price: Option<String>,
    pub max_fee_per_gas: Option<String>,
    pub max_priority_fee_per_gas: Option<String>,
    pub nonce: Option<String>,
    pub data: Option<String>,
}

/// Build a [`SignRequest`] from raw JSON-RPC transaction parameters.
///
/// The chain id comes from the adapter's bootstrapped state, never from the
/// input. Every call generates a fresh idempotency key, so logically retried
/// submissions stay distinguishable downstream.
pub fn translate(
    tx: &RawTransaction,
    chain_id: u64,
    account_key: &str,
) -> Result<SignRequest, TranslateError> {
    let value = match tx.value.as_deref() {
        Some(v) => parse_quantity("value", v)?.to_string(),
        None => "0".to_string(),
    };

    let gas = tx.gas.as_deref().ok_or(TranslateError::MissingField("gas"))?;
    let gas_limit = parse_integer("gas", gas)?;

    let nonce = tx
        .nonce
        .as_deref()
        .ok_or(TranslateError::MissingField("nonce"))?;
    let nonce = parse_integer("nonce", nonce)?;

    let max_priority_fee_per_gas =
        parse_fee("maxPriorityFeePerGas", tx.max_priority_fee_per_gas.as_deref())?;
    let max_fee_per_gas = parse_fee("maxFeePerGas", tx.max_fee_per_gas.as_deref())?;
    let gas_price = parse_fee("gasPrice", tx.gas_price.as_deref())?;

    Ok(SignRequest {
        customer_ref_id: Uuid::new_v4().to_string(),
        account_key: account_key.to_string(),
        transaction: TransactionFields {
            value,
            chain_id,
            gas_limit,
            max_priority_fee_per_gas,
            max_fee_per_gas,
            gas_price,
            nonce,
            data: tx.data.clone(),
            to: tx.to.clone(),
        },
    })
}

/// Parse an optional fee field, rendering it as a base-10 string.
fn parse_fee(
    field: &'static str,
    value: Option<&str>,
) -> Result<Option<String>, TranslateError> {
    value
        .map(|v| parse_quantity(field, v).map(|q| q.to_string()))
        .transpose()
}

/// Parse a hex quantity into a U256.
fn parse_quantity(field: &'static str, value: &str) -> Result<U256, TranslateError> {
    let digits = strip_hex_prefix(value);
    if digits.is_empty() {
        return Err(invalid(field, value));
    }
    U256::from_str_radix(digits, 16).map_err(|_| invalid(field, value))
}

/// Parse a hex quantity that must fit a u64 (gas limit, nonce).
fn parse_integer(field: &'static str, value: &str) -> Result<u64, TranslateError> {
    let digits = strip_hex_prefix(value);
    if digits.is_empty() {
        return Err(invalid(field, value));
    }
    u64::from_str_radix(digits, 16).map_err(|_| invalid(field, value))
}

fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

fn invalid(field: &'static str, value: &str) -> TranslateError {
    TranslateError::InvalidQuantity {
        field,
        value: value.to_string(),
    }
}
