//! The signing session poll loop.
//!
//! Completion depends on an out-of-band human approval that may take
//! arbitrary time, so the loop is unbounded by default and uses a fixed
//! inter-poll delay rather than backoff: this is a human-latency workflow,
//! not a high-frequency API.

use crate::types::{TransactionStatus, TxKey};
use crate::{CustodyApi, CustodyError, SignRequest};
use alloy_primitives::Bytes;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Fixed delay between session status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Submits a signing request and polls the session until it turns terminal.
///
/// Dropping the returned future cancels the wait; the custody session itself
/// keeps living server-side and can be re-polled by key.
#[derive(Debug, Clone)]
pub struct SessionPoller<C> {
    custody: C,
    poll_interval: Duration,
    max_attempts: Option<usize>,
}

impl<C: CustodyApi> SessionPoller<C> {
    pub const fn new(custody: C) -> Self {
        Self {
            custody,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: None,
        }
    }

    /// Override the fixed inter-poll delay.
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Bound the number of polls. Unbounded by default, since approval can
    /// take as long as a human takes.
    pub const fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Submit a signing request and block until the signed bytes arrive.
    pub async fn sign(&self, request: SignRequest) -> Result<Bytes, CustodyError> {
        let tx_key = self.custody.create_sign_transaction(&request).await?;
        info!(
            tx_key = %tx_key,
            customer_ref_id = %request.customer_ref_id,
            "Signing request submitted, review and approve on the custody mobile app"
        );

        self.wait_for_signature(&tx_key).await
    }

    /// Poll an already-submitted session until terminal.
    ///
    /// One status query per iteration, fixed delay, no backoff. A session
    /// observed in a terminal state is never queried again.
    pub async fn wait_for_signature(&self, tx_key: &TxKey) -> Result<Bytes, CustodyError> {
        let mut attempts = 0usize;

        loop {
            let session = self.custody.one_sign_request(tx_key).await?;
            let status = session.transaction_status;

            if !status.is_terminal() {
                attempts += 1;
                if let Some(max) = self.max_attempts {
                    if attempts >= max {
                        return Err(CustodyError::Exhausted { attempts });
                    }
                }

                info!(tx_key = %tx_key, attempt = attempts, "Waiting for signature approval");
                sleep(self.poll_interval).await;
                continue;
            }

            if status == TransactionStatus::SignCompleted {
                let signed = session
                    .transaction
                    .map(|tx| tx.signed_transaction)
                    .ok_or_else(|| CustodyError::MissingSignature {
                        tx_key: tx_key.clone(),
                    })?;
                let bytes: Bytes =
                    signed
                        .parse()
                        .map_err(|_| CustodyError::MalformedSignature {
                            tx_key: tx_key.clone(),
                        })?;

                info!(tx_key = %tx_key, "Signature obtained from the custody service");
                return Ok(bytes);
            }

            warn!(tx_key = %tx_key, status = %status, "Signing workflow ended unsuccessfully");
            return Err(CustodyError::Workflow { status });
        }
    }
}
