//! HTTP client for the custody service's web3 signing API.

use crate::types::{SignRequest, SignSession, TxKey};
use crate::{CustodyApi, CustodyError};
use config::CustodyConfig;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

const CREATE_SIGN_PATH: &str = "/v1/web3/eth-sign-transaction/create";
const ONE_SIGN_PATH: &str = "/v1/web3/sign/one";

/// Success code in the custody API's response envelope.
const API_OK: i64 = 200;

/// Client for the custody service API.
///
/// Request/response payload encryption with the configured RSA key pair is
/// the vendor SDK's concern and happens below this interface; this client
/// only fixes the call surface the signer needs.
#[derive(Debug, Clone)]
pub struct CustodyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl CustodyClient {
    /// Build a client from validated custody settings.
    pub fn new(config: &CustodyConfig) -> Result<Self, CustodyError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout_ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, CustodyError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            return Err(CustodyError::Api {
                code: i64::from(status.as_u16()),
                message,
            });
        }

        let envelope: ApiEnvelope<R> = response.json().await?;
        if envelope.code != API_OK {
            return Err(CustodyError::Api {
                code: envelope.code,
                message: envelope
                    .message
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        envelope.result.ok_or(CustodyError::Api {
            code: envelope.code,
            message: "response envelope missing result".to_string(),
        })
    }
}

impl CustodyApi for CustodyClient {
    async fn create_sign_transaction(
        &self,
        request: &SignRequest,
    ) -> Result<TxKey, CustodyError> {
        let created: CreateSignResult = self.post(CREATE_SIGN_PATH, request).await?;
        Ok(created.tx_key)
    }

    async fn one_sign_request(&self, tx_key: &str) -> Result<SignSession, CustodyError> {
        self.post(ONE_SIGN_PATH, &SessionQuery { tx_key }).await
    }
}

/// Response envelope wrapping every custody API result.
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    code: i64,
    message: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateSignResult {
    tx_key: TxKey,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionQuery<'a> {
    tx_key: &'a str,
}
