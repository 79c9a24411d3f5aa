//! Payment gateway boundary.
//!
//! The gateway is an external collaborator reached over HTTPS. Callbacks to
//! our webhook are authenticated with a digest header, and the payment state
//! they announce is always re-read from the gateway before we act on it.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::sync::{Arc, OnceLock};
use thiserror::Error;

use crate::config;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment gateway not configured")]
    NotConfigured,

    #[error("payment {0} not found at gateway")]
    PaymentNotFound(String),

    #[error("gateway request failed: {0}")]
    Request(String),

    #[error("gateway returned an unexpected payload: {0}")]
    BadPayload(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayPaymentStatus {
    Paid,
    Failed,
    Pending,
}

/// The gateway's view of one payment attempt.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayPayment {
    pub merchant_uid: String,
    pub status: GatewayPaymentStatus,
    pub amount: Decimal,
    pub fail_reason: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Fetch the authoritative state of a payment by our order identifier.
    async fn fetch_payment(&self, merchant_uid: &str) -> Result<GatewayPayment, GatewayError>;
}

/// HTTP client for the real gateway.
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: String,
    api_secret: String,
}

impl HttpPaymentGateway {
    pub fn from_config() -> Self {
        let payment = &config::config().payment;
        Self {
            client: reqwest::Client::new(),
            base_url: payment.gateway_base_url.trim_end_matches('/').to_string(),
            api_secret: payment.gateway_api_secret.clone(),
        }
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn fetch_payment(&self, merchant_uid: &str) -> Result<GatewayPayment, GatewayError> {
        if self.base_url.is_empty() {
            return Err(GatewayError::NotConfigured);
        }

        let url = format!("{}/payments/{}", self.base_url, merchant_uid);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.api_secret)
            .send()
            .await
            .map_err(|e| GatewayError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GatewayError::PaymentNotFound(merchant_uid.to_string()));
        }
        if !response.status().is_success() {
            return Err(GatewayError::Request(format!(
                "gateway returned {}",
                response.status()
            )));
        }

        response
            .json::<GatewayPayment>()
            .await
            .map_err(|e| GatewayError::BadPayload(e.to_string()))
    }
}

static GATEWAY: OnceLock<Arc<dyn PaymentGateway>> = OnceLock::new();

/// Process-wide gateway handle, defaulting to the HTTP client built from
/// config. `install` wins only before first use.
pub fn gateway() -> Arc<dyn PaymentGateway> {
    GATEWAY
        .get_or_init(|| Arc::new(HttpPaymentGateway::from_config()))
        .clone()
}

pub fn install(gateway: Arc<dyn PaymentGateway>) -> Result<(), ()> {
    GATEWAY.set(gateway).map_err(|_| ())
}

/// Hex digest authenticating a webhook body: SHA-256 over body bytes
/// followed by the shared webhook secret.
pub fn webhook_digest(body: &[u8], secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body);
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-shape check of the signature header against the body digest.
/// An empty configured secret disables verification (development only).
pub fn verify_webhook_signature(body: &[u8], signature: Option<&str>, secret: &str) -> bool {
    if secret.is_empty() {
        return true;
    }
    match signature {
        Some(sig) => sig.eq_ignore_ascii_case(&webhook_digest(body, secret)),
        None => false,
    }
}
