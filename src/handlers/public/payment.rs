use axum::body::Bytes;
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::Value;

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::{ok_true, ApiResult};
use crate::services::gateway::{self, verify_webhook_signature};
use crate::services::payment;

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub merchant_uid: String,
}

/// POST /payments/webhook - Gateway callback.
///
/// The body digest must match the signature header, and the announced state
/// is re-confirmed against the gateway before the order moves. Terminal
/// orders answer ok so the gateway stops retrying.
pub async fn webhook(headers: HeaderMap, body: Bytes) -> ApiResult<Value> {
    let secret = &config::config().payment.webhook_secret;
    let signature = headers
        .get("x-webhook-signature")
        .and_then(|v| v.to_str().ok());

    if !verify_webhook_signature(&body, signature, secret) {
        return Err(ApiError::forbidden("invalid webhook signature"));
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid webhook body: {}", e)))?;

    let pool = DatabaseManager::pool()?;
    let gw = gateway::gateway();
    payment::settle_order(&pool, gw.as_ref(), &payload.merchant_uid).await?;

    Ok(ok_true())
}
