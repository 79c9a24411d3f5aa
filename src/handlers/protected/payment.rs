use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::database::manager::DatabaseManager;
use crate::database::models::PaymentOrder;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::payment;

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub lecture_id: i64,
}

/// POST /api/payments/orders - Open a pending payment order
pub async fn create_order(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateOrderRequest>,
) -> ApiResult<PaymentOrder> {
    if payload.lecture_id <= 0 {
        return Err(ApiError::bad_request(format!(
            "invalid lecture id: {}",
            payload.lecture_id
        )));
    }

    let pool = DatabaseManager::pool()?;
    let order = payment::create_order(&pool, user.user_id, payload.lecture_id).await?;

    Ok(ApiResponse::created(order))
}

/// GET /api/payments/orders/:merchant_uid - Look up one of the caller's orders
pub async fn get_order(
    Extension(user): Extension<AuthUser>,
    Path(merchant_uid): Path<String>,
) -> ApiResult<PaymentOrder> {
    let pool = DatabaseManager::pool()?;

    let order = payment::find_order(&pool, &merchant_uid)
        .await?
        .ok_or_else(|| ApiError::not_found("payment order not found"))?;

    // Orders are private to their buyer.
    if order.user_id != user.user_id {
        return Err(ApiError::forbidden("not your payment order"));
    }

    Ok(ApiResponse::success(order))
}
