use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::database::manager::DatabaseManager;
use crate::database::models::Purchase;
use crate::error::ApiError;
use crate::middleware::{ok_true, ApiResponse, ApiResult, AuthUser};
use crate::services::purchase;

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub lecture_id: i64,
}

/// POST /api/purchases - Record a purchase for the caller. Idempotent:
/// buying the same lecture twice reports success both times and leaves one
/// row.
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreatePurchaseRequest>,
) -> ApiResult<Value> {
    if payload.lecture_id <= 0 {
        return Err(ApiError::bad_request(format!(
            "invalid lecture id: {}",
            payload.lecture_id
        )));
    }

    let pool = DatabaseManager::pool()?;
    purchase::create(&pool, user.user_id, payload.lecture_id).await?;

    Ok(ok_true())
}

/// GET /api/purchases - The caller's purchases
pub async fn list(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Purchase>> {
    let pool = DatabaseManager::pool()?;
    let purchases = purchase::list_for_user(&pool, user.user_id).await?;
    Ok(ApiResponse::success(purchases))
}
