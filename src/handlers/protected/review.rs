use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::database::manager::DatabaseManager;
use crate::database::models::Review;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::review;

#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateReplyRequest {
    pub body: String,
    /// Accepted for shape compatibility with top-level reviews; replies
    /// never carry a rating, whatever the caller sent.
    #[serde(default)]
    #[allow(dead_code)]
    pub rating: Option<i32>,
}

/// POST /api/lectures/:id/reviews - Review a purchased lecture
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Path(lecture_id): Path<String>,
    Json(payload): Json<CreateReviewRequest>,
) -> ApiResult<Review> {
    let lecture_id = parse_id(&lecture_id, "lecture")?;
    if payload.body.trim().is_empty() {
        return Err(ApiError::bad_request("body must not be empty"));
    }

    let pool = DatabaseManager::pool()?;
    let created =
        review::create_review(&pool, user.user_id, lecture_id, payload.rating, payload.body.trim())
            .await?;

    Ok(ApiResponse::created(created))
}

/// POST /api/reviews/:id/replies - Reply to an existing review
pub async fn reply(
    Extension(user): Extension<AuthUser>,
    Path(parent_id): Path<String>,
    Json(payload): Json<CreateReplyRequest>,
) -> ApiResult<serde_json::Value> {
    let parent_id = parse_id(&parent_id, "review")?;
    if payload.body.trim().is_empty() {
        return Err(ApiError::bad_request("body must not be empty"));
    }

    let pool = DatabaseManager::pool()?;
    review::create_reply(&pool, user.user_id, parent_id, payload.body.trim()).await?;

    Ok(ApiResponse::with_status(
        serde_json::json!({ "ok": true }),
        axum::http::StatusCode::CREATED,
    ))
}
