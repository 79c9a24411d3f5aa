use axum::extract::Path;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::database::manager::DatabaseManager;
use crate::database::models::Lecture;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ok_true, ApiResponse, ApiResult, AuthUser};
use crate::ownership::{self, ContentKind};
use crate::services::lecture;

#[derive(Debug, Deserialize)]
pub struct CreateLectureRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateLectureRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

/// GET /api/lectures - The caller's own lectures, drafts included
pub async fn list(Extension(user): Extension<AuthUser>) -> ApiResult<Vec<Lecture>> {
    let pool = DatabaseManager::pool()?;
    let lectures = lecture::list_for_instructor(&pool, user.user_id).await?;
    Ok(ApiResponse::success(lectures))
}

/// POST /api/lectures - Create a draft lecture owned by the caller
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<CreateLectureRequest>,
) -> ApiResult<Lecture> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }
    if payload.price < Decimal::ZERO {
        return Err(ApiError::bad_request("price must not be negative"));
    }

    let pool = DatabaseManager::pool()?;
    let created = lecture::create(
        &pool,
        user.user_id,
        lecture::NewLecture {
            title: payload.title.trim().to_string(),
            description: payload.description,
            price: payload.price,
        },
    )
    .await?;

    Ok(ApiResponse::created(created))
}

/// PUT /api/lectures/:id - Update an owned lecture
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateLectureRequest>,
) -> ApiResult<Lecture> {
    let id = parse_id(&id, "lecture")?;
    if let Some(price) = payload.price {
        if price < Decimal::ZERO {
            return Err(ApiError::bad_request("price must not be negative"));
        }
    }
    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::bad_request("title must not be empty"));
        }
    }

    let pool = DatabaseManager::pool()?;
    ownership::require_owner(&pool, user.user_id, ContentKind::Lecture, id).await?;

    let updated = lecture::update(
        &pool,
        id,
        lecture::LectureChanges {
            title: payload.title,
            description: payload.description,
            price: payload.price,
            is_active: payload.is_active,
        },
    )
    .await?;

    Ok(ApiResponse::success(updated))
}

/// DELETE /api/lectures/:id - Delete an owned lecture and its content tree
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "lecture")?;
    let pool = DatabaseManager::pool()?;

    ownership::require_owner(&pool, user.user_id, ContentKind::Lecture, id).await?;
    lecture::delete(&pool, id).await?;

    Ok(ok_true())
}
