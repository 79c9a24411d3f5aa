use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::database::manager::DatabaseManager;
use crate::database::models::{File, Video};
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ok_true, ApiResponse, ApiResult, AuthUser};
use crate::ownership::{self, ContentKind};
use crate::services::asset;

#[derive(Debug, Deserialize)]
pub struct CreateVideoRequest {
    pub title: String,
    pub storage_key: String,
    #[serde(default)]
    pub duration_secs: i32,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateFileRequest {
    pub name: String,
    pub storage_key: String,
    #[serde(default)]
    pub size_bytes: i64,
    #[serde(default)]
    pub position: i32,
}

/// POST /api/sections/:id/videos - Register a video under an owned section
pub async fn create_video(
    Extension(user): Extension<AuthUser>,
    Path(section_id): Path<String>,
    Json(payload): Json<CreateVideoRequest>,
) -> ApiResult<Video> {
    let section_id = parse_id(&section_id, "section")?;
    if payload.title.trim().is_empty() || payload.storage_key.trim().is_empty() {
        return Err(ApiError::bad_request("title and storage_key are required"));
    }

    let pool = DatabaseManager::pool()?;
    ownership::require_owner(&pool, user.user_id, ContentKind::Section, section_id).await?;

    let created = asset::create_video(
        &pool,
        section_id,
        asset::NewVideo {
            title: payload.title.trim().to_string(),
            storage_key: payload.storage_key,
            duration_secs: payload.duration_secs,
            position: payload.position,
        },
    )
    .await?;

    Ok(ApiResponse::created(created))
}

/// POST /api/sections/:id/files - Register a file under an owned section
pub async fn create_file(
    Extension(user): Extension<AuthUser>,
    Path(section_id): Path<String>,
    Json(payload): Json<CreateFileRequest>,
) -> ApiResult<File> {
    let section_id = parse_id(&section_id, "section")?;
    if payload.name.trim().is_empty() || payload.storage_key.trim().is_empty() {
        return Err(ApiError::bad_request("name and storage_key are required"));
    }

    let pool = DatabaseManager::pool()?;
    ownership::require_owner(&pool, user.user_id, ContentKind::Section, section_id).await?;

    let created = asset::create_file(
        &pool,
        section_id,
        asset::NewFile {
            name: payload.name.trim().to_string(),
            storage_key: payload.storage_key,
            size_bytes: payload.size_bytes,
            position: payload.position,
        },
    )
    .await?;

    Ok(ApiResponse::created(created))
}

/// DELETE /api/videos/:id - Delete an owned video
pub async fn delete_video(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "video")?;
    let pool = DatabaseManager::pool()?;

    ownership::require_owner(&pool, user.user_id, ContentKind::Video, id).await?;
    asset::delete_video(&pool, id).await?;

    Ok(ok_true())
}

/// DELETE /api/files/:id - Delete an owned file
pub async fn delete_file(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "file")?;
    let pool = DatabaseManager::pool()?;

    ownership::require_owner(&pool, user.user_id, ContentKind::File, id).await?;
    asset::delete_file(&pool, id).await?;

    Ok(ok_true())
}
