use axum::extract::Path;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::database::manager::DatabaseManager;
use crate::database::models::{Curriculum, CurriculumSection};
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ok_true, ApiResponse, ApiResult, AuthUser};
use crate::ownership::{self, ContentKind};
use crate::services::curriculum;

#[derive(Debug, Deserialize)]
pub struct CreateCurriculumRequest {
    pub title: String,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Deserialize)]
pub struct CreateSectionRequest {
    pub title: String,
    #[serde(default)]
    pub position: i32,
}

/// POST /api/lectures/:id/curriculums - Add a curriculum to an owned lecture
pub async fn create(
    Extension(user): Extension<AuthUser>,
    Path(lecture_id): Path<String>,
    Json(payload): Json<CreateCurriculumRequest>,
) -> ApiResult<Curriculum> {
    let lecture_id = parse_id(&lecture_id, "lecture")?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }

    let pool = DatabaseManager::pool()?;
    ownership::require_owner(&pool, user.user_id, ContentKind::Lecture, lecture_id).await?;

    let created =
        curriculum::create_curriculum(&pool, lecture_id, payload.title.trim(), payload.position)
            .await?;
    Ok(ApiResponse::created(created))
}

/// DELETE /api/curriculums/:id - Cascade delete an owned curriculum
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "curriculum")?;
    let pool = DatabaseManager::pool()?;

    ownership::require_owner(&pool, user.user_id, ContentKind::Curriculum, id).await?;
    curriculum::delete_curriculum(&pool, id).await?;

    Ok(ok_true())
}

/// POST /api/curriculums/:id/sections - Add a section to an owned curriculum
pub async fn create_section(
    Extension(user): Extension<AuthUser>,
    Path(curriculum_id): Path<String>,
    Json(payload): Json<CreateSectionRequest>,
) -> ApiResult<CurriculumSection> {
    let curriculum_id = parse_id(&curriculum_id, "curriculum")?;
    if payload.title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }

    let pool = DatabaseManager::pool()?;
    ownership::require_owner(&pool, user.user_id, ContentKind::Curriculum, curriculum_id).await?;

    let created =
        curriculum::create_section(&pool, curriculum_id, payload.title.trim(), payload.position)
            .await?;
    Ok(ApiResponse::created(created))
}

/// DELETE /api/sections/:id - Cascade delete an owned section
pub async fn delete_section(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id, "section")?;
    let pool = DatabaseManager::pool()?;

    ownership::require_owner(&pool, user.user_id, ContentKind::Section, id).await?;
    curriculum::delete_section(&pool, id).await?;

    Ok(ok_true())
}
