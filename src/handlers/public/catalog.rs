use axum::extract::{Path, Query};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config;
use crate::database::manager::DatabaseManager;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::{curriculum, lecture, review};

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub page: Option<i64>,
}

/// GET /lectures - Active lectures, newest first
pub async fn list(Query(query): Query<CatalogQuery>) -> ApiResult<Value> {
    let pool = DatabaseManager::pool()?;
    let page = query.page.unwrap_or(0).max(0);
    let page_size = config::config().api.catalog_page_size;

    let lectures = lecture::catalog_page(&pool, page, page_size).await?;
    Ok(ApiResponse::success(json!({
        "page": page,
        "lectures": lectures,
    })))
}

/// GET /lectures/:id - Lecture detail with its curriculum outline.
/// Drafts are invisible here; only the instructor sees them via /api.
pub async fn detail(Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id, "lecture")?;
    let pool = DatabaseManager::pool()?;

    let found = lecture::find(&pool, id).await?;
    let found = match found {
        Some(l) if l.is_active => l,
        _ => return Err(crate::error::ApiError::not_found("lecture not found")),
    };

    let outline = curriculum::outline(&pool, id).await?;
    Ok(ApiResponse::success(json!({
        "lecture": found,
        "curriculums": outline,
    })))
}

/// GET /lectures/:id/reviews - Review threads for a lecture
pub async fn reviews(Path(id): Path<String>) -> ApiResult<Vec<review::ReviewThread>> {
    let id = parse_id(&id, "lecture")?;
    let pool = DatabaseManager::pool()?;

    let threads = review::list_for_lecture(&pool, id).await?;
    Ok(ApiResponse::success(threads))
}
