use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lecture review. Top-level rows carry a 1-5 rating; replies reference a
/// parent review, inherit its lecture_id, and always have rating 0.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
    pub id: i64,
    pub lecture_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub rating: i32,
    pub body: String,
    pub created_at: DateTime<Utc>,
}
