use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row per (user, lecture) pair, enforced by a unique constraint.
/// Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Purchase {
    pub id: i64,
    pub user_id: i64,
    pub lecture_id: i64,
    pub created_at: DateTime<Utc>,
}
