use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Video entry in a curriculum section. The storage key points into the
/// streaming provider's bucket; this service never touches the bytes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Video {
    pub id: i64,
    pub section_id: i64,
    pub title: String,
    pub storage_key: String,
    pub duration_secs: i32,
    pub position: i32,
}

/// Downloadable attachment in a curriculum section.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    pub id: i64,
    pub section_id: i64,
    pub name: String,
    pub storage_key: String,
    pub size_bytes: i64,
    pub position: i32,
}
