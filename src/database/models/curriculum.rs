use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Curriculum {
    pub id: i64,
    pub lecture_id: i64,
    pub title: String,
    pub position: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CurriculumSection {
    pub id: i64,
    pub curriculum_id: i64,
    pub title: String,
    pub position: i32,
}
