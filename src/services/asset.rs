use sqlx::PgPool;

use crate::database::models::{File, Video};

pub struct NewVideo {
    pub title: String,
    pub storage_key: String,
    pub duration_secs: i32,
    pub position: i32,
}

pub struct NewFile {
    pub name: String,
    pub storage_key: String,
    pub size_bytes: i64,
    pub position: i32,
}

pub async fn create_video(
    pool: &PgPool,
    section_id: i64,
    new: NewVideo,
) -> Result<Video, sqlx::Error> {
    sqlx::query_as::<_, Video>(
        "INSERT INTO videos (section_id, title, storage_key, duration_secs, position) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(section_id)
    .bind(&new.title)
    .bind(&new.storage_key)
    .bind(new.duration_secs)
    .bind(new.position)
    .fetch_one(pool)
    .await
}

pub async fn create_file(
    pool: &PgPool,
    section_id: i64,
    new: NewFile,
) -> Result<File, sqlx::Error> {
    sqlx::query_as::<_, File>(
        "INSERT INTO files (section_id, name, storage_key, size_bytes, position) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(section_id)
    .bind(&new.name)
    .bind(&new.storage_key)
    .bind(new.size_bytes)
    .bind(new.position)
    .fetch_one(pool)
    .await
}

pub async fn delete_video(pool: &PgPool, video_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM videos WHERE id = $1")
        .bind(video_id)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn delete_file(pool: &PgPool, file_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM files WHERE id = $1")
        .bind(file_id)
        .execute(pool)
        .await?;
    Ok(())
}
