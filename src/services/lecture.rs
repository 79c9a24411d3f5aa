use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::database::models::Lecture;

#[derive(Debug, Error)]
pub enum LectureError {
    #[error("lecture has purchases and cannot be deleted")]
    HasPurchases,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub struct NewLecture {
    pub title: String,
    pub description: String,
    pub price: Decimal,
}

#[derive(Default)]
pub struct LectureChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}

pub async fn list_for_instructor(
    pool: &PgPool,
    instructor_id: i64,
) -> Result<Vec<Lecture>, sqlx::Error> {
    sqlx::query_as::<_, Lecture>(
        "SELECT * FROM lectures WHERE instructor_id = $1 ORDER BY created_at DESC",
    )
    .bind(instructor_id)
    .fetch_all(pool)
    .await
}

/// New lectures start as inactive drafts.
pub async fn create(
    pool: &PgPool,
    instructor_id: i64,
    new: NewLecture,
) -> Result<Lecture, sqlx::Error> {
    let lecture = sqlx::query_as::<_, Lecture>(
        "INSERT INTO lectures (instructor_id, title, description, price) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(instructor_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.price)
    .fetch_one(pool)
    .await?;

    info!(lecture_id = lecture.id, instructor_id, "lecture created");
    Ok(lecture)
}

pub async fn update(
    pool: &PgPool,
    lecture_id: i64,
    changes: LectureChanges,
) -> Result<Lecture, sqlx::Error> {
    sqlx::query_as::<_, Lecture>(
        "UPDATE lectures SET \
             title = COALESCE($2, title), \
             description = COALESCE($3, description), \
             price = COALESCE($4, price), \
             is_active = COALESCE($5, is_active), \
             updated_at = now() \
         WHERE id = $1 RETURNING *",
    )
    .bind(lecture_id)
    .bind(changes.title)
    .bind(changes.description)
    .bind(changes.price)
    .bind(changes.is_active)
    .fetch_one(pool)
    .await
}

/// Delete a lecture and its whole content tree, reviews, and payment orders
/// in one transaction. Refused while purchases exist.
pub async fn delete(pool: &PgPool, lecture_id: i64) -> Result<(), LectureError> {
    let (purchases,): (i64,) =
        sqlx::query_as("SELECT count(*) FROM purchases WHERE lecture_id = $1")
            .bind(lecture_id)
            .fetch_one(pool)
            .await?;
    if purchases > 0 {
        return Err(LectureError::HasPurchases);
    }

    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM videos WHERE section_id IN (\
             SELECT s.id FROM curriculum_sections s \
             JOIN curriculums c ON c.id = s.curriculum_id \
             WHERE c.lecture_id = $1)",
    )
    .bind(lecture_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM files WHERE section_id IN (\
             SELECT s.id FROM curriculum_sections s \
             JOIN curriculums c ON c.id = s.curriculum_id \
             WHERE c.lecture_id = $1)",
    )
    .bind(lecture_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM curriculum_sections WHERE curriculum_id IN (\
             SELECT id FROM curriculums WHERE lecture_id = $1)",
    )
    .bind(lecture_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM curriculums WHERE lecture_id = $1")
        .bind(lecture_id)
        .execute(&mut *tx)
        .await?;

    // Replies reference their parent review, so clear them first.
    sqlx::query("DELETE FROM reviews WHERE lecture_id = $1 AND parent_id IS NOT NULL")
        .bind(lecture_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM reviews WHERE lecture_id = $1")
        .bind(lecture_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM payment_orders WHERE lecture_id = $1")
        .bind(lecture_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM lectures WHERE id = $1")
        .bind(lecture_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(lecture_id, "lecture deleted");
    Ok(())
}

/// Public catalog page: active lectures only, newest first.
pub async fn catalog_page(
    pool: &PgPool,
    page: i64,
    page_size: i64,
) -> Result<Vec<Lecture>, sqlx::Error> {
    let offset = page.max(0) * page_size;
    sqlx::query_as::<_, Lecture>(
        "SELECT * FROM lectures WHERE is_active \
         ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(page_size)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn find(pool: &PgPool, lecture_id: i64) -> Result<Option<Lecture>, sqlx::Error> {
    sqlx::query_as::<_, Lecture>("SELECT * FROM lectures WHERE id = $1")
        .bind(lecture_id)
        .fetch_optional(pool)
        .await
}
