use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use crate::database::models::Purchase;

#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("unknown lecture")]
    UnknownLecture,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Record a purchase for (user, lecture). Idempotent: a second call for the
/// same pair hits the unique constraint, which we swallow because the desired
/// end state (a purchase row exists) is already satisfied. The database is
/// the sole arbiter under concurrency.
pub async fn create(pool: &PgPool, user_id: i64, lecture_id: i64) -> Result<(), PurchaseError> {
    let inserted = sqlx::query("INSERT INTO purchases (user_id, lecture_id) VALUES ($1, $2)")
        .bind(user_id)
        .bind(lecture_id)
        .execute(pool)
        .await;

    match inserted {
        Ok(_) => {
            info!(user_id, lecture_id, "purchase recorded");
            Ok(())
        }
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => Ok(()),
        Err(sqlx::Error::Database(db_err)) if db_err.is_foreign_key_violation() => {
            Err(PurchaseError::UnknownLecture)
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn list_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Purchase>, sqlx::Error> {
    sqlx::query_as::<_, Purchase>(
        "SELECT * FROM purchases WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn has_purchased(
    pool: &PgPool,
    user_id: i64,
    lecture_id: i64,
) -> Result<bool, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM purchases WHERE user_id = $1 AND lecture_id = $2")
            .bind(user_id)
            .bind(lecture_id)
            .fetch_optional(pool)
            .await?;
    Ok(row.is_some())
}
