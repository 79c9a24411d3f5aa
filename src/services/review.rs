use sqlx::PgPool;
use thiserror::Error;

use crate::database::models::Review;
use crate::services::purchase;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("parent review not found")]
    ParentNotFound,

    #[error("only purchasers may review this lecture")]
    NotPurchaser,

    #[error("rating must be between 1 and 5")]
    InvalidRating,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Top-level review: caller must have purchased the lecture, rating 1-5.
pub async fn create_review(
    pool: &PgPool,
    user_id: i64,
    lecture_id: i64,
    rating: i32,
    body: &str,
) -> Result<Review, ReviewError> {
    if !(1..=5).contains(&rating) {
        return Err(ReviewError::InvalidRating);
    }
    if !purchase::has_purchased(pool, user_id, lecture_id).await? {
        return Err(ReviewError::NotPurchaser);
    }

    let review = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (lecture_id, user_id, rating, body) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(lecture_id)
    .bind(user_id)
    .bind(rating)
    .bind(body)
    .fetch_one(pool)
    .await?;

    Ok(review)
}

/// Reply to an existing review. The reply inherits the parent's lecture_id
/// and its rating is always 0; any rating the caller sent is ignored.
pub async fn create_reply(
    pool: &PgPool,
    user_id: i64,
    parent_id: i64,
    body: &str,
) -> Result<Review, ReviewError> {
    let parent = sqlx::query_as::<_, Review>("SELECT * FROM reviews WHERE id = $1")
        .bind(parent_id)
        .fetch_optional(pool)
        .await?
        .ok_or(ReviewError::ParentNotFound)?;

    let reply = sqlx::query_as::<_, Review>(
        "INSERT INTO reviews (lecture_id, user_id, parent_id, rating, body) \
         VALUES ($1, $2, $3, 0, $4) RETURNING *",
    )
    .bind(parent.lecture_id)
    .bind(user_id)
    .bind(parent.id)
    .bind(body)
    .fetch_one(pool)
    .await?;

    Ok(reply)
}

/// Review thread: a top-level review with its replies.
#[derive(Debug, serde::Serialize)]
pub struct ReviewThread {
    #[serde(flatten)]
    pub review: Review,
    pub replies: Vec<Review>,
}

pub async fn list_for_lecture(
    pool: &PgPool,
    lecture_id: i64,
) -> Result<Vec<ReviewThread>, sqlx::Error> {
    let rows = sqlx::query_as::<_, Review>(
        "SELECT * FROM reviews WHERE lecture_id = $1 ORDER BY created_at, id",
    )
    .bind(lecture_id)
    .fetch_all(pool)
    .await?;

    Ok(thread_reviews(rows))
}

/// Attach replies to their top-level review. Replies to replies surface
/// under the thread root so the client sees one flat conversation.
fn thread_reviews(rows: Vec<Review>) -> Vec<ReviewThread> {
    let mut threads: Vec<ReviewThread> = Vec::new();
    let mut root_of: std::collections::HashMap<i64, i64> = std::collections::HashMap::new();

    for row in rows {
        match row.parent_id {
            None => {
                root_of.insert(row.id, row.id);
                threads.push(ReviewThread {
                    review: row,
                    replies: Vec::new(),
                });
            }
            Some(parent_id) => {
                // Rows are ordered by creation, so the parent was seen first.
                let root = root_of.get(&parent_id).copied().unwrap_or(parent_id);
                root_of.insert(row.id, root);
                if let Some(thread) = threads.iter_mut().find(|t| t.review.id == root) {
                    thread.replies.push(row);
                }
            }
        }
    }

    threads
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn review(id: i64, parent_id: Option<i64>, rating: i32) -> Review {
        Review {
            id,
            lecture_id: 5,
            user_id: 1,
            parent_id,
            rating,
            body: format!("r{id}"),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn replies_attach_to_their_thread() {
        let threads = thread_reviews(vec![
            review(1, None, 5),
            review(2, None, 3),
            review(3, Some(1), 0),
            review(4, Some(3), 0),
        ]);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].replies.len(), 2);
        assert!(threads[1].replies.is_empty());
        // Reply-to-reply surfaces under the thread root.
        assert_eq!(threads[0].replies[1].id, 4);
    }

    #[test]
    fn orphan_reply_is_dropped() {
        let threads = thread_reviews(vec![review(7, Some(999), 0)]);
        assert!(threads.is_empty());
    }
}
