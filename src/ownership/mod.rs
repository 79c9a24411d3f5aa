//! Ownership checks for the content tree.
//!
//! Every mutating operation on Lecture -> Curriculum -> CurriculumSection ->
//! {Video, File} must trace ownership up the foreign-key chain to the
//! lecture's instructor before touching anything. The chain walk is a single
//! read per entity kind, looked up from a static table; the check itself has
//! no side effects.

use sqlx::PgPool;
use thiserror::Error;

/// Node kinds in the content tree that can be targeted by a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Lecture,
    Curriculum,
    Section,
    Video,
    File,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Lecture => "lecture",
            ContentKind::Curriculum => "curriculum",
            ContentKind::Section => "section",
            ContentKind::Video => "video",
            ContentKind::File => "file",
        }
    }

    /// Query resolving the owning instructor for a node of this kind,
    /// joining up the FK chain to `lectures.instructor_id`.
    fn owner_sql(&self) -> &'static str {
        match self {
            ContentKind::Lecture => {
                "SELECT instructor_id FROM lectures WHERE id = $1"
            }
            ContentKind::Curriculum => {
                "SELECT l.instructor_id FROM curriculums c \
                 JOIN lectures l ON l.id = c.lecture_id \
                 WHERE c.id = $1"
            }
            ContentKind::Section => {
                "SELECT l.instructor_id FROM curriculum_sections s \
                 JOIN curriculums c ON c.id = s.curriculum_id \
                 JOIN lectures l ON l.id = c.lecture_id \
                 WHERE s.id = $1"
            }
            ContentKind::Video => {
                "SELECT l.instructor_id FROM videos v \
                 JOIN curriculum_sections s ON s.id = v.section_id \
                 JOIN curriculums c ON c.id = s.curriculum_id \
                 JOIN lectures l ON l.id = c.lecture_id \
                 WHERE v.id = $1"
            }
            ContentKind::File => {
                "SELECT l.instructor_id FROM files f \
                 JOIN curriculum_sections s ON s.id = f.section_id \
                 JOIN curriculums c ON c.id = s.curriculum_id \
                 JOIN lectures l ON l.id = c.lecture_id \
                 WHERE f.id = $1"
            }
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum OwnershipError {
    #[error("{0} not found")]
    NotFound(ContentKind),

    #[error("not the owner of this {0}")]
    NotOwner(ContentKind),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Resolve the instructor that owns a content-tree node, or None when the
/// node does not exist.
pub async fn owner_of(
    pool: &PgPool,
    kind: ContentKind,
    id: i64,
) -> Result<Option<i64>, sqlx::Error> {
    let owner: Option<(i64,)> = sqlx::query_as(kind.owner_sql())
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(owner.map(|(instructor_id,)| instructor_id))
}

/// Reject the operation unless `principal` owns the node's root lecture.
///
/// A missing node is NotFound; an existing node owned by someone else is
/// NotOwner. Callers map these to 404 and 403 respectively, distinct from
/// the 401 the auth middleware produces and the 400 of malformed ids.
pub async fn require_owner(
    pool: &PgPool,
    principal: i64,
    kind: ContentKind,
    id: i64,
) -> Result<(), OwnershipError> {
    match owner_of(pool, kind, id).await? {
        None => Err(OwnershipError::NotFound(kind)),
        Some(instructor_id) if instructor_id != principal => {
            Err(OwnershipError::NotOwner(kind))
        }
        Some(_) => Ok(()),
    }
}
