use sqlx::PgPool;
use tracing::info;

use crate::database::models::{Curriculum, CurriculumSection, File, Video};

pub async fn create_curriculum(
    pool: &PgPool,
    lecture_id: i64,
    title: &str,
    position: i32,
) -> Result<Curriculum, sqlx::Error> {
    sqlx::query_as::<_, Curriculum>(
        "INSERT INTO curriculums (lecture_id, title, position) \
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(lecture_id)
    .bind(title)
    .bind(position)
    .fetch_one(pool)
    .await
}

pub async fn create_section(
    pool: &PgPool,
    curriculum_id: i64,
    title: &str,
    position: i32,
) -> Result<CurriculumSection, sqlx::Error> {
    sqlx::query_as::<_, CurriculumSection>(
        "INSERT INTO curriculum_sections (curriculum_id, title, position) \
         VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(curriculum_id)
    .bind(title)
    .bind(position)
    .fetch_one(pool)
    .await
}

/// Delete a curriculum and every descendant section, video, and file as one
/// transaction. Children go first to satisfy the FK constraints; the commit
/// makes the cascade all-or-nothing.
pub async fn delete_curriculum(pool: &PgPool, curriculum_id: i64) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "DELETE FROM videos WHERE section_id IN (\
             SELECT id FROM curriculum_sections WHERE curriculum_id = $1)",
    )
    .bind(curriculum_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "DELETE FROM files WHERE section_id IN (\
             SELECT id FROM curriculum_sections WHERE curriculum_id = $1)",
    )
    .bind(curriculum_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query("DELETE FROM curriculum_sections WHERE curriculum_id = $1")
        .bind(curriculum_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM curriculums WHERE id = $1")
        .bind(curriculum_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(curriculum_id, "curriculum deleted with descendants");
    Ok(())
}

/// Same shape one level down: a section takes its videos and files with it.
pub async fn delete_section(pool: &PgPool, section_id: i64) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM videos WHERE section_id = $1")
        .bind(section_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM files WHERE section_id = $1")
        .bind(section_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM curriculum_sections WHERE id = $1")
        .bind(section_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    info!(section_id, "section deleted with descendants");
    Ok(())
}

/// Curriculum outline for the catalog detail page.
#[derive(Debug, serde::Serialize)]
pub struct CurriculumOutline {
    #[serde(flatten)]
    pub curriculum: Curriculum,
    pub sections: Vec<SectionOutline>,
}

#[derive(Debug, serde::Serialize)]
pub struct SectionOutline {
    #[serde(flatten)]
    pub section: CurriculumSection,
    pub videos: Vec<Video>,
    pub files: Vec<File>,
}

pub async fn outline(pool: &PgPool, lecture_id: i64) -> Result<Vec<CurriculumOutline>, sqlx::Error> {
    let curriculums = sqlx::query_as::<_, Curriculum>(
        "SELECT * FROM curriculums WHERE lecture_id = $1 ORDER BY position, id",
    )
    .bind(lecture_id)
    .fetch_all(pool)
    .await?;

    let sections = sqlx::query_as::<_, CurriculumSection>(
        "SELECT s.* FROM curriculum_sections s \
         JOIN curriculums c ON c.id = s.curriculum_id \
         WHERE c.lecture_id = $1 ORDER BY s.position, s.id",
    )
    .bind(lecture_id)
    .fetch_all(pool)
    .await?;

    // Videos and files hang off the same section set; load them concurrently.
    let (videos, files) = futures::try_join!(
        sqlx::query_as::<_, Video>(
            "SELECT v.* FROM videos v \
             JOIN curriculum_sections s ON s.id = v.section_id \
             JOIN curriculums c ON c.id = s.curriculum_id \
             WHERE c.lecture_id = $1 ORDER BY v.position, v.id",
        )
        .bind(lecture_id)
        .fetch_all(pool),
        sqlx::query_as::<_, File>(
            "SELECT f.* FROM files f \
             JOIN curriculum_sections s ON s.id = f.section_id \
             JOIN curriculums c ON c.id = s.curriculum_id \
             WHERE c.lecture_id = $1 ORDER BY f.position, f.id",
        )
        .bind(lecture_id)
        .fetch_all(pool),
    )?;

    Ok(assemble_outline(curriculums, sections, videos, files))
}

/// Group the flat child rows under their parents, preserving row order.
fn assemble_outline(
    curriculums: Vec<Curriculum>,
    sections: Vec<CurriculumSection>,
    videos: Vec<Video>,
    files: Vec<File>,
) -> Vec<CurriculumOutline> {
    let mut outlines: Vec<CurriculumOutline> = curriculums
        .into_iter()
        .map(|curriculum| CurriculumOutline {
            curriculum,
            sections: Vec::new(),
        })
        .collect();

    for section in sections {
        if let Some(outline) = outlines
            .iter_mut()
            .find(|o| o.curriculum.id == section.curriculum_id)
        {
            outline.sections.push(SectionOutline {
                section,
                videos: Vec::new(),
                files: Vec::new(),
            });
        }
    }

    for video in videos {
        if let Some(section) = outlines
            .iter_mut()
            .flat_map(|o| o.sections.iter_mut())
            .find(|s| s.section.id == video.section_id)
        {
            section.videos.push(video);
        }
    }

    for file in files {
        if let Some(section) = outlines
            .iter_mut()
            .flat_map(|o| o.sections.iter_mut())
            .find(|s| s.section.id == file.section_id)
        {
            section.files.push(file);
        }
    }

    outlines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curriculum(id: i64, lecture_id: i64) -> Curriculum {
        Curriculum {
            id,
            lecture_id,
            title: format!("c{id}"),
            position: 0,
        }
    }

    fn section(id: i64, curriculum_id: i64) -> CurriculumSection {
        CurriculumSection {
            id,
            curriculum_id,
            title: format!("s{id}"),
            position: 0,
        }
    }

    fn video(id: i64, section_id: i64) -> Video {
        Video {
            id,
            section_id,
            title: format!("v{id}"),
            storage_key: format!("videos/{id}"),
            duration_secs: 60,
            position: 0,
        }
    }

    fn file(id: i64, section_id: i64) -> File {
        File {
            id,
            section_id,
            name: format!("f{id}"),
            storage_key: format!("files/{id}"),
            size_bytes: 1024,
            position: 0,
        }
    }

    #[test]
    fn children_land_under_their_parents() {
        let outlines = assemble_outline(
            vec![curriculum(1, 10), curriculum(2, 10)],
            vec![section(20, 1), section(21, 2)],
            vec![video(30, 20), video(31, 21)],
            vec![file(40, 21)],
        );

        assert_eq!(outlines.len(), 2);
        assert_eq!(outlines[0].sections.len(), 1);
        assert_eq!(outlines[0].sections[0].videos.len(), 1);
        assert_eq!(outlines[0].sections[0].files.len(), 0);
        assert_eq!(outlines[1].sections[0].videos[0].id, 31);
        assert_eq!(outlines[1].sections[0].files[0].id, 40);
    }

    #[test]
    fn orphan_rows_are_dropped_not_misfiled() {
        let outlines = assemble_outline(
            vec![curriculum(1, 10)],
            vec![section(20, 1)],
            vec![video(30, 99)],
            vec![],
        );
        assert!(outlines[0].sections[0].videos.is_empty());
    }
}
