use pathway_core::model::{
    CourseId, CourseLevel, CourseProgress, Lesson, LessonId, LessonKind, LessonMeta, LessonStatus,
    Note, Path, PathCourseLink, PathId, Progress, UserId,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn path_id_from_i64(v: i64) -> Result<PathId, StorageError> {
    Ok(PathId::new(i64_to_u64("path_id", v)?))
}

pub(crate) fn course_id_from_i64(v: i64) -> Result<CourseId, StorageError> {
    Ok(CourseId::new(i64_to_u64("course_id", v)?))
}

pub(crate) fn lesson_id_from_i64(v: i64) -> Result<LessonId, StorageError> {
    Ok(LessonId::new(i64_to_u64("lesson_id", v)?))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn user_id_from_str(s: &str) -> Result<UserId, StorageError> {
    s.parse::<UserId>().map_err(ser)
}

fn order_index_from_i64(v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid order_index: {v}")))
}

pub(crate) fn map_path_row(row: &SqliteRow) -> Result<Path, StorageError> {
    Path::new(
        path_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        user_id_from_str(row.try_get::<String, _>("user_id").map_err(ser)?.as_str())?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

/// Maps a course row; `tags` are fetched separately from `course_tags`.
pub(crate) fn map_course_row(
    row: &SqliteRow,
    tags: Vec<String>,
) -> Result<pathway_core::model::Course, StorageError> {
    let level = row
        .try_get::<Option<String>, _>("level")
        .map_err(ser)?
        .map(|s| CourseLevel::parse(&s))
        .transpose()
        .map_err(ser)?;

    pathway_core::model::Course::new(
        course_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        row.try_get::<Option<String>, _>("description").map_err(ser)?,
        pathway_core::model::CourseMeta::new(level, tags),
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_link_row(row: &SqliteRow) -> Result<PathCourseLink, StorageError> {
    Ok(PathCourseLink {
        path_id: path_id_from_i64(row.try_get::<i64, _>("path_id").map_err(ser)?)?,
        course_id: course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        order_index: order_index_from_i64(row.try_get::<i64, _>("order_index").map_err(ser)?)?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}

pub(crate) fn map_lesson_row(row: &SqliteRow) -> Result<Lesson, StorageError> {
    let kind_str: String = row.try_get("kind").map_err(ser)?;
    let kind = LessonKind::parse(&kind_str).map_err(ser)?;

    let source_str: String = row.try_get("source").map_err(ser)?;
    let source = url::Url::parse(&source_str).map_err(ser)?;

    let duration_secs = row
        .try_get::<Option<i64>, _>("duration_secs")
        .map_err(ser)?
        .map(|v| {
            u32::try_from(v)
                .map_err(|_| StorageError::Serialization(format!("invalid duration_secs: {v}")))
        })
        .transpose()?;

    Lesson::new(
        lesson_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        row.try_get::<String, _>("title").map_err(ser)?,
        kind,
        source,
        order_index_from_i64(row.try_get::<i64, _>("order_index").map_err(ser)?)?,
        LessonMeta {
            duration_secs,
            thumbnail: row.try_get::<Option<String>, _>("thumbnail").map_err(ser)?,
        },
        row.try_get("created_at").map_err(ser)?,
    )
    .map_err(ser)
}

pub(crate) fn map_progress_row(row: &SqliteRow) -> Result<Progress, StorageError> {
    let status_str: String = row.try_get("status").map_err(ser)?;
    let last_position_secs = row
        .try_get::<Option<i64>, _>("last_position_secs")
        .map_err(ser)?
        .map(|v| {
            u32::try_from(v).map_err(|_| {
                StorageError::Serialization(format!("invalid last_position_secs: {v}"))
            })
        })
        .transpose()?;

    Ok(Progress {
        user_id: user_id_from_str(row.try_get::<String, _>("user_id").map_err(ser)?.as_str())?,
        lesson_id: lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?,
        status: LessonStatus::parse(&status_str).map_err(ser)?,
        last_position_secs,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn map_course_progress_row(row: &SqliteRow) -> Result<CourseProgress, StorageError> {
    Ok(CourseProgress {
        user_id: user_id_from_str(row.try_get::<String, _>("user_id").map_err(ser)?.as_str())?,
        course_id: course_id_from_i64(row.try_get::<i64, _>("course_id").map_err(ser)?)?,
        last_lesson_id: lesson_id_from_i64(row.try_get::<i64, _>("last_lesson_id").map_err(ser)?)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}

pub(crate) fn map_note_row(row: &SqliteRow) -> Result<Note, StorageError> {
    Ok(Note {
        user_id: user_id_from_str(row.try_get::<String, _>("user_id").map_err(ser)?.as_str())?,
        lesson_id: lesson_id_from_i64(row.try_get::<i64, _>("lesson_id").map_err(ser)?)?,
        content: row.try_get("content").map_err(ser)?,
        created_at: row.try_get("created_at").map_err(ser)?,
        updated_at: row.try_get("updated_at").map_err(ser)?,
    })
}
