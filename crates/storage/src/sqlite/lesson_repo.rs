use pathway_core::model::{CourseId, Lesson, LessonId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{id_to_i64, lesson_id_from_i64, map_lesson_row, ser};
use crate::repository::{LessonRepository, NewLessonRecord, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl LessonRepository for SqliteRepository {
    async fn insert_new_lesson(&self, lesson: NewLessonRecord) -> Result<LessonId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO lessons
                (course_id, title, kind, source, order_index, duration_secs, thumbnail, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )
        .bind(id_to_i64("course_id", lesson.course_id.value())?)
        .bind(lesson.title)
        .bind(lesson.kind.as_str())
        .bind(lesson.source.as_str())
        .bind(i64::from(lesson.order_index))
        .bind(lesson.duration_secs.map(i64::from))
        .bind(lesson.thumbnail)
        .bind(lesson.created_at)
        .execute(self.pool())
        .await
        .map_err(conn)?;

        lesson_id_from_i64(res.last_insert_rowid())
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, course_id, title, kind, source, order_index,
                   duration_secs, thumbnail, created_at
            FROM lessons WHERE id = ?1
            ",
        )
        .bind(id_to_i64("lesson_id", id.value())?)
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_lesson_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, course_id, title, kind, source, order_index,
                   duration_secs, thumbnail, created_at
            FROM lessons
            WHERE course_id = ?1
            ORDER BY order_index ASC, id ASC
            ",
        )
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let mut lessons = Vec::with_capacity(rows.len());
        for row in rows {
            lessons.push(map_lesson_row(&row)?);
        }
        Ok(lessons)
    }

    async fn lesson_count(&self, course_id: CourseId) -> Result<u32, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM lessons WHERE course_id = ?1")
            .bind(id_to_i64("course_id", course_id.value())?)
            .fetch_one(self.pool())
            .await
            .map_err(conn)?;

        let n: i64 = row.try_get("n").map_err(ser)?;
        u32::try_from(n).map_err(|_| StorageError::Serialization("lesson count overflow".into()))
    }

    async fn first_lesson(&self, course_id: CourseId) -> Result<Option<Lesson>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, course_id, title, kind, source, order_index,
                   duration_secs, thumbnail, created_at
            FROM lessons
            WHERE course_id = ?1
            ORDER BY order_index ASC, id ASC
            LIMIT 1
            ",
        )
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_lesson_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn lesson_ids_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> Result<Vec<LessonId>, StorageError> {
        let mut ids = Vec::new();
        for course_id in course_ids {
            let rows = sqlx::query("SELECT id FROM lessons WHERE course_id = ?1")
                .bind(id_to_i64("course_id", course_id.value())?)
                .fetch_all(self.pool())
                .await
                .map_err(conn)?;
            for row in rows {
                ids.push(lesson_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?);
            }
        }
        Ok(ids)
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM lessons WHERE id = ?1")
            .bind(id_to_i64("lesson_id", id.value())?)
            .execute(self.pool())
            .await
            .map_err(conn)?;
        Ok(())
    }
}
