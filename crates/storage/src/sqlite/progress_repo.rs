use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pathway_core::model::{CourseId, CourseProgress, LessonId, LessonStatus, Progress, UserId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_course_progress_row, map_progress_row, ser};
use crate::repository::{CourseProgressRepository, ProgressRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl ProgressRepository for SqliteRepository {
    async fn set_status(
        &self,
        user: UserId,
        lesson: LessonId,
        status: LessonStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        // Single upsert so concurrent writers never race a read-then-insert.
        sqlx::query(
            r"
            INSERT INTO progress (user_id, lesson_id, status, last_position_secs, updated_at)
            VALUES (?1, ?2, ?3, NULL, ?4)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                status = excluded.status,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user.to_string())
        .bind(id_to_i64("lesson_id", lesson.value())?)
        .bind(status.as_str())
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn record_position(
        &self,
        user: UserId,
        lesson: LessonId,
        position_secs: u32,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO progress (user_id, lesson_id, status, last_position_secs, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                status = excluded.status,
                last_position_secs = excluded.last_position_secs,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user.to_string())
        .bind(id_to_i64("lesson_id", lesson.value())?)
        .bind(LessonStatus::InProgress.as_str())
        .bind(i64::from(position_secs))
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_progress(
        &self,
        user: UserId,
        lesson: LessonId,
    ) -> Result<Option<Progress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, lesson_id, status, last_position_secs, updated_at
            FROM progress
            WHERE user_id = ?1 AND lesson_id = ?2
            ",
        )
        .bind(user.to_string())
        .bind(id_to_i64("lesson_id", lesson.value())?)
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_progress_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn completed_count(
        &self,
        user: UserId,
        lesson_ids: &[LessonId],
    ) -> Result<u32, StorageError> {
        let statuses = self.statuses_for_lessons(user, lesson_ids).await?;
        let count = statuses
            .values()
            .filter(|s| **s == LessonStatus::Completed)
            .count();
        u32::try_from(count)
            .map_err(|_| StorageError::Serialization("completed count overflow".into()))
    }

    async fn statuses_for_lessons(
        &self,
        user: UserId,
        lesson_ids: &[LessonId],
    ) -> Result<HashMap<LessonId, LessonStatus>, StorageError> {
        let mut out = HashMap::with_capacity(lesson_ids.len());
        let user = user.to_string();
        for lesson_id in lesson_ids {
            let row = sqlx::query(
                r"
                SELECT status FROM progress
                WHERE user_id = ?1 AND lesson_id = ?2
                ",
            )
            .bind(&user)
            .bind(id_to_i64("lesson_id", lesson_id.value())?)
            .fetch_optional(self.pool())
            .await
            .map_err(conn)?;

            if let Some(row) = row {
                let status_str: String = row.try_get("status").map_err(ser)?;
                out.insert(*lesson_id, LessonStatus::parse(&status_str).map_err(ser)?);
            }
        }
        Ok(out)
    }
}

#[async_trait::async_trait]
impl CourseProgressRepository for SqliteRepository {
    async fn upsert_last_visited(
        &self,
        user: UserId,
        course: CourseId,
        lesson: LessonId,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO course_progress (user_id, course_id, last_lesson_id, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(user_id, course_id) DO UPDATE SET
                last_lesson_id = excluded.last_lesson_id,
                updated_at = excluded.updated_at
            ",
        )
        .bind(user.to_string())
        .bind(id_to_i64("course_id", course.value())?)
        .bind(id_to_i64("lesson_id", lesson.value())?)
        .bind(now)
        .execute(self.pool())
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get_course_progress(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<CourseProgress>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, course_id, last_lesson_id, updated_at
            FROM course_progress
            WHERE user_id = ?1 AND course_id = ?2
            ",
        )
        .bind(user.to_string())
        .bind(id_to_i64("course_id", course.value())?)
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_course_progress_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<CourseProgress>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT user_id, course_id, last_lesson_id, updated_at
            FROM course_progress
            WHERE user_id = ?1
            ORDER BY updated_at DESC
            ",
        )
        .bind(user.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_course_progress_row(&row)?);
        }
        Ok(out)
    }
}
