use chrono::{DateTime, Utc};
use pathway_core::model::{LessonId, Note, UserId};

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_note_row};
use crate::repository::{NoteRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl NoteRepository for SqliteRepository {
    async fn upsert_note(
        &self,
        user: UserId,
        lesson: LessonId,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Note, StorageError> {
        let user_str = user.to_string();
        let lesson_id = id_to_i64("lesson_id", lesson.value())?;

        // created_at only takes on the insert path; the conflict branch
        // keeps the original row's value.
        let row = sqlx::query(
            r"
            INSERT INTO notes (user_id, lesson_id, content, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            ON CONFLICT(user_id, lesson_id) DO UPDATE SET
                content = excluded.content,
                updated_at = excluded.updated_at
            RETURNING user_id, lesson_id, content, created_at, updated_at
            ",
        )
        .bind(&user_str)
        .bind(lesson_id)
        .bind(content)
        .bind(now)
        .fetch_one(self.pool())
        .await
        .map_err(conn)?;

        map_note_row(&row)
    }

    async fn get_note(
        &self,
        user: UserId,
        lesson: LessonId,
    ) -> Result<Option<Note>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT user_id, lesson_id, content, created_at, updated_at
            FROM notes
            WHERE user_id = ?1 AND lesson_id = ?2
            ",
        )
        .bind(user.to_string())
        .bind(id_to_i64("lesson_id", lesson.value())?)
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_note_row(&row).map(Some),
            None => Ok(None),
        }
    }
}
