use chrono::{DateTime, Utc};
use pathway_core::model::{Course, CourseId, PathCourseLink, PathId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{course_id_from_i64, id_to_i64, map_course_row, map_link_row, ser};
use crate::repository::{CourseRepository, NewCourseRecord, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl SqliteRepository {
    async fn tags_for_course(&self, course_id: i64) -> Result<Vec<String>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT tag FROM course_tags
            WHERE course_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(course_id)
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let mut tags = Vec::with_capacity(rows.len());
        for row in rows {
            tags.push(row.try_get::<String, _>("tag").map_err(ser)?);
        }
        Ok(tags)
    }
}

#[async_trait::async_trait]
impl CourseRepository for SqliteRepository {
    async fn create_course_in_path(
        &self,
        path_id: PathId,
        course: NewCourseRecord,
    ) -> Result<CourseId, StorageError> {
        let path_id = id_to_i64("path_id", path_id.value())?;

        // Course row, tags, and path link commit together: a failure in the
        // link step must not leave an orphan course behind.
        let mut tx = self.pool().begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT INTO courses (title, description, level, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(course.title)
        .bind(course.description)
        .bind(course.level.map(|l| l.as_str()))
        .bind(course.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let course_row_id = res.last_insert_rowid();

        for (position, tag) in course.tags.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO course_tags (course_id, position, tag)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(course_row_id)
            .bind(i64::try_from(position).map_err(ser)?)
            .bind(tag)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        sqlx::query(
            r"
            INSERT INTO path_courses (path_id, course_id, order_index, created_at)
            SELECT ?1, ?2, COALESCE(MAX(order_index) + 1, 0), ?3
            FROM path_courses WHERE path_id = ?1
            ",
        )
        .bind(path_id)
        .bind(course_row_id)
        .bind(course.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;
        course_id_from_i64(course_row_id)
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        let course_id = id_to_i64("course_id", id.value())?;
        let row = sqlx::query(
            r"
            SELECT id, title, description, level, created_at
            FROM courses WHERE id = ?1
            ",
        )
        .bind(course_id)
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        match row {
            Some(row) => {
                let tags = self.tags_for_course(course_id).await?;
                map_course_row(&row, tags).map(Some)
            }
            None => Ok(None),
        }
    }

    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        let course_id = id_to_i64("course_id", course.id().value())?;

        let mut tx = self.pool().begin().await.map_err(conn)?;

        sqlx::query(
            r"
            INSERT INTO courses (id, title, description, level, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                level = excluded.level
            ",
        )
        .bind(course_id)
        .bind(course.title())
        .bind(course.description())
        .bind(course.meta().level().map(|l| l.as_str()))
        .bind(course.created_at())
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        sqlx::query("DELETE FROM course_tags WHERE course_id = ?1")
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, tag) in course.meta().tags().iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO course_tags (course_id, position, tag)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(course_id)
            .bind(i64::try_from(position).map_err(ser)?)
            .bind(tag)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn courses_for_path(&self, path_id: PathId) -> Result<Vec<Course>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT c.id, c.title, c.description, c.level, c.created_at
            FROM path_courses pc
            JOIN courses c ON c.id = pc.course_id
            WHERE pc.path_id = ?1
            ORDER BY pc.order_index ASC, pc.created_at ASC
            ",
        )
        .bind(id_to_i64("path_id", path_id.value())?)
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let mut courses = Vec::with_capacity(rows.len());
        for row in rows {
            let course_id: i64 = row.try_get("id").map_err(ser)?;
            let tags = self.tags_for_course(course_id).await?;
            courses.push(map_course_row(&row, tags)?);
        }
        Ok(courses)
    }

    async fn links_for_path(&self, path_id: PathId) -> Result<Vec<PathCourseLink>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT path_id, course_id, order_index, created_at
            FROM path_courses
            WHERE path_id = ?1
            ORDER BY order_index ASC, created_at ASC
            ",
        )
        .bind(id_to_i64("path_id", path_id.value())?)
        .fetch_all(self.pool())
        .await
        .map_err(conn)?;

        let mut links = Vec::with_capacity(rows.len());
        for row in rows {
            links.push(map_link_row(&row)?);
        }
        Ok(links)
    }

    async fn link_course_to_path(
        &self,
        path_id: PathId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let path_id = id_to_i64("path_id", path_id.value())?;
        let course_id = id_to_i64("course_id", course_id.value())?;

        let mut tx = self.pool().begin().await.map_err(conn)?;

        let res = sqlx::query(
            r"
            INSERT OR IGNORE INTO path_courses (path_id, course_id, order_index, created_at)
            SELECT ?1, ?2, COALESCE(MAX(order_index) + 1, 0), ?3
            FROM path_courses WHERE path_id = ?1
            ",
        )
        .bind(path_id)
        .bind(course_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            tx.rollback().await.map_err(conn)?;
            return Err(StorageError::Conflict);
        }

        let row = sqlx::query(
            r"
            SELECT order_index FROM path_courses
            WHERE path_id = ?1 AND course_id = ?2
            ",
        )
        .bind(path_id)
        .bind(course_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(conn)?;

        tx.commit().await.map_err(conn)?;

        let order_index: i64 = row.try_get("order_index").map_err(ser)?;
        u32::try_from(order_index)
            .map_err(|_| StorageError::Serialization(format!("invalid order_index: {order_index}")))
    }

    async fn first_link_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Option<PathCourseLink>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT path_id, course_id, order_index, created_at
            FROM path_courses
            WHERE course_id = ?1
            ORDER BY order_index ASC, created_at ASC
            LIMIT 1
            ",
        )
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_optional(self.pool())
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_link_row(&row).map(Some),
            None => Ok(None),
        }
    }
}
