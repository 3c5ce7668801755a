use pathway_core::model::{Path, PathId, UserId};

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_path_row, path_id_from_i64};
use crate::repository::{NewPathRecord, PathRepository, StorageError};

#[async_trait::async_trait]
impl PathRepository for SqliteRepository {
    async fn insert_new_path(&self, path: NewPathRecord) -> Result<PathId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO paths (user_id, title, description, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(path.owner.to_string())
        .bind(path.title)
        .bind(path.description)
        .bind(path.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        path_id_from_i64(res.last_insert_rowid())
    }

    async fn get_path(&self, id: PathId) -> Result<Option<Path>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, title, description, created_at
            FROM paths WHERE id = ?1
            ",
        )
        .bind(id_to_i64("path_id", id.value())?)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_path_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn upsert_path(&self, path: &Path) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO paths (id, user_id, title, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description
            ",
        )
        .bind(id_to_i64("path_id", path.id().value())?)
        .bind(path.owner().to_string())
        .bind(path.title())
        .bind(path.description())
        .bind(path.created_at())
        .execute(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn list_paths_for_user(&self, user: UserId) -> Result<Vec<Path>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, title, description, created_at
            FROM paths
            WHERE user_id = ?1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user.to_string())
        .fetch_all(self.pool())
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut paths = Vec::with_capacity(rows.len());
        for row in rows {
            paths.push(map_path_row(&row)?);
        }
        Ok(paths)
    }
}
