use std::sync::Arc;

use pathway_core::model::{Path, PathId};
use storage::repository::{NewPathRecord, PathRepository};

use crate::Clock;
use crate::Session;
use crate::error::PathServiceError;

/// Partial update for a path. `None` keeps the stored value; a
/// whitespace-only description clears it.
#[derive(Debug, Clone, Default)]
pub struct PathUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Orchestrates path creation and persistence.
#[derive(Clone)]
pub struct PathService {
    clock: Clock,
    paths: Arc<dyn PathRepository>,
}

impl PathService {
    #[must_use]
    pub fn new(clock: Clock, paths: Arc<dyn PathRepository>) -> Self {
        Self { clock, paths }
    }

    /// Create a new path owned by the session user and persist it.
    ///
    /// # Errors
    ///
    /// Returns `PathServiceError::Unauthenticated` for an anonymous session.
    /// Returns `PathServiceError::Path` for validation failures.
    /// Returns `PathServiceError::Storage` if persistence fails.
    pub async fn create_path(
        &self,
        session: Session,
        title: String,
        description: Option<String>,
    ) -> Result<PathId, PathServiceError> {
        let owner = session.user_id().ok_or(PathServiceError::Unauthenticated)?;
        let now = self.clock.now();
        let draft = Path::new(PathId::new(1), owner, title, description, now)?;
        let path_id = self
            .paths
            .insert_new_path(NewPathRecord::from_path(&draft))
            .await?;
        Ok(path_id)
    }

    /// Fetch a path by ID.
    ///
    /// Returns `Ok(None)` when the path does not exist.
    ///
    /// # Errors
    ///
    /// Returns `PathServiceError::Storage` if repository access fails.
    pub async fn get_path(&self, path_id: PathId) -> Result<Option<Path>, PathServiceError> {
        let path = self.paths.get_path(path_id).await?;
        Ok(path)
    }

    /// List the session user's paths, newest first. Anonymous sessions
    /// see an empty list.
    ///
    /// # Errors
    ///
    /// Returns `PathServiceError::Storage` if repository access fails.
    pub async fn list_paths(&self, session: Session) -> Result<Vec<Path>, PathServiceError> {
        let Some(user) = session.user_id() else {
            return Ok(Vec::new());
        };
        let paths = self.paths.list_paths_for_user(user).await?;
        Ok(paths)
    }

    /// Apply a partial update, keeping owner and creation time.
    ///
    /// # Errors
    ///
    /// Returns `PathServiceError::Path` if validation fails.
    /// Returns `PathServiceError::Storage` if repository access fails,
    /// including `StorageError::NotFound` for a missing path.
    pub async fn update_path(
        &self,
        path_id: PathId,
        update: PathUpdate,
    ) -> Result<(), PathServiceError> {
        let path = self
            .paths
            .get_path(path_id)
            .await?
            .ok_or(storage::repository::StorageError::NotFound)?;

        let title = update.title.unwrap_or_else(|| path.title().to_owned());
        let description = match update.description {
            Some(description) => Some(description),
            None => path.description().map(str::to_owned),
        };

        let updated = Path::new(path.id(), path.owner(), title, description, path.created_at())?;
        self.paths.upsert_path(&updated).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pathway_core::model::UserId;
    use pathway_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn service(repo: InMemoryRepository) -> PathService {
        PathService::new(fixed_clock(), Arc::new(repo))
    }

    #[tokio::test]
    async fn create_path_requires_a_user() {
        let service = service(InMemoryRepository::new());
        let err = service
            .create_path(Session::Anonymous, "Rust".into(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, PathServiceError::Unauthenticated));
    }

    #[tokio::test]
    async fn list_paths_is_scoped_to_the_session_user() {
        let repo = InMemoryRepository::new();
        let service = service(repo);
        let alice = UserId::random();
        let bob = UserId::random();

        service
            .create_path(Session::User(alice), "Rust".into(), None)
            .await
            .unwrap();

        let mine = service.list_paths(Session::User(alice)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].title(), "Rust");

        assert!(service.list_paths(Session::User(bob)).await.unwrap().is_empty());
        assert!(service.list_paths(Session::Anonymous).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_path_applies_only_provided_fields() {
        let service = service(InMemoryRepository::new());
        let owner = UserId::random();
        let path_id = service
            .create_path(Session::User(owner), "Rust".into(), Some("notes".into()))
            .await
            .unwrap();

        service
            .update_path(
                path_id,
                PathUpdate {
                    title: Some("Rust 2024".into()),
                    description: None,
                },
            )
            .await
            .unwrap();

        let path = service.get_path(path_id).await.unwrap().unwrap();
        assert_eq!(path.title(), "Rust 2024");
        assert_eq!(path.description(), Some("notes"));
        assert_eq!(path.owner(), owner);
        assert_eq!(path.created_at(), fixed_now());
    }

    #[tokio::test]
    async fn blank_description_clears_the_stored_value() {
        let service = service(InMemoryRepository::new());
        let owner = UserId::random();
        let path_id = service
            .create_path(Session::User(owner), "Rust".into(), Some("notes".into()))
            .await
            .unwrap();

        service
            .update_path(
                path_id,
                PathUpdate {
                    title: None,
                    description: Some("   ".into()),
                },
            )
            .await
            .unwrap();

        let path = service.get_path(path_id).await.unwrap().unwrap();
        assert_eq!(path.description(), None);
    }

    #[tokio::test]
    async fn update_of_missing_path_is_not_found() {
        let service = service(InMemoryRepository::new());
        let err = service
            .update_path(PathId::new(404), PathUpdate::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PathServiceError::Storage(storage::repository::StorageError::NotFound)
        ));
    }
}
