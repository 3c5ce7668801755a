//! Shared error types for the services crate.

use thiserror::Error;

use pathway_core::model::{CourseError, LessonError, PathError};
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors emitted by `PathService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PathServiceError {
    #[error("a signed-in user is required")]
    Unauthenticated,
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CourseService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CourseServiceError {
    #[error(transparent)]
    Course(#[from] CourseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `LessonService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LessonServiceError {
    #[error(transparent)]
    Lesson(#[from] LessonError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("a signed-in user is required")]
    Unauthenticated,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `NavigationService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NavigationError {
    #[error("a signed-in user is required")]
    Unauthenticated,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `NoteService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NoteServiceError {
    #[error("a signed-in user is required")]
    Unauthenticated,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
