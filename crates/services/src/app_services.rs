use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::course_service::CourseService;
use crate::error::AppServicesError;
use crate::lesson_service::LessonService;
use crate::navigation::NavigationService;
use crate::note_service::NoteService;
use crate::path_service::PathService;
use crate::progress_service::ProgressService;

/// Assembles the app-facing services over a storage handle.
#[derive(Clone)]
pub struct AppServices {
    paths: Arc<PathService>,
    courses: Arc<CourseService>,
    lessons: Arc<LessonService>,
    navigation: Arc<NavigationService>,
    progress: Arc<ProgressService>,
    notes: Arc<NoteService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock))
    }

    /// Build services over an existing storage handle (in-memory in tests).
    #[must_use]
    pub fn from_storage(storage: &Storage, clock: Clock) -> Self {
        let paths = Arc::new(PathService::new(clock, Arc::clone(&storage.paths)));
        let courses = Arc::new(CourseService::new(clock, Arc::clone(&storage.courses)));
        let lessons = Arc::new(LessonService::new(
            clock,
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.progress),
        ));
        let navigation = Arc::new(NavigationService::new(
            clock,
            Arc::clone(&storage.paths),
            Arc::clone(&storage.courses),
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.course_progress),
        ));
        let progress = Arc::new(ProgressService::new(
            clock,
            Arc::clone(&storage.courses),
            Arc::clone(&storage.lessons),
            Arc::clone(&storage.progress),
        ));
        let notes = Arc::new(NoteService::new(clock, Arc::clone(&storage.notes)));

        Self {
            paths,
            courses,
            lessons,
            navigation,
            progress,
            notes,
        }
    }

    #[must_use]
    pub fn paths(&self) -> Arc<PathService> {
        Arc::clone(&self.paths)
    }

    #[must_use]
    pub fn courses(&self) -> Arc<CourseService> {
        Arc::clone(&self.courses)
    }

    #[must_use]
    pub fn lessons(&self) -> Arc<LessonService> {
        Arc::clone(&self.lessons)
    }

    #[must_use]
    pub fn navigation(&self) -> Arc<NavigationService> {
        Arc::clone(&self.navigation)
    }

    #[must_use]
    pub fn progress(&self) -> Arc<ProgressService> {
        Arc::clone(&self.progress)
    }

    #[must_use]
    pub fn notes(&self) -> Arc<NoteService> {
        Arc::clone(&self.notes)
    }
}
