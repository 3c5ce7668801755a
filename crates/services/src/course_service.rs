use std::sync::Arc;

use pathway_core::model::{Course, CourseId, CourseMeta, PathCourseLink, PathId};
use storage::repository::{CourseRepository, NewCourseRecord};

use crate::Clock;
use crate::error::CourseServiceError;

/// Orchestrates course creation and path linkage.
#[derive(Clone)]
pub struct CourseService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
}

impl CourseService {
    #[must_use]
    pub fn new(clock: Clock, courses: Arc<dyn CourseRepository>) -> Self {
        Self { clock, courses }
    }

    /// Create a course and link it into a path as one unit of work; the
    /// link takes the next order index in that path.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` for validation failures.
    /// Returns `CourseServiceError::Storage` if persistence fails; in that
    /// case neither the course nor the link exists.
    pub async fn create_course_in_path(
        &self,
        path_id: PathId,
        title: String,
        description: Option<String>,
        meta: CourseMeta,
    ) -> Result<CourseId, CourseServiceError> {
        let now = self.clock.now();
        let draft = Course::new(CourseId::new(1), title, description, meta, now)?;
        let course_id = self
            .courses
            .create_course_in_path(path_id, NewCourseRecord::from_course(&draft))
            .await?;
        Ok(course_id)
    }

    /// Fetch a course by ID.
    ///
    /// Returns `Ok(None)` when the course does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn get_course(&self, course_id: CourseId) -> Result<Option<Course>, CourseServiceError> {
        let course = self.courses.get_course(course_id).await?;
        Ok(course)
    }

    /// Update title, description, and metadata, keeping creation time.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Course` if validation fails.
    /// Returns `CourseServiceError::Storage` if repository access fails,
    /// including `StorageError::NotFound` for a missing course.
    pub async fn update_course(
        &self,
        course_id: CourseId,
        title: String,
        description: Option<String>,
        meta: CourseMeta,
    ) -> Result<(), CourseServiceError> {
        let course = self
            .courses
            .get_course(course_id)
            .await?
            .ok_or(storage::repository::StorageError::NotFound)?;

        let updated = Course::new(course.id(), title, description, meta, course.created_at())?;
        self.courses.upsert_course(&updated).await?;
        Ok(())
    }

    /// Courses linked to a path, in link order.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn courses_for_path(
        &self,
        path_id: PathId,
    ) -> Result<Vec<Course>, CourseServiceError> {
        let courses = self.courses.courses_for_path(path_id).await?;
        Ok(courses)
    }

    /// Links of a path, in the same order as `courses_for_path`.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` if repository access fails.
    pub async fn links_for_path(
        &self,
        path_id: PathId,
    ) -> Result<Vec<PathCourseLink>, CourseServiceError> {
        let links = self.courses.links_for_path(path_id).await?;
        Ok(links)
    }

    /// Attach an existing course to another path; returns the assigned
    /// order index. A course may belong to any number of paths, but at
    /// most once per path.
    ///
    /// # Errors
    ///
    /// Returns `CourseServiceError::Storage` with `StorageError::Conflict`
    /// if the link already exists.
    pub async fn link_course_to_path(
        &self,
        path_id: PathId,
        course_id: CourseId,
    ) -> Result<u32, CourseServiceError> {
        let now = self.clock.now();
        let index = self
            .courses
            .link_course_to_path(path_id, course_id, now)
            .await?;
        Ok(index)
    }
}
