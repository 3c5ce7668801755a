use std::sync::Arc;

use pathway_core::model::{CourseId, Lesson, LessonId, LessonKind, LessonMeta, LessonStatus};
use storage::repository::{LessonRepository, NewLessonRecord, ProgressRepository};

use crate::Clock;
use crate::Session;
use crate::error::LessonServiceError;

/// A lesson decorated with the session user's completion status.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonWithStatus {
    pub lesson: Lesson,
    pub status: LessonStatus,
}

/// Orchestrates lesson creation, ordering, and status decoration.
#[derive(Clone)]
pub struct LessonService {
    clock: Clock,
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl LessonService {
    #[must_use]
    pub fn new(
        clock: Clock,
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            lessons,
            progress,
        }
    }

    /// Append a lesson to a course. The order index is the course's
    /// current lesson count, so lessons land at the end in creation order.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Lesson` for an invalid title or source.
    /// Returns `LessonServiceError::Storage` if persistence fails.
    pub async fn add_lesson(
        &self,
        course_id: CourseId,
        title: String,
        kind: LessonKind,
        source: &str,
        meta: LessonMeta,
    ) -> Result<LessonId, LessonServiceError> {
        let now = self.clock.now();
        let order_index = self.lessons.lesson_count(course_id).await?;
        let draft = Lesson::from_raw_source(
            LessonId::new(1),
            course_id,
            title,
            kind,
            source,
            order_index,
            meta,
            now,
        )?;
        let lesson_id = self
            .lessons
            .insert_new_lesson(NewLessonRecord::from_lesson(&draft))
            .await?;
        Ok(lesson_id)
    }

    /// Fetch a lesson by ID.
    ///
    /// Returns `Ok(None)` when the lesson does not exist.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn get_lesson(&self, lesson_id: LessonId) -> Result<Option<Lesson>, LessonServiceError> {
        let lesson = self.lessons.get_lesson(lesson_id).await?;
        Ok(lesson)
    }

    /// Lessons of a course, ordered by order index with id as tiebreak.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn lessons_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<Lesson>, LessonServiceError> {
        let lessons = self.lessons.lessons_for_course(course_id).await?;
        Ok(lessons)
    }

    /// Delete a lesson. Deleting a missing lesson is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn delete_lesson(&self, lesson_id: LessonId) -> Result<(), LessonServiceError> {
        self.lessons.delete_lesson(lesson_id).await?;
        Ok(())
    }

    /// Lessons of a course with the session user's status attached.
    /// Lessons without a progress row, and every lesson for an anonymous
    /// session, read as not started.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn lessons_with_status(
        &self,
        session: Session,
        course_id: CourseId,
    ) -> Result<Vec<LessonWithStatus>, LessonServiceError> {
        let lessons = self.lessons.lessons_for_course(course_id).await?;

        let Some(user) = session.user_id() else {
            return Ok(lessons
                .into_iter()
                .map(|lesson| LessonWithStatus {
                    lesson,
                    status: LessonStatus::NotStarted,
                })
                .collect());
        };

        let ids: Vec<LessonId> = lessons.iter().map(Lesson::id).collect();
        let statuses = self.progress.statuses_for_lessons(user, &ids).await?;
        Ok(lessons
            .into_iter()
            .map(|lesson| {
                let status = statuses
                    .get(&lesson.id())
                    .copied()
                    .unwrap_or(LessonStatus::NotStarted);
                LessonWithStatus { lesson, status }
            })
            .collect())
    }

    /// A single lesson with the session user's status, if it exists.
    ///
    /// # Errors
    ///
    /// Returns `LessonServiceError::Storage` if repository access fails.
    pub async fn lesson_with_status(
        &self,
        session: Session,
        lesson_id: LessonId,
    ) -> Result<Option<LessonWithStatus>, LessonServiceError> {
        let Some(lesson) = self.lessons.get_lesson(lesson_id).await? else {
            return Ok(None);
        };

        let status = match session.user_id() {
            Some(user) => self
                .progress
                .get_progress(user, lesson_id)
                .await?
                .map(|p| p.status)
                .unwrap_or_default(),
            None => LessonStatus::NotStarted,
        };

        Ok(Some(LessonWithStatus { lesson, status }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pathway_core::model::UserId;
    use pathway_core::time::{fixed_clock, fixed_now};
    use storage::repository::{
        CourseRepository, InMemoryRepository, NewCourseRecord, NewPathRecord, PathRepository,
    };

    const VIDEO: &str = "https://youtu.be/dQw4w9WgXcQ";

    async fn seeded_course(repo: &InMemoryRepository) -> CourseId {
        let path_id = repo
            .insert_new_path(NewPathRecord {
                owner: UserId::random(),
                title: "Rust".into(),
                description: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        repo.create_course_in_path(
            path_id,
            NewCourseRecord {
                title: "A".into(),
                description: None,
                level: None,
                tags: Vec::new(),
                created_at: fixed_now(),
            },
        )
        .await
        .unwrap()
    }

    fn service(repo: InMemoryRepository) -> LessonService {
        let repo = Arc::new(repo);
        LessonService::new(fixed_clock(), repo.clone(), repo)
    }

    #[tokio::test]
    async fn added_lessons_take_sequential_order_indexes() {
        let repo = InMemoryRepository::new();
        let course_id = seeded_course(&repo).await;
        let service = service(repo);

        let first = service
            .add_lesson(course_id, "One".into(), LessonKind::Video, VIDEO, LessonMeta::default())
            .await
            .unwrap();
        let second = service
            .add_lesson(course_id, "Two".into(), LessonKind::Video, VIDEO, LessonMeta::default())
            .await
            .unwrap();

        let lessons = service.lessons_for_course(course_id).await.unwrap();
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].id(), first);
        assert_eq!(lessons[0].order_index(), 0);
        assert_eq!(lessons[1].id(), second);
        assert_eq!(lessons[1].order_index(), 1);
    }

    #[tokio::test]
    async fn add_lesson_rejects_a_bad_source() {
        let repo = InMemoryRepository::new();
        let course_id = seeded_course(&repo).await;
        let service = service(repo);

        let err = service
            .add_lesson(
                course_id,
                "One".into(),
                LessonKind::Link,
                "not a url",
                LessonMeta::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LessonServiceError::Lesson(_)));
    }

    #[tokio::test]
    async fn statuses_default_to_not_started() {
        let repo = InMemoryRepository::new();
        let course_id = seeded_course(&repo).await;
        let user = UserId::random();
        let service = service(repo.clone());

        let started = service
            .add_lesson(course_id, "One".into(), LessonKind::Video, VIDEO, LessonMeta::default())
            .await
            .unwrap();
        service
            .add_lesson(course_id, "Two".into(), LessonKind::Video, VIDEO, LessonMeta::default())
            .await
            .unwrap();

        repo.record_position(user, started, 12, fixed_now())
            .await
            .unwrap();

        let decorated = service
            .lessons_with_status(Session::User(user), course_id)
            .await
            .unwrap();
        assert_eq!(decorated[0].status, LessonStatus::InProgress);
        assert_eq!(decorated[1].status, LessonStatus::NotStarted);

        let anonymous = service
            .lessons_with_status(Session::Anonymous, course_id)
            .await
            .unwrap();
        assert!(anonymous.iter().all(|l| l.status == LessonStatus::NotStarted));

        let single = service
            .lesson_with_status(Session::User(user), started)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(single.status, LessonStatus::InProgress);
    }
}
