use std::sync::Arc;

use futures::future::try_join_all;
use pathway_core::model::{
    CourseId, CourseStats, LessonId, LessonStatus, PathId, completion_percent,
};
use storage::repository::{CourseRepository, LessonRepository, ProgressRepository};

use crate::Clock;
use crate::Session;
use crate::error::ProgressServiceError;

/// Aggregates per-lesson progress into course and path level numbers.
///
/// Every read is scoped to the session user; anonymous sessions see
/// zero completion everywhere.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(
        clock: Clock,
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            courses,
            lessons,
            progress,
        }
    }

    /// Set the session user's status for a lesson. Any status can be set
    /// from any status; a stored playback position survives the change.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Unauthenticated` for an anonymous
    /// session, or `Storage` if the upsert fails.
    pub async fn set_lesson_status(
        &self,
        session: Session,
        lesson_id: LessonId,
        status: LessonStatus,
    ) -> Result<(), ProgressServiceError> {
        let user = session
            .user_id()
            .ok_or(ProgressServiceError::Unauthenticated)?;
        let now = self.clock.now();
        self.progress.set_status(user, lesson_id, status, now).await?;
        Ok(())
    }

    /// Record a playback position, floored to whole seconds. Recording a
    /// position also marks the lesson in progress.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Unauthenticated` for an anonymous
    /// session, or `Storage` if the upsert fails.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub async fn record_playback_position(
        &self,
        session: Session,
        lesson_id: LessonId,
        position_secs: f64,
    ) -> Result<(), ProgressServiceError> {
        let user = session
            .user_id()
            .ok_or(ProgressServiceError::Unauthenticated)?;
        let position = position_secs.max(0.0).floor() as u32;
        let now = self.clock.now();
        self.progress
            .record_position(user, lesson_id, position, now)
            .await?;
        Ok(())
    }

    /// The session user's status for a lesson; not started when no row
    /// exists or the session is anonymous.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn lesson_status(
        &self,
        session: Session,
        lesson_id: LessonId,
    ) -> Result<LessonStatus, ProgressServiceError> {
        let Some(user) = session.user_id() else {
            return Ok(LessonStatus::NotStarted);
        };
        let status = self
            .progress
            .get_progress(user, lesson_id)
            .await?
            .map(|p| p.status)
            .unwrap_or_default();
        Ok(status)
    }

    /// Lesson and completion counts for a course. A course with no
    /// lessons reports zero counts; an anonymous session reports zero
    /// completed.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn course_stats(
        &self,
        session: Session,
        course_id: CourseId,
    ) -> Result<CourseStats, ProgressServiceError> {
        let lesson_count = self.lessons.lesson_count(course_id).await?;
        let completed_count = match session.user_id() {
            Some(user) if lesson_count > 0 => {
                let ids = self.lessons.lesson_ids_for_courses(&[course_id]).await?;
                self.progress.completed_count(user, &ids).await?
            }
            _ => 0,
        };
        Ok(CourseStats {
            lesson_count,
            completed_count,
        })
    }

    /// Stats for several courses at once, fetched concurrently. The
    /// result preserves the input order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if any fetch fails.
    pub async fn stats_for_courses(
        &self,
        session: Session,
        course_ids: &[CourseId],
    ) -> Result<Vec<(CourseId, CourseStats)>, ProgressServiceError> {
        let stats = try_join_all(
            course_ids
                .iter()
                .map(|id| self.course_stats(session, *id)),
        )
        .await?;
        Ok(course_ids.iter().copied().zip(stats).collect())
    }

    /// Overall completion percentage across every lesson of every course
    /// linked to the path, each lesson weighted equally. Paths with no
    /// courses or no lessons, and anonymous sessions, report 0.0.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if repository access fails.
    pub async fn path_progress_percent(
        &self,
        session: Session,
        path_id: PathId,
    ) -> Result<f64, ProgressServiceError> {
        let links = self.courses.links_for_path(path_id).await?;
        if links.is_empty() {
            return Ok(0.0);
        }
        let course_ids: Vec<CourseId> = links.iter().map(|l| l.course_id).collect();
        let lesson_ids = self.lessons.lesson_ids_for_courses(&course_ids).await?;
        let total = u32::try_from(lesson_ids.len())
            .map_err(|_| storage::repository::StorageError::Serialization(
                "lesson count overflow".into(),
            ))?;

        let completed = match session.user_id() {
            Some(user) if total > 0 => self.progress.completed_count(user, &lesson_ids).await?,
            _ => 0,
        };
        Ok(completion_percent(completed, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pathway_core::model::{LessonKind, UserId};
    use pathway_core::time::{fixed_clock, fixed_now};
    use storage::repository::{
        InMemoryRepository, NewCourseRecord, NewLessonRecord, NewPathRecord, PathRepository,
    };

    struct Fixture {
        repo: InMemoryRepository,
        service: ProgressService,
        path_id: PathId,
    }

    async fn fixture() -> Fixture {
        let repo = InMemoryRepository::new();
        let path_id = repo
            .insert_new_path(NewPathRecord {
                owner: UserId::random(),
                title: "Rust".into(),
                description: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let arc = Arc::new(repo.clone());
        let service = ProgressService::new(fixed_clock(), arc.clone(), arc.clone(), arc);
        Fixture {
            repo,
            service,
            path_id,
        }
    }

    async fn course_with_lessons(fx: &Fixture, title: &str, lessons: u32) -> CourseId {
        let course_id = fx
            .repo
            .create_course_in_path(
                fx.path_id,
                NewCourseRecord {
                    title: title.into(),
                    description: None,
                    level: None,
                    tags: Vec::new(),
                    created_at: fixed_now(),
                },
            )
            .await
            .unwrap();
        for i in 0..lessons {
            fx.repo
                .insert_new_lesson(NewLessonRecord {
                    course_id,
                    title: format!("L{i}"),
                    kind: LessonKind::Video,
                    source: url::Url::parse("https://youtu.be/dQw4w9WgXcQ").unwrap(),
                    order_index: i,
                    duration_secs: None,
                    thumbnail: None,
                    created_at: fixed_now(),
                })
                .await
                .unwrap();
        }
        course_id
    }

    async fn complete_first_n(fx: &Fixture, user: UserId, course_id: CourseId, n: usize) {
        let lessons = fx.repo.lessons_for_course(course_id).await.unwrap();
        for lesson in lessons.iter().take(n) {
            fx.repo
                .set_status(user, lesson.id(), LessonStatus::Completed, fixed_now())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn empty_course_has_zero_stats() {
        let fx = fixture().await;
        let course_id = course_with_lessons(&fx, "Empty", 0).await;
        let user = UserId::random();

        let stats = fx
            .service
            .course_stats(Session::User(user), course_id)
            .await
            .unwrap();
        assert_eq!(stats.lesson_count, 0);
        assert_eq!(stats.completed_count, 0);
        assert_eq!(stats.percent(), 0.0);
    }

    #[tokio::test]
    async fn path_percent_weighs_every_lesson_equally() {
        let fx = fixture().await;
        let a = course_with_lessons(&fx, "A", 2).await;
        course_with_lessons(&fx, "B", 3).await;
        let user = UserId::random();

        // One of five lessons completed across the whole path.
        complete_first_n(&fx, user, a, 1).await;

        let pct = fx
            .service
            .path_progress_percent(Session::User(user), fx.path_id)
            .await
            .unwrap();
        assert_eq!(pct, 20.0);
    }

    #[tokio::test]
    async fn anonymous_sessions_read_zero_and_cannot_write() {
        let fx = fixture().await;
        let course_id = course_with_lessons(&fx, "A", 2).await;
        let lesson = fx.repo.first_lesson(course_id).await.unwrap().unwrap();

        let err = fx
            .service
            .set_lesson_status(Session::Anonymous, lesson.id(), LessonStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressServiceError::Unauthenticated));

        let status = fx
            .service
            .lesson_status(Session::Anonymous, lesson.id())
            .await
            .unwrap();
        assert_eq!(status, LessonStatus::NotStarted);

        let pct = fx
            .service
            .path_progress_percent(Session::Anonymous, fx.path_id)
            .await
            .unwrap();
        assert_eq!(pct, 0.0);
    }

    #[tokio::test]
    async fn playback_positions_are_floored() {
        let fx = fixture().await;
        let course_id = course_with_lessons(&fx, "A", 1).await;
        let lesson = fx.repo.first_lesson(course_id).await.unwrap().unwrap();
        let user = UserId::random();

        fx.service
            .record_playback_position(Session::User(user), lesson.id(), 93.7)
            .await
            .unwrap();

        let progress = fx
            .repo
            .get_progress(user, lesson.id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(progress.last_position_secs, Some(93));
        assert_eq!(progress.status, LessonStatus::InProgress);
    }

    #[tokio::test]
    async fn stats_fan_out_preserves_input_order() {
        let fx = fixture().await;
        let a = course_with_lessons(&fx, "A", 2).await;
        let b = course_with_lessons(&fx, "B", 3).await;
        let user = UserId::random();
        complete_first_n(&fx, user, b, 3).await;

        let stats = fx
            .service
            .stats_for_courses(Session::User(user), &[a, b])
            .await
            .unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].0, a);
        assert_eq!(stats[0].1.completed_count, 0);
        assert_eq!(stats[1].0, b);
        assert_eq!(stats[1].1.completed_count, 3);
        assert_eq!(stats[1].1.percent(), 100.0);
    }
}
