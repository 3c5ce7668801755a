use std::sync::Arc;

use pathway_core::model::{Course, CourseId, CourseProgress, Lesson, LessonId, Path, PathId};
use storage::repository::{
    CourseProgressRepository, CourseRepository, LessonRepository, PathRepository,
};

use crate::Clock;
use crate::Session;
use crate::error::NavigationError;

/// Previous and next lessons around `lesson_id` within an already-ordered
/// slice. Either side is `None` at the edges, and both are `None` when the
/// lesson is not in the slice.
#[must_use]
pub fn neighbors_of(lessons: &[Lesson], lesson_id: LessonId) -> (Option<&Lesson>, Option<&Lesson>) {
    let Some(pos) = lessons.iter().position(|l| l.id() == lesson_id) else {
        return (None, None);
    };
    let prev = pos.checked_sub(1).and_then(|i| lessons.get(i));
    let next = lessons.get(pos + 1);
    (prev, next)
}

/// Where a lesson sits: its course and the first path the course is
/// linked into, when any.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonContext {
    pub lesson: Lesson,
    pub course: Course,
    pub path: Option<Path>,
}

/// Resolves "where do I start" and "where was I" questions over the
/// ordered course and lesson structure.
#[derive(Clone)]
pub struct NavigationService {
    clock: Clock,
    paths: Arc<dyn PathRepository>,
    courses: Arc<dyn CourseRepository>,
    lessons: Arc<dyn LessonRepository>,
    course_progress: Arc<dyn CourseProgressRepository>,
}

impl NavigationService {
    #[must_use]
    pub fn new(
        clock: Clock,
        paths: Arc<dyn PathRepository>,
        courses: Arc<dyn CourseRepository>,
        lessons: Arc<dyn LessonRepository>,
        course_progress: Arc<dyn CourseProgressRepository>,
    ) -> Self {
        Self {
            clock,
            paths,
            courses,
            lessons,
            course_progress,
        }
    }

    /// The lesson with the lowest order index in a course, if any.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Storage` if repository access fails.
    pub async fn first_lesson_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Option<Lesson>, NavigationError> {
        let lesson = self.lessons.first_lesson(course_id).await?;
        Ok(lesson)
    }

    /// The first lesson of the first-linked course of a path. Only the
    /// first course is consulted: if it has no lessons the answer is
    /// `None`, even when a later course does.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Storage` if repository access fails.
    pub async fn first_lesson_for_path(
        &self,
        path_id: PathId,
    ) -> Result<Option<Lesson>, NavigationError> {
        let links = self.courses.links_for_path(path_id).await?;
        let Some(first) = links.first() else {
            return Ok(None);
        };
        let lesson = self.lessons.first_lesson(first.course_id).await?;
        Ok(lesson)
    }

    /// The lesson to resume a course at: the session user's last-visited
    /// lesson when that pointer is still valid, otherwise the first
    /// lesson. `None` only when the course has no lessons at all.
    ///
    /// Anonymous sessions resolve to the first lesson.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Storage` if repository access fails.
    pub async fn continuation_lesson(
        &self,
        session: Session,
        course_id: CourseId,
    ) -> Result<Option<Lesson>, NavigationError> {
        if let Some(user) = session.user_id()
            && let Some(pointer) = self.course_progress.get_course_progress(user, course_id).await?
        {
            match self.lessons.get_lesson(pointer.last_lesson_id).await? {
                Some(lesson) if lesson.course_id() == course_id => return Ok(Some(lesson)),
                _ => {
                    // The pointed-at lesson was deleted or moved; fall
                    // back to the start of the course.
                    tracing::debug!(
                        course_id = %course_id,
                        lesson_id = %pointer.last_lesson_id,
                        "stale last-visited pointer"
                    );
                }
            }
        }
        let lesson = self.lessons.first_lesson(course_id).await?;
        Ok(lesson)
    }

    /// Remember the session user's position in a course. Re-recording
    /// the same lesson only refreshes the timestamp.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Unauthenticated` for an anonymous
    /// session, or `Storage` if the upsert fails.
    pub async fn record_visit(
        &self,
        session: Session,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<(), NavigationError> {
        let user = session.user_id().ok_or(NavigationError::Unauthenticated)?;
        let now = self.clock.now();
        self.course_progress
            .upsert_last_visited(user, course_id, lesson_id, now)
            .await?;
        Ok(())
    }

    /// The session user's last-visited pointers, most recent first.
    /// Anonymous sessions see an empty list.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Storage` if repository access fails.
    pub async fn recently_visited(
        &self,
        session: Session,
    ) -> Result<Vec<CourseProgress>, NavigationError> {
        let Some(user) = session.user_id() else {
            return Ok(Vec::new());
        };
        let pointers = self.course_progress.list_for_user(user).await?;
        Ok(pointers)
    }

    /// Resolve a lesson to its course and the course's first-linked path.
    /// `None` when the lesson, or the course it points at, is missing.
    ///
    /// # Errors
    ///
    /// Returns `NavigationError::Storage` if repository access fails.
    pub async fn lesson_context(
        &self,
        lesson_id: LessonId,
    ) -> Result<Option<LessonContext>, NavigationError> {
        let Some(lesson) = self.lessons.get_lesson(lesson_id).await? else {
            return Ok(None);
        };
        let Some(course) = self.courses.get_course(lesson.course_id()).await? else {
            return Ok(None);
        };
        let path = match self.courses.first_link_for_course(course.id()).await? {
            Some(link) => self.paths.get_path(link.path_id).await?,
            None => None,
        };
        Ok(Some(LessonContext {
            lesson,
            course,
            path,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pathway_core::model::{LessonKind, UserId};
    use pathway_core::time::{fixed_clock, fixed_now};
    use storage::repository::{
        InMemoryRepository, NewCourseRecord, NewLessonRecord, NewPathRecord,
    };

    fn service(repo: InMemoryRepository) -> NavigationService {
        let repo = Arc::new(repo);
        NavigationService::new(
            fixed_clock(),
            repo.clone(),
            repo.clone(),
            repo.clone(),
            repo,
        )
    }

    async fn seeded_path(repo: &InMemoryRepository, owner: UserId) -> PathId {
        repo.insert_new_path(NewPathRecord {
            owner,
            title: "Rust".into(),
            description: None,
            created_at: fixed_now(),
        })
        .await
        .unwrap()
    }

    async fn add_course(repo: &InMemoryRepository, path_id: PathId, title: &str) -> CourseId {
        repo.create_course_in_path(
            path_id,
            NewCourseRecord {
                title: title.into(),
                description: None,
                level: None,
                tags: Vec::new(),
                created_at: fixed_now(),
            },
        )
        .await
        .unwrap()
    }

    async fn add_lesson(
        repo: &InMemoryRepository,
        course_id: CourseId,
        title: &str,
        order_index: u32,
    ) -> LessonId {
        repo.insert_new_lesson(NewLessonRecord {
            course_id,
            title: title.into(),
            kind: LessonKind::Video,
            source: url::Url::parse("https://youtu.be/dQw4w9WgXcQ").unwrap(),
            order_index,
            duration_secs: None,
            thumbnail: None,
            created_at: fixed_now(),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn neighbors_are_resolved_within_the_slice() {
        let repo = InMemoryRepository::new();
        let path_id = seeded_path(&repo, UserId::random()).await;
        let course_id = add_course(&repo, path_id, "A").await;
        let l1 = add_lesson(&repo, course_id, "One", 0).await;
        let l2 = add_lesson(&repo, course_id, "Two", 1).await;
        let l3 = add_lesson(&repo, course_id, "Three", 2).await;

        let lessons = repo.lessons_for_course(course_id).await.unwrap();

        let (prev, next) = neighbors_of(&lessons, l2);
        assert_eq!(prev.map(Lesson::id), Some(l1));
        assert_eq!(next.map(Lesson::id), Some(l3));

        let (prev, next) = neighbors_of(&lessons, l1);
        assert!(prev.is_none());
        assert_eq!(next.map(Lesson::id), Some(l2));

        let (prev, next) = neighbors_of(&lessons, LessonId::new(999));
        assert!(prev.is_none());
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn first_lesson_for_path_stops_at_an_empty_first_course() {
        let repo = InMemoryRepository::new();
        let path_id = seeded_path(&repo, UserId::random()).await;
        let empty = add_course(&repo, path_id, "Empty").await;
        let full = add_course(&repo, path_id, "Full").await;
        add_lesson(&repo, full, "One", 0).await;

        let service = service(repo.clone());
        // The first-linked course has no lessons, so there is no entry
        // point even though a later course has one.
        assert!(service.first_lesson_for_path(path_id).await.unwrap().is_none());
        assert!(service.first_lesson_for_course(empty).await.unwrap().is_none());
        assert!(service.first_lesson_for_course(full).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn continuation_prefers_the_recorded_pointer() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let path_id = seeded_path(&repo, user).await;
        let course_id = add_course(&repo, path_id, "A").await;
        let l1 = add_lesson(&repo, course_id, "One", 0).await;
        let l2 = add_lesson(&repo, course_id, "Two", 1).await;

        let service = service(repo.clone());
        let session = Session::User(user);

        // No pointer yet: start at the beginning.
        let resumed = service.continuation_lesson(session, course_id).await.unwrap();
        assert_eq!(resumed.map(|l| l.id()), Some(l1));

        service.record_visit(session, course_id, l2).await.unwrap();
        let resumed = service.continuation_lesson(session, course_id).await.unwrap();
        assert_eq!(resumed.map(|l| l.id()), Some(l2));

        // Anonymous sessions never see the pointer.
        let resumed = service
            .continuation_lesson(Session::Anonymous, course_id)
            .await
            .unwrap();
        assert_eq!(resumed.map(|l| l.id()), Some(l1));
    }

    #[tokio::test]
    async fn continuation_falls_back_when_the_pointer_goes_stale() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let path_id = seeded_path(&repo, user).await;
        let course_id = add_course(&repo, path_id, "A").await;
        let other_course = add_course(&repo, path_id, "B").await;
        let l1 = add_lesson(&repo, course_id, "One", 0).await;
        let l2 = add_lesson(&repo, course_id, "Two", 1).await;
        let foreign = add_lesson(&repo, other_course, "Elsewhere", 0).await;

        let service = service(repo.clone());
        let session = Session::User(user);

        service.record_visit(session, course_id, l2).await.unwrap();
        repo.delete_lesson(l2).await.unwrap();
        let resumed = service.continuation_lesson(session, course_id).await.unwrap();
        assert_eq!(resumed.map(|l| l.id()), Some(l1));

        // A pointer at a lesson from another course is just as stale.
        service.record_visit(session, course_id, foreign).await.unwrap();
        let resumed = service.continuation_lesson(session, course_id).await.unwrap();
        assert_eq!(resumed.map(|l| l.id()), Some(l1));
    }

    #[tokio::test]
    async fn continuation_of_an_empty_course_is_none() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let path_id = seeded_path(&repo, user).await;
        let course_id = add_course(&repo, path_id, "Empty").await;

        let service = service(repo);
        let resumed = service
            .continuation_lesson(Session::User(user), course_id)
            .await
            .unwrap();
        assert!(resumed.is_none());
    }

    #[tokio::test]
    async fn record_visit_is_idempotent_and_scoped() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let path_id = seeded_path(&repo, user).await;
        let course_id = add_course(&repo, path_id, "A").await;
        let l1 = add_lesson(&repo, course_id, "One", 0).await;

        let service = service(repo);
        let session = Session::User(user);

        service.record_visit(session, course_id, l1).await.unwrap();
        service.record_visit(session, course_id, l1).await.unwrap();

        let visited = service.recently_visited(session).await.unwrap();
        assert_eq!(visited.len(), 1);
        assert_eq!(visited[0].last_lesson_id, l1);

        let err = service
            .record_visit(Session::Anonymous, course_id, l1)
            .await
            .unwrap_err();
        assert!(matches!(err, NavigationError::Unauthenticated));
        assert!(service
            .recently_visited(Session::Anonymous)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn lesson_context_resolves_course_and_path() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let path_id = seeded_path(&repo, user).await;
        let course_id = add_course(&repo, path_id, "A").await;
        let l1 = add_lesson(&repo, course_id, "One", 0).await;

        let service = service(repo);
        let context = service.lesson_context(l1).await.unwrap().unwrap();
        assert_eq!(context.lesson.id(), l1);
        assert_eq!(context.course.id(), course_id);
        assert_eq!(context.path.map(|p| p.id()), Some(path_id));

        assert!(service.lesson_context(LessonId::new(999)).await.unwrap().is_none());
    }
}
