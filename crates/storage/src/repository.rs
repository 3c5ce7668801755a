use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pathway_core::model::{
    Course, CourseId, CourseLevel, CourseProgress, Lesson, LessonId, LessonKind, LessonStatus,
    Note, Path, PathCourseLink, PathId, Progress, UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use url::Url;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a path. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewPathRecord {
    pub owner: UserId,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewPathRecord {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        Self {
            owner: path.owner(),
            title: path.title().to_owned(),
            description: path.description().map(ToOwned::to_owned),
            created_at: path.created_at(),
        }
    }
}

/// Insert shape for a course. The store assigns the id; the path link is
/// created in the same unit of work by `create_course_in_path`.
#[derive(Debug, Clone)]
pub struct NewCourseRecord {
    pub title: String,
    pub description: Option<String>,
    pub level: Option<CourseLevel>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl NewCourseRecord {
    #[must_use]
    pub fn from_course(course: &Course) -> Self {
        Self {
            title: course.title().to_owned(),
            description: course.description().map(ToOwned::to_owned),
            level: course.meta().level(),
            tags: course.meta().tags().to_vec(),
            created_at: course.created_at(),
        }
    }
}

/// Insert shape for a lesson.
///
/// `order_index` is supplied by the caller (current lesson count of the
/// course); the store never recomputes it.
#[derive(Debug, Clone)]
pub struct NewLessonRecord {
    pub course_id: CourseId,
    pub title: String,
    pub kind: LessonKind,
    pub source: Url,
    pub order_index: u32,
    pub duration_secs: Option<u32>,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewLessonRecord {
    #[must_use]
    pub fn from_lesson(lesson: &Lesson) -> Self {
        Self {
            course_id: lesson.course_id(),
            title: lesson.title().to_owned(),
            kind: lesson.kind(),
            source: lesson.source().clone(),
            order_index: lesson.order_index(),
            duration_secs: lesson.meta().duration_secs,
            thumbnail: lesson.meta().thumbnail.clone(),
            created_at: lesson.created_at(),
        }
    }
}

/// Repository contract for paths.
///
/// Lookups return `Ok(None)` for missing rows; `StorageError` is reserved
/// for store failures.
#[async_trait]
pub trait PathRepository: Send + Sync {
    /// Persist a new path and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the path cannot be stored.
    async fn insert_new_path(&self, path: NewPathRecord) -> Result<PathId, StorageError>;

    /// Fetch a path by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures; a missing path is `Ok(None)`.
    async fn get_path(&self, id: PathId) -> Result<Option<Path>, StorageError>;

    /// Persist or update a path.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the path cannot be stored.
    async fn upsert_path(&self, path: &Path) -> Result<(), StorageError>;

    /// List a user's paths, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn list_paths_for_user(&self, user: UserId) -> Result<Vec<Path>, StorageError>;
}

/// Repository contract for courses and their path links.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// Create a course and link it to `path_id` with the next order index,
    /// as one unit of work: a failure leaves no orphan course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either step cannot be performed.
    async fn create_course_in_path(
        &self,
        path_id: PathId,
        course: NewCourseRecord,
    ) -> Result<CourseId, StorageError>;

    /// Fetch a course by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures; a missing course is `Ok(None)`.
    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError>;

    /// Persist or update a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the course cannot be stored.
    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError>;

    /// Courses linked to a path, ordered by link order index ascending
    /// (link creation time as tiebreak). Dangling links are skipped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn courses_for_path(&self, path_id: PathId) -> Result<Vec<Course>, StorageError>;

    /// Links of a path, in the same order as `courses_for_path`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn links_for_path(&self, path_id: PathId) -> Result<Vec<PathCourseLink>, StorageError>;

    /// Attach an existing course to another path; returns the assigned
    /// order index.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the link already exists.
    async fn link_course_to_path(
        &self,
        path_id: PathId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Result<u32, StorageError>;

    /// First path link for a course (order index, then link creation time).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn first_link_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Option<PathCourseLink>, StorageError>;
}

/// Repository contract for lessons.
#[async_trait]
pub trait LessonRepository: Send + Sync {
    /// Persist a new lesson and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the lesson cannot be stored.
    async fn insert_new_lesson(&self, lesson: NewLessonRecord) -> Result<LessonId, StorageError>;

    /// Fetch a lesson by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures; a missing lesson is `Ok(None)`.
    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError>;

    /// Lessons of a course, ordered by order index ascending with id as
    /// the stable tiebreak.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError>;

    /// Number of lessons in a course.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn lesson_count(&self, course_id: CourseId) -> Result<u32, StorageError>;

    /// Lesson with the minimal order index, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn first_lesson(&self, course_id: CourseId) -> Result<Option<Lesson>, StorageError>;

    /// Ids of all lessons across the given courses (no particular order).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn lesson_ids_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> Result<Vec<LessonId>, StorageError>;

    /// Delete a lesson. Deleting a missing lesson is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError>;
}

/// Repository contract for per-lesson progress rows.
///
/// All writes are atomic upserts keyed on (user, lesson); adapters must
/// not read-then-insert, to avoid duplicate-row races under concurrent
/// playback updates.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Set the status for (user, lesson), preserving any stored playback
    /// position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be stored.
    async fn set_status(
        &self,
        user: UserId,
        lesson: LessonId,
        status: LessonStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Record a playback position for (user, lesson) and move the status
    /// to in-progress.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be stored.
    async fn record_position(
        &self,
        user: UserId,
        lesson: LessonId,
        position_secs: u32,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Fetch the progress row for (user, lesson), if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn get_progress(
        &self,
        user: UserId,
        lesson: LessonId,
    ) -> Result<Option<Progress>, StorageError>;

    /// Count of the given lessons the user has completed. Absent rows
    /// count as not completed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn completed_count(
        &self,
        user: UserId,
        lesson_ids: &[LessonId],
    ) -> Result<u32, StorageError>;

    /// Statuses for the given lessons; lessons without a row are absent
    /// from the map.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn statuses_for_lessons(
        &self,
        user: UserId,
        lesson_ids: &[LessonId],
    ) -> Result<HashMap<LessonId, LessonStatus>, StorageError>;
}

/// Repository contract for the per-course "last visited lesson" pointer.
///
/// Writes are atomic upserts keyed on (user, course).
#[async_trait]
pub trait CourseProgressRepository: Send + Sync {
    /// Record the last visited lesson for (user, course).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the row cannot be stored.
    async fn upsert_last_visited(
        &self,
        user: UserId,
        course: CourseId,
        lesson: LessonId,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Fetch the pointer for (user, course), if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn get_course_progress(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<CourseProgress>, StorageError>;

    /// All pointers for a user, most recently updated first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn list_for_user(&self, user: UserId) -> Result<Vec<CourseProgress>, StorageError>;
}

/// Repository contract for lesson notes, keyed on (user, lesson).
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Insert or replace the note for (user, lesson) atomically;
    /// `created_at` of an existing note is preserved.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the note cannot be stored.
    async fn upsert_note(
        &self,
        user: UserId,
        lesson: LessonId,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Note, StorageError>;

    /// Fetch the note for (user, lesson), if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on store failures.
    async fn get_note(&self, user: UserId, lesson: LessonId)
    -> Result<Option<Note>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    paths: Arc<Mutex<HashMap<PathId, Path>>>,
    courses: Arc<Mutex<HashMap<CourseId, Course>>>,
    links: Arc<Mutex<Vec<PathCourseLink>>>,
    lessons: Arc<Mutex<HashMap<LessonId, Lesson>>>,
    progress: Arc<Mutex<HashMap<(UserId, LessonId), Progress>>>,
    course_progress: Arc<Mutex<HashMap<(UserId, CourseId), CourseProgress>>>,
    notes: Arc<Mutex<HashMap<(UserId, LessonId), Note>>>,
    next_id: Arc<Mutex<u64>>,
}

fn lock<'a, T>(mutex: &'a Mutex<T>) -> Result<MutexGuard<'a, T>, StorageError> {
    mutex
        .lock()
        .map_err(|e| StorageError::Connection(e.to_string()))
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&self) -> Result<u64, StorageError> {
        let mut next = lock(&self.next_id)?;
        *next += 1;
        Ok(*next)
    }

    fn ordered_links(links: &[PathCourseLink], path_id: PathId) -> Vec<PathCourseLink> {
        let mut out: Vec<PathCourseLink> = links
            .iter()
            .filter(|l| l.path_id == path_id)
            .copied()
            .collect();
        out.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        out
    }

    fn push_link(
        links: &mut Vec<PathCourseLink>,
        path_id: PathId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        if links
            .iter()
            .any(|l| l.path_id == path_id && l.course_id == course_id)
        {
            return Err(StorageError::Conflict);
        }
        let order_index = links
            .iter()
            .filter(|l| l.path_id == path_id)
            .map(|l| l.order_index + 1)
            .max()
            .unwrap_or(0);
        links.push(PathCourseLink {
            path_id,
            course_id,
            order_index,
            created_at: now,
        });
        Ok(order_index)
    }
}

#[async_trait]
impl PathRepository for InMemoryRepository {
    async fn insert_new_path(&self, path: NewPathRecord) -> Result<PathId, StorageError> {
        let id = PathId::new(self.alloc_id()?);
        let stored = Path::new(id, path.owner, path.title, path.description, path.created_at)
            .map_err(ser)?;
        lock(&self.paths)?.insert(id, stored);
        Ok(id)
    }

    async fn get_path(&self, id: PathId) -> Result<Option<Path>, StorageError> {
        Ok(lock(&self.paths)?.get(&id).cloned())
    }

    async fn upsert_path(&self, path: &Path) -> Result<(), StorageError> {
        lock(&self.paths)?.insert(path.id(), path.clone());
        Ok(())
    }

    async fn list_paths_for_user(&self, user: UserId) -> Result<Vec<Path>, StorageError> {
        let guard = lock(&self.paths)?;
        let mut out: Vec<Path> = guard
            .values()
            .filter(|p| p.owner() == user)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        Ok(out)
    }
}

#[async_trait]
impl CourseRepository for InMemoryRepository {
    async fn create_course_in_path(
        &self,
        path_id: PathId,
        course: NewCourseRecord,
    ) -> Result<CourseId, StorageError> {
        let id = CourseId::new(self.alloc_id()?);
        let meta = pathway_core::model::CourseMeta::new(course.level, course.tags);
        let stored = Course::new(id, course.title, course.description, meta, course.created_at)
            .map_err(ser)?;

        // Hold the link lock across both writes so the pair is all-or-nothing.
        let mut links = lock(&self.links)?;
        Self::push_link(&mut links, path_id, id, course.created_at)?;
        lock(&self.courses)?.insert(id, stored);
        Ok(id)
    }

    async fn get_course(&self, id: CourseId) -> Result<Option<Course>, StorageError> {
        Ok(lock(&self.courses)?.get(&id).cloned())
    }

    async fn upsert_course(&self, course: &Course) -> Result<(), StorageError> {
        lock(&self.courses)?.insert(course.id(), course.clone());
        Ok(())
    }

    async fn courses_for_path(&self, path_id: PathId) -> Result<Vec<Course>, StorageError> {
        let ordered = Self::ordered_links(&lock(&self.links)?, path_id);
        let courses = lock(&self.courses)?;
        Ok(ordered
            .iter()
            .filter_map(|l| courses.get(&l.course_id).cloned())
            .collect())
    }

    async fn links_for_path(&self, path_id: PathId) -> Result<Vec<PathCourseLink>, StorageError> {
        Ok(Self::ordered_links(&lock(&self.links)?, path_id))
    }

    async fn link_course_to_path(
        &self,
        path_id: PathId,
        course_id: CourseId,
        now: DateTime<Utc>,
    ) -> Result<u32, StorageError> {
        let mut links = lock(&self.links)?;
        Self::push_link(&mut links, path_id, course_id, now)
    }

    async fn first_link_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Option<PathCourseLink>, StorageError> {
        let links = lock(&self.links)?;
        Ok(links
            .iter()
            .filter(|l| l.course_id == course_id)
            .min_by(|a, b| {
                a.order_index
                    .cmp(&b.order_index)
                    .then_with(|| a.created_at.cmp(&b.created_at))
            })
            .copied())
    }
}

#[async_trait]
impl LessonRepository for InMemoryRepository {
    async fn insert_new_lesson(&self, lesson: NewLessonRecord) -> Result<LessonId, StorageError> {
        let id = LessonId::new(self.alloc_id()?);
        let stored = Lesson::new(
            id,
            lesson.course_id,
            lesson.title,
            lesson.kind,
            lesson.source,
            lesson.order_index,
            pathway_core::model::LessonMeta {
                duration_secs: lesson.duration_secs,
                thumbnail: lesson.thumbnail,
            },
            lesson.created_at,
        )
        .map_err(ser)?;
        lock(&self.lessons)?.insert(id, stored);
        Ok(id)
    }

    async fn get_lesson(&self, id: LessonId) -> Result<Option<Lesson>, StorageError> {
        Ok(lock(&self.lessons)?.get(&id).cloned())
    }

    async fn lessons_for_course(&self, course_id: CourseId) -> Result<Vec<Lesson>, StorageError> {
        let guard = lock(&self.lessons)?;
        let mut out: Vec<Lesson> = guard
            .values()
            .filter(|l| l.course_id() == course_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            a.order_index()
                .cmp(&b.order_index())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(out)
    }

    async fn lesson_count(&self, course_id: CourseId) -> Result<u32, StorageError> {
        let guard = lock(&self.lessons)?;
        let count = guard.values().filter(|l| l.course_id() == course_id).count();
        u32::try_from(count).map_err(|_| StorageError::Serialization("lesson count overflow".into()))
    }

    async fn first_lesson(&self, course_id: CourseId) -> Result<Option<Lesson>, StorageError> {
        Ok(self.lessons_for_course(course_id).await?.into_iter().next())
    }

    async fn lesson_ids_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> Result<Vec<LessonId>, StorageError> {
        let guard = lock(&self.lessons)?;
        Ok(guard
            .values()
            .filter(|l| course_ids.contains(&l.course_id()))
            .map(Lesson::id)
            .collect())
    }

    async fn delete_lesson(&self, id: LessonId) -> Result<(), StorageError> {
        lock(&self.lessons)?.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn set_status(
        &self,
        user: UserId,
        lesson: LessonId,
        status: LessonStatus,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = lock(&self.progress)?;
        let entry = guard.entry((user, lesson)).or_insert(Progress {
            user_id: user,
            lesson_id: lesson,
            status,
            last_position_secs: None,
            updated_at: now,
        });
        entry.status = status;
        entry.updated_at = now;
        Ok(())
    }

    async fn record_position(
        &self,
        user: UserId,
        lesson: LessonId,
        position_secs: u32,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut guard = lock(&self.progress)?;
        let entry = guard.entry((user, lesson)).or_insert(Progress {
            user_id: user,
            lesson_id: lesson,
            status: LessonStatus::InProgress,
            last_position_secs: None,
            updated_at: now,
        });
        entry.status = LessonStatus::InProgress;
        entry.last_position_secs = Some(position_secs);
        entry.updated_at = now;
        Ok(())
    }

    async fn get_progress(
        &self,
        user: UserId,
        lesson: LessonId,
    ) -> Result<Option<Progress>, StorageError> {
        Ok(lock(&self.progress)?.get(&(user, lesson)).cloned())
    }

    async fn completed_count(
        &self,
        user: UserId,
        lesson_ids: &[LessonId],
    ) -> Result<u32, StorageError> {
        let guard = lock(&self.progress)?;
        let count = lesson_ids
            .iter()
            .filter(|id| {
                guard
                    .get(&(user, **id))
                    .is_some_and(|p| p.status == LessonStatus::Completed)
            })
            .count();
        u32::try_from(count)
            .map_err(|_| StorageError::Serialization("completed count overflow".into()))
    }

    async fn statuses_for_lessons(
        &self,
        user: UserId,
        lesson_ids: &[LessonId],
    ) -> Result<HashMap<LessonId, LessonStatus>, StorageError> {
        let guard = lock(&self.progress)?;
        Ok(lesson_ids
            .iter()
            .filter_map(|id| guard.get(&(user, *id)).map(|p| (*id, p.status)))
            .collect())
    }
}

#[async_trait]
impl CourseProgressRepository for InMemoryRepository {
    async fn upsert_last_visited(
        &self,
        user: UserId,
        course: CourseId,
        lesson: LessonId,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        lock(&self.course_progress)?.insert(
            (user, course),
            CourseProgress {
                user_id: user,
                course_id: course,
                last_lesson_id: lesson,
                updated_at: now,
            },
        );
        Ok(())
    }

    async fn get_course_progress(
        &self,
        user: UserId,
        course: CourseId,
    ) -> Result<Option<CourseProgress>, StorageError> {
        Ok(lock(&self.course_progress)?.get(&(user, course)).cloned())
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<CourseProgress>, StorageError> {
        let guard = lock(&self.course_progress)?;
        let mut out: Vec<CourseProgress> = guard
            .values()
            .filter(|cp| cp.user_id == user)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(out)
    }
}

#[async_trait]
impl NoteRepository for InMemoryRepository {
    async fn upsert_note(
        &self,
        user: UserId,
        lesson: LessonId,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Note, StorageError> {
        let mut guard = lock(&self.notes)?;
        let created_at = guard
            .get(&(user, lesson))
            .map_or(now, |existing| existing.created_at);
        let note = Note {
            user_id: user,
            lesson_id: lesson,
            content: content.to_owned(),
            created_at,
            updated_at: now,
        };
        guard.insert((user, lesson), note.clone());
        Ok(note)
    }

    async fn get_note(
        &self,
        user: UserId,
        lesson: LessonId,
    ) -> Result<Option<Note>, StorageError> {
        Ok(lock(&self.notes)?.get(&(user, lesson)).cloned())
    }
}

/// Aggregates the per-entity repositories behind trait objects for easy
/// backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub paths: Arc<dyn PathRepository>,
    pub courses: Arc<dyn CourseRepository>,
    pub lessons: Arc<dyn LessonRepository>,
    pub progress: Arc<dyn ProgressRepository>,
    pub course_progress: Arc<dyn CourseProgressRepository>,
    pub notes: Arc<dyn NoteRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            paths: Arc::new(repo.clone()),
            courses: Arc::new(repo.clone()),
            lessons: Arc::new(repo.clone()),
            progress: Arc::new(repo.clone()),
            course_progress: Arc::new(repo.clone()),
            notes: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathway_core::time::fixed_now;

    fn new_path(owner: UserId) -> NewPathRecord {
        NewPathRecord {
            owner,
            title: "Rust".into(),
            description: None,
            created_at: fixed_now(),
        }
    }

    fn new_course(title: &str) -> NewCourseRecord {
        NewCourseRecord {
            title: title.into(),
            description: None,
            level: None,
            tags: Vec::new(),
            created_at: fixed_now(),
        }
    }

    fn new_lesson(course_id: CourseId, title: &str, order_index: u32) -> NewLessonRecord {
        NewLessonRecord {
            course_id,
            title: title.into(),
            kind: LessonKind::Video,
            source: Url::parse("https://youtu.be/dQw4w9WgXcQ").unwrap(),
            order_index,
            duration_secs: None,
            thumbnail: None,
            created_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn round_trips_path() {
        let repo = InMemoryRepository::new();
        let owner = UserId::random();
        let id = repo.insert_new_path(new_path(owner)).await.unwrap();

        let fetched = repo.get_path(id).await.unwrap().unwrap();
        assert_eq!(fetched.title(), "Rust");
        assert_eq!(fetched.owner(), owner);

        let other = UserId::random();
        assert!(repo.list_paths_for_user(other).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn links_get_sequential_order_indexes() {
        let repo = InMemoryRepository::new();
        let owner = UserId::random();
        let path_id = repo.insert_new_path(new_path(owner)).await.unwrap();

        let a = repo
            .create_course_in_path(path_id, new_course("A"))
            .await
            .unwrap();
        let b = repo
            .create_course_in_path(path_id, new_course("B"))
            .await
            .unwrap();

        let links = repo.links_for_path(path_id).await.unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].order_index, 0);
        assert_eq!(links[1].order_index, 1);

        let courses = repo.courses_for_path(path_id).await.unwrap();
        assert_eq!(courses[0].id(), a);
        assert_eq!(courses[1].id(), b);
    }

    #[tokio::test]
    async fn duplicate_link_is_a_conflict() {
        let repo = InMemoryRepository::new();
        let owner = UserId::random();
        let path_id = repo.insert_new_path(new_path(owner)).await.unwrap();
        let course_id = repo
            .create_course_in_path(path_id, new_course("A"))
            .await
            .unwrap();

        let err = repo
            .link_course_to_path(path_id, course_id, fixed_now())
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn lessons_order_by_index_then_id() {
        let repo = InMemoryRepository::new();
        let owner = UserId::random();
        let path_id = repo.insert_new_path(new_path(owner)).await.unwrap();
        let course_id = repo
            .create_course_in_path(path_id, new_course("A"))
            .await
            .unwrap();

        let second = repo
            .insert_new_lesson(new_lesson(course_id, "Second", 1))
            .await
            .unwrap();
        let first = repo
            .insert_new_lesson(new_lesson(course_id, "First", 0))
            .await
            .unwrap();

        let lessons = repo.lessons_for_course(course_id).await.unwrap();
        assert_eq!(lessons.len(), 2);
        assert_eq!(lessons[0].id(), first);
        assert_eq!(lessons[1].id(), second);
        assert_eq!(
            repo.first_lesson(course_id).await.unwrap().unwrap().id(),
            first
        );
    }

    #[tokio::test]
    async fn progress_upsert_is_keyed_per_user_lesson() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let lesson = LessonId::new(7);

        repo.record_position(user, lesson, 30, fixed_now())
            .await
            .unwrap();
        repo.record_position(user, lesson, 60, fixed_now())
            .await
            .unwrap();

        let progress = repo.get_progress(user, lesson).await.unwrap().unwrap();
        assert_eq!(progress.status, LessonStatus::InProgress);
        assert_eq!(progress.last_position_secs, Some(60));

        repo.set_status(user, lesson, LessonStatus::Completed, fixed_now())
            .await
            .unwrap();
        let progress = repo.get_progress(user, lesson).await.unwrap().unwrap();
        assert_eq!(progress.status, LessonStatus::Completed);
        // position survives a status flip
        assert_eq!(progress.last_position_secs, Some(60));

        assert_eq!(repo.completed_count(user, &[lesson]).await.unwrap(), 1);
        let other = UserId::random();
        assert_eq!(repo.completed_count(other, &[lesson]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn note_upsert_preserves_created_at() {
        let repo = InMemoryRepository::new();
        let user = UserId::random();
        let lesson = LessonId::new(1);
        let t0 = fixed_now();
        let t1 = t0 + chrono::Duration::minutes(5);

        let first = repo.upsert_note(user, lesson, "draft", t0).await.unwrap();
        let second = repo.upsert_note(user, lesson, "final", t1).await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.updated_at, t1);
        assert_eq!(
            repo.get_note(user, lesson).await.unwrap().unwrap().content,
            "final"
        );
    }
}
