use chrono::{DateTime, Utc};

use crate::model::ids::{LessonId, UserId};

/// Free-text note a user keeps on a lesson.
///
/// Keyed by (user, lesson); at most one note per pair. Saves go through
/// an atomic upsert on that key, so concurrent saves from multiple tabs
/// collapse to last-write-wins instead of duplicate rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
