use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, LessonId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonStatusError {
    #[error("unknown lesson status: {0}")]
    Unknown(String),
}

/// Per-user completion state for a lesson.
///
/// Any state is reachable from any state; there is no enforced state
/// machine beyond the enum itself. Last write wins on concurrent updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LessonStatus {
    #[default]
    NotStarted,
    InProgress,
    Completed,
}

impl LessonStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::NotStarted => "not_started",
            LessonStatus::InProgress => "in_progress",
            LessonStatus::Completed => "completed",
        }
    }

    /// Parses a stored status string.
    ///
    /// # Errors
    ///
    /// Returns `LessonStatusError::Unknown` for anything else.
    pub fn parse(s: &str) -> Result<Self, LessonStatusError> {
        match s {
            "not_started" => Ok(LessonStatus::NotStarted),
            "in_progress" => Ok(LessonStatus::InProgress),
            "completed" => Ok(LessonStatus::Completed),
            other => Err(LessonStatusError::Unknown(other.to_owned())),
        }
    }
}

/// Per-(user, lesson) progress record: completion status plus the last
/// known playback offset. At most one row exists per pair; writes go
/// through an atomic upsert keyed on the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub user_id: UserId,
    pub lesson_id: LessonId,
    pub status: LessonStatus,
    pub last_position_secs: Option<u32>,
    pub updated_at: DateTime<Utc>,
}

/// Per-(user, course) navigational pointer: the last lesson the user
/// visited in the course. Distinct from `Progress` — this tracks where
/// the user *is*, not what they have completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseProgress {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub last_lesson_id: LessonId,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate completion counts for a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CourseStats {
    pub lesson_count: u32,
    pub completed_count: u32,
}

impl CourseStats {
    /// Completion percentage in [0, 100]; 0.0 when the course has no lessons.
    #[must_use]
    pub fn percent(&self) -> f64 {
        completion_percent(self.completed_count, self.lesson_count)
    }
}

/// Plain completion ratio as a percentage, unrounded.
///
/// Every lesson counts equally; a zero denominator yields 0.0, never a
/// division error. Callers round for display.
#[must_use]
pub fn completion_percent(completed: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    100.0 * f64::from(completed) / f64::from(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_empty_course_is_zero() {
        assert_eq!(completion_percent(0, 0), 0.0);
        assert_eq!(CourseStats::default().percent(), 0.0);
    }

    #[test]
    fn percent_stays_in_bounds() {
        for total in 0..=20u32 {
            for completed in 0..=total {
                let pct = completion_percent(completed, total);
                assert!((0.0..=100.0).contains(&pct), "{completed}/{total} -> {pct}");
            }
        }
    }

    #[test]
    fn percent_is_unrounded() {
        let pct = completion_percent(1, 3);
        assert!((pct - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn one_of_five_is_twenty() {
        assert_eq!(completion_percent(1, 5), 20.0);
    }

    #[test]
    fn status_roundtrip() {
        for status in [
            LessonStatus::NotStarted,
            LessonStatus::InProgress,
            LessonStatus::Completed,
        ] {
            assert_eq!(LessonStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(LessonStatus::parse("paused").is_err());
    }

    #[test]
    fn default_status_is_not_started() {
        assert_eq!(LessonStatus::default(), LessonStatus::NotStarted);
    }
}
