use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{CourseId, PathId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course title cannot be empty")]
    EmptyTitle,

    #[error("unknown course level: {0}")]
    UnknownLevel(String),
}

/// Difficulty level attached to a course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CourseLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl CourseLevel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CourseLevel::Beginner => "beginner",
            CourseLevel::Intermediate => "intermediate",
            CourseLevel::Advanced => "advanced",
        }
    }

    /// Parses a stored level string.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::UnknownLevel` for anything else.
    pub fn parse(s: &str) -> Result<Self, CourseError> {
        match s {
            "beginner" => Ok(CourseLevel::Beginner),
            "intermediate" => Ok(CourseLevel::Intermediate),
            "advanced" => Ok(CourseLevel::Advanced),
            other => Err(CourseError::UnknownLevel(other.to_owned())),
        }
    }
}

/// Typed course metadata: an explicit struct rather than an open-ended bag,
/// so consumers can rely on its shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CourseMeta {
    level: Option<CourseLevel>,
    tags: Vec<String>,
}

impl CourseMeta {
    /// Builds metadata, trimming tags and dropping empties and duplicates.
    /// Tag order is otherwise preserved.
    #[must_use]
    pub fn new(level: Option<CourseLevel>, tags: Vec<String>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let tags = tags
            .into_iter()
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .filter(|t| seen.insert(t.clone()))
            .collect();
        Self { level, tags }
    }

    #[must_use]
    pub fn level(&self) -> Option<CourseLevel> {
        self.level
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// A grouping of ordered lessons.
///
/// A course is not owned by a single path; it is attached to paths via
/// `PathCourseLink`, so the same course may appear in several paths.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    id: CourseId,
    title: String,
    description: Option<String>,
    meta: CourseMeta,
    created_at: DateTime<Utc>,
}

impl Course {
    /// Creates a new Course.
    ///
    /// # Errors
    ///
    /// Returns `CourseError::EmptyTitle` if the title is empty or whitespace-only.
    pub fn new(
        id: CourseId,
        title: impl Into<String>,
        description: Option<String>,
        meta: CourseMeta,
        created_at: DateTime<Utc>,
    ) -> Result<Self, CourseError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(CourseError::EmptyTitle);
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description,
            meta,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> CourseId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn meta(&self) -> &CourseMeta {
        &self.meta
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Ordered attachment of a course to a path.
///
/// `order_index` drives display and traversal order of courses within a
/// path. It is assigned as max(existing) + 1 and unique per (path, course);
/// readers must tolerate gaps or duplicate indexes defensively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathCourseLink {
    pub path_id: PathId,
    pub course_id: CourseId,
    pub order_index: u32,
    pub created_at: DateTime<Utc>,
}
