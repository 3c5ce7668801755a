use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::model::ids::{CourseId, LessonId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LessonError {
    #[error("lesson title cannot be empty")]
    EmptyTitle,

    #[error("invalid source url: {0}")]
    InvalidSource(#[from] url::ParseError),

    #[error("unknown lesson kind: {0}")]
    UnknownKind(String),
}

/// What a lesson links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LessonKind {
    /// A video link (YouTube in practice).
    Video,
    /// A document link (PDF or similar).
    Document,
    /// Any other external link.
    Link,
}

impl LessonKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonKind::Video => "video",
            LessonKind::Document => "document",
            LessonKind::Link => "link",
        }
    }

    /// Parses a stored kind string.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::UnknownKind` for anything else.
    pub fn parse(s: &str) -> Result<Self, LessonError> {
        match s {
            "video" => Ok(LessonKind::Video),
            "document" => Ok(LessonKind::Document),
            "link" => Ok(LessonKind::Link),
            other => Err(LessonError::UnknownKind(other.to_owned())),
        }
    }
}

/// Optional presentation extras for a lesson, as named fields rather than
/// an untyped map.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LessonMeta {
    pub duration_secs: Option<u32>,
    pub thumbnail: Option<String>,
}

/// A single unit of content within a course.
///
/// `order_index` is the sole ordering key within the course; ties are
/// broken by the store's stable secondary sort on id.
#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    id: LessonId,
    course_id: CourseId,
    title: String,
    kind: LessonKind,
    source: Url,
    order_index: u32,
    meta: LessonMeta,
    created_at: DateTime<Utc>,
}

impl Lesson {
    /// Creates a new Lesson from an already-parsed source URL.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::EmptyTitle` if the title is empty or whitespace-only.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: LessonId,
        course_id: CourseId,
        title: impl Into<String>,
        kind: LessonKind,
        source: Url,
        order_index: u32,
        meta: LessonMeta,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LessonError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(LessonError::EmptyTitle);
        }

        Ok(Self {
            id,
            course_id,
            title: title.trim().to_owned(),
            kind,
            source,
            order_index,
            meta,
            created_at,
        })
    }

    /// Creates a new Lesson, parsing the source locator.
    ///
    /// # Errors
    ///
    /// Returns `LessonError::InvalidSource` if the source is not a valid URL,
    /// or `LessonError::EmptyTitle` for a blank title.
    #[allow(clippy::too_many_arguments)]
    pub fn from_raw_source(
        id: LessonId,
        course_id: CourseId,
        title: impl Into<String>,
        kind: LessonKind,
        source: &str,
        order_index: u32,
        meta: LessonMeta,
        created_at: DateTime<Utc>,
    ) -> Result<Self, LessonError> {
        let source = Url::parse(source.trim())?;
        Self::new(id, course_id, title, kind, source, order_index, meta, created_at)
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn kind(&self) -> LessonKind {
        self.kind
    }

    #[must_use]
    pub fn source(&self) -> &Url {
        &self.source
    }

    #[must_use]
    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    #[must_use]
    pub fn meta(&self) -> &LessonMeta {
        &self.meta
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
