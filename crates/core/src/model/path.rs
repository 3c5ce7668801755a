use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{PathId, UserId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PathError {
    #[error("path title cannot be empty")]
    EmptyTitle,
}

/// A user-defined learning goal grouping ordered courses.
///
/// Courses are attached through ordered links, not owned directly;
/// deleting a path removes the links but leaves the courses.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    id: PathId,
    owner: UserId,
    title: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl Path {
    /// Creates a new Path.
    ///
    /// Title and description are trimmed; a whitespace-only description
    /// collapses to `None`.
    ///
    /// # Errors
    ///
    /// Returns `PathError::EmptyTitle` if the title is empty or whitespace-only.
    pub fn new(
        id: PathId,
        owner: UserId,
        title: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, PathError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(PathError::EmptyTitle);
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            owner,
            title: title.trim().to_owned(),
            description,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> PathId {
        self.id
    }

    #[must_use]
    pub fn owner(&self) -> UserId {
        self.owner
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
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
