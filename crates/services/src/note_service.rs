use std::sync::Arc;

use pathway_core::model::{LessonId, Note};
use storage::repository::NoteRepository;

use crate::Clock;
use crate::Session;
use crate::error::NoteServiceError;

/// One free-form note per (user, lesson), saved whole on every edit.
#[derive(Clone)]
pub struct NoteService {
    clock: Clock,
    notes: Arc<dyn NoteRepository>,
}

impl NoteService {
    #[must_use]
    pub fn new(clock: Clock, notes: Arc<dyn NoteRepository>) -> Self {
        Self { clock, notes }
    }

    /// Save the session user's note for a lesson, replacing any previous
    /// content in one atomic upsert. Returns the stored note; its
    /// creation time is preserved across edits.
    ///
    /// # Errors
    ///
    /// Returns `NoteServiceError::Unauthenticated` for an anonymous
    /// session, or `Storage` if the upsert fails.
    pub async fn save_note(
        &self,
        session: Session,
        lesson_id: LessonId,
        content: &str,
    ) -> Result<Note, NoteServiceError> {
        let user = session.user_id().ok_or(NoteServiceError::Unauthenticated)?;
        let now = self.clock.now();
        let note = self.notes.upsert_note(user, lesson_id, content, now).await?;
        Ok(note)
    }

    /// The session user's note for a lesson, if one exists. Anonymous
    /// sessions have no notes.
    ///
    /// # Errors
    ///
    /// Returns `NoteServiceError::Storage` if repository access fails.
    pub async fn note_for_lesson(
        &self,
        session: Session,
        lesson_id: LessonId,
    ) -> Result<Option<Note>, NoteServiceError> {
        let Some(user) = session.user_id() else {
            return Ok(None);
        };
        let note = self.notes.get_note(user, lesson_id).await?;
        Ok(note)
    }
}
