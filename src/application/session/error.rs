//! Errors a session surfaces to its callers.
//!
//! Save and channel failures never show up here; they are reported through
//! `SaveStatus`, `ChannelState` and `SessionEvent`.

use thiserror::Error;

use crate::domain::document::WorkspaceError;
use crate::domain::foundation::SectionId;
use crate::ports::{DocumentStoreError, ExportError, GenerationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The document could not be loaded. Fatal to the session.
    #[error("failed to load document: {0}")]
    Load(#[from] DocumentStoreError),

    /// The loaded document is not editable (e.g. duplicate section ids).
    #[error("document cannot be edited: {0}")]
    InvalidDocument(WorkspaceError),

    #[error("export failed: {0}")]
    Export(#[from] ExportError),

    #[error("suggestion failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("section not found: {0}")]
    SectionNotFound(SectionId),

    #[error("no section is active")]
    NoActiveSection,

    /// The session task has shut down.
    #[error("editing session is closed")]
    Closed,
}

impl From<WorkspaceError> for SessionError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::UnknownSection(id) => SessionError::SectionNotFound(id),
            WorkspaceError::NoActiveSection => SessionError::NoActiveSection,
            other => SessionError::InvalidDocument(other),
        }
    }
}
