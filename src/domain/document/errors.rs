//! Errors raised by the section store and navigator.

use thiserror::Error;

use crate::domain::foundation::SectionId;

/// Misuse of the document workspace.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkspaceError {
    #[error("Section not found: {0}")]
    UnknownSection(SectionId),

    #[error("Section id appears more than once: {0}")]
    DuplicateSection(SectionId),

    #[error("No section is active")]
    NoActiveSection,
}
