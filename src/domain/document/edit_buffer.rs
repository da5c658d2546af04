//! The live text of the active section.

use crate::domain::foundation::SectionId;

/// The single mutable text value bound to the active section.
///
/// It is decoupled from the [`SectionStore`](super::SectionStore) until
/// the workspace commits it on a switch, a debounce flush or session end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditBuffer {
    section_id: SectionId,
    content: String,
}

impl EditBuffer {
    pub fn new(section_id: SectionId, content: impl Into<String>) -> Self {
        Self {
            section_id,
            content: content.into(),
        }
    }

    pub fn section_id(&self) -> &SectionId {
        &self.section_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// Replaces the whole buffer with the editor's current text.
    pub fn replace(&mut self, content: impl Into<String>) {
        self.content = content.into();
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
