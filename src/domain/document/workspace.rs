//! Section navigator: the edit buffer and the store, kept coherent.
//!
//! All text movement between the [`EditBuffer`] and the [`SectionStore`]
//! happens here:
//!
//! - `activate` commits the outgoing buffer, then loads the incoming section
//! - `commit_buffer` writes the buffer back without switching
//! - `apply_remote_change` routes a collaborator's write through the
//!   [`MergePolicy`]
//!
//! The workspace is owned by a single session task, so a commit can never
//! interleave with a remote write or an export read.

use crate::domain::foundation::SectionId;

use super::{
    Document, DocumentMetadata, EditBuffer, LastWriterWins, MergeDecision, MergePolicy, Section,
    SectionStore, WorkspaceError,
};

/// Result of switching the active section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    /// Section whose buffer was committed, if one was active.
    pub previous: Option<SectionId>,
    /// Section now bound to the buffer.
    pub current: SectionId,
}

/// What happened to a remote `content_changed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteChangeOutcome {
    /// Stored content was overwritten.
    Applied,
    /// The policy declined the write (the section is active locally).
    Skipped,
    /// No section with that id exists in this document.
    UnknownSection,
}

/// A loaded document plus the buffer of its active section.
#[derive(Debug)]
pub struct DocumentWorkspace {
    metadata: DocumentMetadata,
    store: SectionStore,
    buffer: Option<EditBuffer>,
    policy: Box<dyn MergePolicy>,
}

impl DocumentWorkspace {
    /// Builds a workspace with the last-writer-wins policy and activates
    /// the first section, if any.
    pub fn load(document: Document) -> Result<Self, WorkspaceError> {
        Self::with_policy(document, Box::new(LastWriterWins))
    }

    /// Builds a workspace with a custom merge policy.
    pub fn with_policy(
        document: Document,
        policy: Box<dyn MergePolicy>,
    ) -> Result<Self, WorkspaceError> {
        let store = SectionStore::from_sections(document.sections)?;
        let buffer = store
            .first()
            .map(|first| EditBuffer::new(first.id.clone(), first.content.clone()));

        Ok(Self {
            metadata: document.metadata,
            store,
            buffer,
            policy,
        })
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn store(&self) -> &SectionStore {
        &self.store
    }

    pub fn buffer(&self) -> Option<&EditBuffer> {
        self.buffer.as_ref()
    }

    pub fn active_section(&self) -> Option<&SectionId> {
        self.buffer.as_ref().map(EditBuffer::section_id)
    }

    /// Makes `target` the active section.
    ///
    /// The outgoing buffer is committed to the store before the incoming
    /// section's stored content is copied into a fresh buffer. Activating
    /// the section that is already active only commits its buffer.
    ///
    /// # Errors
    ///
    /// `UnknownSection` leaves the workspace untouched.
    pub fn activate(&mut self, target: &SectionId) -> Result<Activation, WorkspaceError> {
        let incoming = self
            .store
            .content(target)
            .ok_or_else(|| WorkspaceError::UnknownSection(target.clone()))?
            .to_string();

        if self.active_section() == Some(target) {
            self.commit_buffer();
            return Ok(Activation {
                previous: Some(target.clone()),
                current: target.clone(),
            });
        }

        let previous = self.commit_buffer();
        self.buffer = Some(EditBuffer::new(target.clone(), incoming));

        Ok(Activation {
            previous,
            current: target.clone(),
        })
    }

    /// Replaces the active buffer's text and returns the active section id.
    pub fn edit(&mut self, content: impl Into<String>) -> Result<&SectionId, WorkspaceError> {
        let buffer = self.buffer.as_mut().ok_or(WorkspaceError::NoActiveSection)?;
        buffer.replace(content);
        Ok(buffer.section_id())
    }

    /// Writes the buffer into its section's stored content.
    ///
    /// Returns the committed section id, or `None` when nothing is active.
    pub fn commit_buffer(&mut self) -> Option<SectionId> {
        let buffer = self.buffer.as_ref()?;
        let id = buffer.section_id().clone();
        // The buffer is always bound to a section that exists in the store.
        self.store.set_content(&id, buffer.content()).ok()?;
        Some(id)
    }

    /// Applies a collaborator's write to `target` according to the policy.
    pub fn apply_remote_change(
        &mut self,
        target: &SectionId,
        content: impl Into<String>,
    ) -> RemoteChangeOutcome {
        if !self.store.contains(target) {
            return RemoteChangeOutcome::UnknownSection;
        }

        match self.policy.decide(target, self.active_section()) {
            MergeDecision::Skip => RemoteChangeOutcome::Skipped,
            MergeDecision::Overwrite => match self.store.set_content(target, content) {
                Ok(()) => RemoteChangeOutcome::Applied,
                Err(_) => RemoteChangeOutcome::UnknownSection,
            },
        }
    }

    /// Current length in characters of a section as the user sees it: the
    /// buffer for the active section, the store for the rest.
    pub fn visible_char_len(&self, id: &SectionId) -> Option<usize> {
        match &self.buffer {
            Some(buffer) if buffer.section_id() == id => Some(buffer.char_len()),
            _ => self.store.get(id).map(Section::char_len),
        }
    }

    /// Commits the buffer and returns every section in ascending `order`.
    pub fn committed_sections(&mut self) -> Vec<&Section> {
        self.commit_buffer();
        self.store.ordered()
    }
}
