//! Read model of a session at one instant.

use serde::Serialize;

use crate::application::save_pipeline::SaveStatus;
use crate::domain::document::{DocumentMetadata, Section};
use crate::domain::foundation::{SectionId, UserId};
use crate::domain::presence::{Collaborator, PresenceColor};
use crate::domain::realtime::ChannelState;

/// A collaborator as displayed: cursor already clamped to its section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollaboratorView {
    pub user_id: UserId,
    pub name: String,
    pub color: PresenceColor,
    pub section_id: Option<SectionId>,
    pub offset: usize,
}

impl CollaboratorView {
    /// `section_len` is the current length of the section the cursor was
    /// reported from; without one the offset is shown as reported.
    pub fn new(collaborator: &Collaborator, section_len: Option<usize>) -> Self {
        let offset = match section_len {
            Some(len) => collaborator.clamped_offset(len),
            None => collaborator.cursor.offset,
        };
        Self {
            user_id: collaborator.user_id.clone(),
            name: collaborator.name.clone(),
            color: collaborator.color,
            section_id: collaborator.cursor.section_id.clone(),
            offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub metadata: DocumentMetadata,
    /// Stored sections in ascending order. The active one holds its last
    /// committed text; see `buffer` for what is being typed.
    pub sections: Vec<Section>,
    pub active_section: Option<SectionId>,
    pub buffer: Option<String>,
    pub collaborators: Vec<CollaboratorView>,
    pub save_status: SaveStatus,
    pub channel_state: ChannelState,
}

impl SessionSnapshot {
    /// Stored content of a section.
    pub fn section_content(&self, id: &SectionId) -> Option<&str> {
        self.sections
            .iter()
            .find(|section| &section.id == id)
            .map(|section| section.content.as_str())
    }

    pub fn collaborator(&self, user_id: &UserId) -> Option<&CollaboratorView> {
        self.collaborators.iter().find(|c| &c.user_id == user_id)
    }
}
