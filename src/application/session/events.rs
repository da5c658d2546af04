//! Notifications published by a running session.

use serde::Serialize;

use crate::application::save_pipeline::SaveStatus;
use crate::domain::foundation::{SectionId, UserId};
use crate::domain::realtime::ChannelState;

/// Something observable changed inside the session.
///
/// Delivered over a broadcast channel; slow subscribers may miss events and
/// should fall back to a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SessionEvent {
    ChannelStateChanged {
        state: ChannelState,
    },
    /// A collaborator's write replaced a section's stored content.
    RemoteContentApplied {
        section_id: SectionId,
        user_id: UserId,
    },
    /// A collaborator's write was dropped (active section or unknown id).
    RemoteContentIgnored {
        section_id: SectionId,
        user_id: UserId,
    },
    PresenceChanged {
        collaborators: usize,
    },
    SaveStatusChanged {
        status: SaveStatus,
    },
    SaveFailed {
        section_id: SectionId,
        message: String,
    },
}
