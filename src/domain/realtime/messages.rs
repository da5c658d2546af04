//! Realtime message types for collaborative editing.
//!
//! Every frame is a JSON object whose `type` field selects the variant:
//!
//! ```text
//! { "type": "content_changed", "user_id": "u1", "section_id": "s2", "content": "..." }
//! { "type": "cursor_update",   "user_id": "u1", "section_id": "s2", "cursor_position": 14 }
//! { "type": "user_joined",     "user_id": "u1", "user_name": "Alice" }
//! { "type": "user_left",       "user_id": "u1" }
//! { "type": "initial_state",   "active_users": [ { "user_id", "user_name", "position" } ] }
//! ```
//!
//! The same enum is used in both directions; clients only ever originate
//! `content_changed` and `cursor_update`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{SectionId, UserId};

/// A message on the realtime channel. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeMessage {
    /// A collaborator connected to the document.
    UserJoined {
        user_id: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_name: Option<String>,
    },

    /// A collaborator disconnected.
    UserLeft { user_id: UserId },

    /// Full replacement text of one section.
    ContentChanged {
        user_id: UserId,
        section_id: SectionId,
        content: String,
    },

    /// Cursor offset (characters) of a collaborator.
    CursorUpdate {
        user_id: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        section_id: Option<SectionId>,
        #[serde(rename = "cursor_position")]
        position: usize,
    },

    /// Roster sent by the hub right after the handshake.
    InitialState {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<UserId>,
        #[serde(default)]
        active_users: Vec<ActiveUser>,
    },
}

/// One roster entry of an `initial_state` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveUser {
    pub user_id: UserId,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<SectionId>,
}

impl ActiveUser {
    pub fn new(user_id: UserId, user_name: impl Into<String>, position: usize) -> Self {
        Self {
            user_id,
            user_name: Some(user_name.into()),
            position,
            section_id: None,
        }
    }
}

/// A frame that could not be decoded or encoded.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed realtime message: {0}")]
    Malformed(#[source] serde_json::Error),

    #[error("Failed to encode realtime message: {0}")]
    Encode(#[source] serde_json::Error),
}

impl RealtimeMessage {
    /// Decodes a text frame.
    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }

    /// Encodes for a text frame.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// The wire `type` tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            RealtimeMessage::UserJoined { .. } => "user_joined",
            RealtimeMessage::UserLeft { .. } => "user_left",
            RealtimeMessage::ContentChanged { .. } => "content_changed",
            RealtimeMessage::CursorUpdate { .. } => "cursor_update",
            RealtimeMessage::InitialState { .. } => "initial_state",
        }
    }

    /// The user the message is about or from.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            RealtimeMessage::UserJoined { user_id, .. }
            | RealtimeMessage::UserLeft { user_id }
            | RealtimeMessage::ContentChanged { user_id, .. }
            | RealtimeMessage::CursorUpdate { user_id, .. } => Some(user_id),
            RealtimeMessage::InitialState { user_id, .. } => user_id.as_ref(),
        }
    }

    /// Overwrites the sender; the hub uses this so clients cannot speak
    /// for someone else.
    pub fn with_sender(mut self, sender: UserId) -> Self {
        match &mut self {
            RealtimeMessage::UserJoined { user_id, .. }
            | RealtimeMessage::UserLeft { user_id }
            | RealtimeMessage::ContentChanged { user_id, .. }
            | RealtimeMessage::CursorUpdate { user_id, .. } => *user_id = sender,
            RealtimeMessage::InitialState { user_id, .. } => *user_id = Some(sender),
        }
        self
    }

    /// True for the two message kinds a client may originate.
    pub fn is_client_originated(&self) -> bool {
        matches!(
            self,
            RealtimeMessage::ContentChanged { .. } | RealtimeMessage::CursorUpdate { .. }
        )
    }
}
