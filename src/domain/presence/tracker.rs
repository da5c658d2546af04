//! Presence tracking for collaborative editing sessions.
//!
//! The tracker is observed state: it mirrors `user_joined`, `cursor_update`,
//! `user_left` and `initial_state` messages and never originates any.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::domain::foundation::{SectionId, Timestamp, UserId};
use crate::domain::realtime::ActiveUser;

/// An assigned collaborator colour (RGB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresenceColor(pub u32);

impl PresenceColor {
    /// CSS-style `#rrggbb`.
    pub fn to_hex(self) -> String {
        format!("#{:06x}", self.0 & 0x00FF_FFFF)
    }
}

impl fmt::Display for PresenceColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for PresenceColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

/// Colours handed out round-robin as collaborators appear.
pub const PRESENCE_PALETTE: [PresenceColor; 8] = [
    PresenceColor(0xFF6B6B), // red
    PresenceColor(0x4ECDC4), // teal
    PresenceColor(0xFFB400), // amber
    PresenceColor(0x6A4C93), // purple
    PresenceColor(0x1982C4), // blue
    PresenceColor(0x8AC926), // green
    PresenceColor(0xF38181), // coral
    PresenceColor(0x2EC4B6), // cyan
];

/// Last reported cursor of a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct CursorLocation {
    /// Section the offset was reported from, when the hub said so.
    pub section_id: Option<SectionId>,
    /// Character offset within that section.
    pub offset: usize,
}

/// Another user in the same document.
#[derive(Debug, Clone, Serialize)]
pub struct Collaborator {
    pub user_id: UserId,
    pub name: String,
    pub color: PresenceColor,
    pub cursor: CursorLocation,
    pub updated_at: Timestamp,
}

impl Collaborator {
    /// Cursor offset limited to a section's current length.
    ///
    /// Offsets are never validated when reported, and content keeps
    /// changing underneath them.
    pub fn clamped_offset(&self, section_len: usize) -> usize {
        self.cursor.offset.min(section_len)
    }
}

/// Roster of the other collaborators in a session.
///
/// Events about the local user are ignored, so the roster only ever holds
/// other people.
#[derive(Debug, Clone)]
pub struct PresenceTracker {
    local_user: UserId,
    collaborators: HashMap<UserId, Collaborator>,
    next_color_index: usize,
}

impl PresenceTracker {
    pub fn new(local_user: UserId) -> Self {
        Self {
            local_user,
            collaborators: HashMap::new(),
            next_color_index: 0,
        }
    }

    pub fn local_user(&self) -> &UserId {
        &self.local_user
    }

    /// Replaces the whole roster with the hub's `initial_state`.
    pub fn seed(&mut self, roster: impl IntoIterator<Item = ActiveUser>) {
        let previous = std::mem::take(&mut self.collaborators);

        for user in roster {
            if user.user_id == self.local_user {
                continue;
            }
            let color = previous
                .get(&user.user_id)
                .map(|c| c.color)
                .unwrap_or_else(|| self.assign_color());
            self.collaborators.insert(
                user.user_id.clone(),
                Collaborator {
                    name: display_name(&user.user_id, user.user_name),
                    user_id: user.user_id,
                    color,
                    cursor: CursorLocation {
                        section_id: user.section_id,
                        offset: user.position,
                    },
                    updated_at: Timestamp::now(),
                },
            );
        }
    }

    /// Adds or replaces a collaborator. The cursor starts at offset 0.
    ///
    /// Returns `false` if the event was about the local user.
    pub fn on_join(&mut self, user_id: UserId, name: Option<String>) -> bool {
        if user_id == self.local_user {
            return false;
        }
        let color = match self.collaborators.get(&user_id) {
            Some(existing) => existing.color,
            None => self.assign_color(),
        };
        self.collaborators.insert(
            user_id.clone(),
            Collaborator {
                name: display_name(&user_id, name),
                user_id,
                color,
                cursor: CursorLocation::default(),
                updated_at: Timestamp::now(),
            },
        );
        true
    }

    /// Records a collaborator's new cursor offset.
    ///
    /// Returns `false` for the local user and for users who never joined.
    pub fn on_cursor_update(
        &mut self,
        user_id: &UserId,
        section_id: Option<SectionId>,
        offset: usize,
    ) -> bool {
        match self.collaborators.get_mut(user_id) {
            Some(collaborator) => {
                collaborator.cursor = CursorLocation { section_id, offset };
                collaborator.updated_at = Timestamp::now();
                true
            }
            None => false,
        }
    }

    /// Removes a collaborator. Returns `true` if they were present.
    pub fn on_leave(&mut self, user_id: &UserId) -> bool {
        self.collaborators.remove(user_id).is_some()
    }

    pub fn get(&self, user_id: &UserId) -> Option<&Collaborator> {
        self.collaborators.get(user_id)
    }

    /// Collaborators sorted by display name, then id.
    pub fn roster(&self) -> Vec<&Collaborator> {
        let mut roster: Vec<&Collaborator> = self.collaborators.values().collect();
        roster.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.user_id.cmp(&b.user_id)));
        roster
    }

    pub fn len(&self) -> usize {
        self.collaborators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collaborators.is_empty()
    }

    fn assign_color(&mut self) -> PresenceColor {
        let color = PRESENCE_PALETTE[self.next_color_index % PRESENCE_PALETTE.len()];
        self.next_color_index += 1;
        color
    }
}

fn display_name(user_id: &UserId, name: Option<String>) -> String {
    match name {
        Some(name) if !name.trim().is_empty() => name,
        _ => user_id.to_string(),
    }
}
