//! Presence module - who else is in the document and where their cursor is.

mod tracker;

pub use tracker::{Collaborator, CursorLocation, PresenceColor, PresenceTracker, PRESENCE_PALETTE};
