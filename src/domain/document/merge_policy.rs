//! Policy for applying remote `content_changed` messages.
//!
//! Every remote write to the section store is routed through a
//! [`MergePolicy`], so a CRDT-backed text type can replace
//! [`LastWriterWins`] without touching the session or the protocol.

use std::fmt;

use crate::domain::foundation::SectionId;

/// What to do with an incoming remote change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// Replace the stored content with the remote content.
    Overwrite,
    /// Leave the stored content alone.
    Skip,
}

/// Decides how a remote change to `target` is applied.
pub trait MergePolicy: Send + Sync + fmt::Debug {
    fn decide(&self, target: &SectionId, active: Option<&SectionId>) -> MergeDecision;
}

/// The most recently processed change wins; no merge.
///
/// Changes aimed at the locally active section are skipped so the local
/// edit buffer is never clobbered. Two users typing in the same section
/// therefore diverge until one of them switches away.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastWriterWins;

impl MergePolicy for LastWriterWins {
    fn decide(&self, target: &SectionId, active: Option<&SectionId>) -> MergeDecision {
        if active == Some(target) {
            MergeDecision::Skip
        } else {
            MergeDecision::Overwrite
        }
    }
}
