//! Document module - the section-addressable proposal model.
//!
//! A [`Document`] is loaded once per editing session. Its sections live
//! in a [`SectionStore`]; the section being typed into is mirrored in an
//! [`EditBuffer`]; [`DocumentWorkspace`] ties the two together and is the
//! only place that moves text between them.

mod edit_buffer;
mod errors;
mod merge_policy;
mod section;
mod store;
mod workspace;

pub use edit_buffer::EditBuffer;
pub use errors::WorkspaceError;
pub use merge_policy::{LastWriterWins, MergeDecision, MergePolicy};
pub use section::{Document, DocumentMetadata, DocumentStatus, Section};
pub use store::SectionStore;
pub use workspace::{Activation, DocumentWorkspace, RemoteChangeOutcome};
