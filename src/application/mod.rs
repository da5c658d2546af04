//! Application layer - the editing session and its pipelines.
//!
//! The session task orchestrates the domain (workspace, presence) and the
//! ports (persistence, rendering, generation, realtime). The save pipeline,
//! realtime channel and export orchestrator are the pieces it drives.

pub mod export;
pub mod realtime_channel;
pub mod save_pipeline;
pub mod session;

pub use export::ExportOrchestrator;
pub use realtime_channel::RealtimeChannel;
pub use save_pipeline::{SaveJob, SavePipeline, SaveStatus, DEFAULT_SAVE_DEBOUNCE};
pub use session::{
    CollaboratorView, EditingSession, LocalUser, SessionConfig, SessionError, SessionEvent,
    SessionServices, SessionSnapshot,
};
