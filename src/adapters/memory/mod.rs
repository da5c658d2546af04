//! In-memory adapters.
//!
//! Stand-ins for the external services with call recording and failure
//! injection. Used by the unit and integration tests, and handy for
//! running a session without any backend.

mod document_repository;
mod loopback_connector;
mod mock_renderer;
mod mock_section_generator;

pub use document_repository::{InMemoryDocumentRepository, RecordedSave};
pub use loopback_connector::{LoopbackConnector, LoopbackPeer};
pub use mock_renderer::MockRenderer;
pub use mock_section_generator::MockSectionGenerator;

use std::sync::{Mutex, MutexGuard};

/// Locks a mock's state, recovering it if a test thread panicked mid-update.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
