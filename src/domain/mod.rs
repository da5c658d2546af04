//! Domain layer - pure state of the collaborative editing core.
//!
//! Nothing in here performs I/O; the application layer feeds it events
//! and carries its decisions to the ports.

pub mod document;
pub mod foundation;
pub mod presence;
pub mod realtime;
