//! Collaboration hub: the server end of the realtime channel.
//!
//! ```text
//! client ──ws──▶ ws_handler ──join──▶ RoomManager ──broadcast──▶ other clients
//! ```
//!
//! - [`rooms`] - per-document rooms with their roster
//! - [`handler`] - axum upgrade handler and router

pub mod handler;
pub mod rooms;

pub use handler::{hub_router, ws_handler, ConnectParams, HubState};
pub use rooms::{ConnectionId, Joined, RoomFrame, RoomManager};
