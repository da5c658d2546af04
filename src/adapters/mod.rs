//! Adapters - Implementations of port interfaces.
//!
//! - [`rest`] - HTTP clients for the persistence, rendering and AI services
//! - [`realtime`] - WebSocket client for the collaboration hub
//! - [`hub`] - The collaboration hub server (axum)
//! - [`memory`] - In-memory stand-ins with call recording, for tests

pub mod hub;
pub mod memory;
pub mod realtime;
pub mod rest;
