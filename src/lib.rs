//! Proposal Collab - real-time collaborative section editing for proposals
//!
//! Multiple users edit different sections of the same proposal at once,
//! see each other's cursors, and have their edits broadcast immediately and
//! persisted after a quiet period. The crate holds the editing core
//! (sessions, save pipeline, presence, realtime protocol), adapters for the
//! backend services, and the collaboration hub server.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
