//! Realtime module - the collaboration wire protocol and channel lifecycle.
//!
//! - [`messages`] - tagged message envelope exchanged with the hub
//! - [`channel_state`] - connection state machine of a realtime channel

pub mod channel_state;
pub mod messages;

pub use channel_state::ChannelState;
pub use messages::{ActiveUser, ProtocolError, RealtimeMessage};
