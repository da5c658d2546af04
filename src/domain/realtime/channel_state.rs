//! Connection lifecycle of a realtime channel.
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──handshake ok──▶ Open
//!       ▲                        │                         │
//!       └───────── error ────────┘◀──── close / error ─────┘
//! ```
//!
//! There is no reconnecting state: a closed channel stays closed and the
//! session keeps working without collaboration.

use serde::Serialize;
use std::fmt;

use crate::domain::foundation::StateMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Open,
}

impl ChannelState {
    pub fn is_open(&self) -> bool {
        matches!(self, ChannelState::Open)
    }
}

impl StateMachine for ChannelState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ChannelState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Open)
                | (Connecting, Disconnected)
                | (Open, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ChannelState::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Open, Disconnected],
            Open => vec![Disconnected],
        }
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChannelState::Disconnected => "disconnected",
            ChannelState::Connecting => "connecting",
            ChannelState::Open => "open",
        };
        f.write_str(s)
    }
}
