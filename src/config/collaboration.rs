//! Editing session configuration

use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::error::ValidationError;
use crate::application::{LocalUser, SessionConfig};

/// Settings for sessions opened by this process
#[derive(Debug, Clone, Deserialize)]
pub struct CollaborationConfig {
    /// Hub WebSocket base; the document id is appended
    #[serde(default = "default_realtime_url")]
    pub realtime_url: String,

    /// Quiet period before edits are persisted
    #[serde(default = "default_save_debounce_ms")]
    pub save_debounce_ms: u64,

    #[serde(default = "default_command_capacity")]
    pub command_capacity: usize,

    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Realtime queue depth in each direction
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
}

impl CollaborationConfig {
    pub fn save_debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }

    /// Parsed hub URL
    pub fn realtime_url(&self) -> Result<Url, ValidationError> {
        Url::parse(&self.realtime_url).map_err(|_| ValidationError::InvalidUrl {
            field: "collaboration.realtime_url",
            value: self.realtime_url.clone(),
        })
    }

    /// Session settings for `local_user`. Organization fields are left at
    /// their defaults; see `AppConfig::session_config`.
    pub fn session_config(&self, local_user: LocalUser) -> SessionConfig {
        SessionConfig::new(local_user)
            .with_save_debounce(self.save_debounce())
            .with_capacities(self.command_capacity, self.event_capacity)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = self.realtime_url()?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ValidationError::RealtimeUrlNotWebSocket);
        }
        if self.save_debounce_ms == 0 {
            return Err(ValidationError::InvalidDebounce);
        }
        if self.command_capacity == 0 {
            return Err(ValidationError::InvalidCapacity("collaboration.command_capacity"));
        }
        if self.event_capacity == 0 {
            return Err(ValidationError::InvalidCapacity("collaboration.event_capacity"));
        }
        if self.outbound_capacity == 0 {
            return Err(ValidationError::InvalidCapacity("collaboration.outbound_capacity"));
        }
        Ok(())
    }
}

impl Default for CollaborationConfig {
    fn default() -> Self {
        Self {
            realtime_url: default_realtime_url(),
            save_debounce_ms: default_save_debounce_ms(),
            command_capacity: default_command_capacity(),
            event_capacity: default_event_capacity(),
            outbound_capacity: default_outbound_capacity(),
        }
    }
}

fn default_realtime_url() -> String {
    "ws://localhost:8080/ws/documents".to_string()
}

fn default_save_debounce_ms() -> u64 {
    2000
}

fn default_command_capacity() -> usize {
    64
}

fn default_event_capacity() -> usize {
    256
}

fn default_outbound_capacity() -> usize {
    256
}
