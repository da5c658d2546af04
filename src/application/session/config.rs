//! Per-session settings.

use std::time::Duration;

use crate::application::save_pipeline::DEFAULT_SAVE_DEBOUNCE;
use crate::domain::foundation::UserId;
use crate::ports::OrganizationProfile;

/// The user driving this session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUser {
    pub id: UserId,
    pub name: String,
}

impl LocalUser {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Tuning for one editing session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub local_user: LocalUser,
    /// Quiet period before edits are persisted.
    pub save_debounce: Duration,
    /// Queue depth between handles and the session task.
    pub command_capacity: usize,
    /// Buffered events per subscriber before it starts lagging.
    pub event_capacity: usize,
    /// Fixed fields stamped on exports.
    pub organization: OrganizationProfile,
}

impl SessionConfig {
    pub fn new(local_user: LocalUser) -> Self {
        Self {
            local_user,
            save_debounce: DEFAULT_SAVE_DEBOUNCE,
            command_capacity: 64,
            event_capacity: 256,
            organization: OrganizationProfile::default(),
        }
    }

    pub fn with_save_debounce(mut self, debounce: Duration) -> Self {
        self.save_debounce = debounce;
        self
    }

    pub fn with_capacities(mut self, commands: usize, events: usize) -> Self {
        self.command_capacity = commands;
        self.event_capacity = events;
        self
    }

    pub fn with_organization(mut self, organization: OrganizationProfile) -> Self {
        self.organization = organization;
        self
    }
}
