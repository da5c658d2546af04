//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `PROPOSAL_COLLAB` prefix
//! and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use proposal_collab::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Hub listening on {}", config.server.socket_addr().unwrap());
//! ```

mod collaboration;
mod error;
mod export;
mod server;
mod services;

pub use collaboration::CollaborationConfig;
pub use error::{ConfigError, ValidationError};
pub use export::ExportConfig;
pub use server::{Environment, ServerConfig};
pub use services::ServicesConfig;

use serde::Deserialize;

use crate::application::{LocalUser, SessionConfig};

/// Everything the hub binary and a session host need.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Hub server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Editing session settings (hub URL, save debounce, queue sizes)
    #[serde(default)]
    pub collaboration: CollaborationConfig,

    /// Backend services (persistence, rendering, AI)
    #[serde(default)]
    pub services: ServicesConfig,

    /// Organizational fields stamped on exports
    pub export: ExportConfig,
}

impl AppConfig {
    /// Reads `.env` (if any) and then the process environment.
    ///
    /// `PROPOSAL_COLLAB__SERVER__PORT=8080` sets `server.port`;
    /// `PROPOSAL_COLLAB__EXPORT__ORGANIZATION_NAME` is the only variable
    /// without a default.
    ///
    /// # Errors
    ///
    /// `ConfigError::LoadError` when a value is missing or does not parse.
    /// Range checks happen in [`validate`](Self::validate).
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PROPOSAL_COLLAB")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Checks every section, stopping at the first problem.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.collaboration.validate()?;
        self.services.validate()?;
        self.export.validate()?;
        Ok(())
    }

    /// Session settings for `local_user`, including export organization.
    pub fn session_config(&self, local_user: LocalUser) -> SessionConfig {
        self.collaboration
            .session_config(local_user)
            .with_organization(self.export.organization())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
