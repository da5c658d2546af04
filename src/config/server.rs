//! Collaboration hub settings (`PROPOSAL_COLLAB__SERVER__*`).

use serde::Deserialize;
use std::net::SocketAddr;

use super::error::ValidationError;

/// Where the hub listens and how it logs.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,

    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Frames buffered per room before a slow connection starts lagging.
    pub broadcast_capacity: usize,
}

/// Deployment environment. Production switches logs to JSON.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            environment: Environment::Development,
            log_level: "info,proposal_collab=debug,tower_http=debug".to_string(),
            broadcast_capacity: 256,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ValidationError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ValidationError::InvalidSocketAddr(addr))
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.broadcast_capacity == 0 {
            return Err(ValidationError::InvalidCapacity("server.broadcast_capacity"));
        }
        self.socket_addr().map(|_| ())
    }
}
