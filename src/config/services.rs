//! Backend service configuration

use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::error::ValidationError;
use crate::adapters::rest::RestClientConfig;

/// Where the persistence, rendering and AI services live
#[derive(Debug, Clone, Deserialize)]
pub struct ServicesConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Bearer token for service calls
    pub api_token: Option<Secret<String>>,
}

impl ServicesConfig {
    pub fn base_url(&self) -> Result<Url, ValidationError> {
        Url::parse(&self.base_url).map_err(|_| ValidationError::InvalidUrl {
            field: "services.base_url",
            value: self.base_url.clone(),
        })
    }

    /// Client settings for the REST adapters.
    pub fn rest_client_config(&self) -> Result<RestClientConfig, ValidationError> {
        let mut config = RestClientConfig::new(self.base_url()?)
            .with_timeout(Duration::from_secs(self.request_timeout_secs));
        if let Some(token) = &self.api_token {
            config = config.with_api_token(token.clone());
        }
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = self.base_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ValidationError::InvalidUrl {
                field: "services.base_url",
                value: self.base_url.clone(),
            });
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
            api_token: None,
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_request_timeout() -> u64 {
    30
}
