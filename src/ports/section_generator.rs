//! Section Generator Port - the AI content-generation service.
//!
//! Suggestions are purely additive: the session returns them to the
//! caller and only writes one into the edit buffer when the user
//! explicitly accepts it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port for AI-drafted section text.
#[async_trait]
pub trait SectionGenerator: Send + Sync {
    /// Draft content for one section.
    async fn generate_section(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

/// What the generator is asked to write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Title of the section being drafted.
    pub section_title: String,
    /// Solicitation requirements the section must answer.
    pub requirements: Vec<String>,
    /// Free-form context (win themes, past performance, current draft).
    pub context: String,
}

impl GenerationRequest {
    pub fn new(section_title: impl Into<String>) -> Self {
        Self {
            section_title: section_title.into(),
            requirements: Vec::new(),
            context: String::new(),
        }
    }

    pub fn with_requirement(mut self, requirement: impl Into<String>) -> Self {
        self.requirements.push(requirement.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }
}

/// Errors from the generation service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Rate limited by the service.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Service is unavailable.
    #[error("generation service unavailable: {0}")]
    Unavailable(String),

    /// The service produced no text.
    #[error("generation service returned no content")]
    EmptySuggestion,

    /// Failed to parse the service response.
    #[error("parse error: {0}")]
    Parse(String),
}

impl GenerationError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }
}
