//! AI content generation over REST.

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Response, StatusCode};
use serde::Deserialize;

use super::client::{describe, RestClient};
use crate::ports::{GenerationError, GenerationRequest, SectionGenerator};

/// Used when a 429 carries no usable `Retry-After`.
const DEFAULT_RETRY_AFTER_SECS: u32 = 60;

#[derive(Debug, Deserialize)]
struct GenerateSectionResponse {
    content: String,
}

/// [`SectionGenerator`] backed by `POST /ai/generate-section`.
#[derive(Debug, Clone)]
pub struct HttpSectionGenerator {
    client: RestClient,
}

impl HttpSectionGenerator {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    async fn handle_response_status(response: Response) -> Result<Response, GenerationError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return Err(GenerationError::RateLimited { retry_after_secs });
        }

        let body = response.text().await.unwrap_or_default();
        Err(GenerationError::unavailable(format!("status {status}: {body}")))
    }
}

#[async_trait]
impl SectionGenerator for HttpSectionGenerator {
    async fn generate_section(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        let url = self.client.endpoint(&["ai", "generate-section"]);
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::unavailable(describe(&e, self.client.timeout())))?;
        let response = Self::handle_response_status(response).await?;

        let parsed: GenerateSectionResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::Parse(e.to_string()))?;

        if parsed.content.trim().is_empty() {
            return Err(GenerationError::EmptySuggestion);
        }
        Ok(parsed.content)
    }
}
