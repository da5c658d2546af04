//! Mock AI content generator.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use super::lock;
use crate::ports::{GenerationError, GenerationRequest, SectionGenerator};

/// Pre-configured suggestions, consumed in order.
#[derive(Debug, Clone, Default)]
pub struct MockSectionGenerator {
    responses: Arc<Mutex<VecDeque<Result<String, GenerationError>>>>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
    delay: Duration,
}

impl MockSectionGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, content: impl Into<String>) -> Self {
        lock(&self.responses).push_back(Ok(content.into()));
        self
    }

    pub fn with_error(self, error: GenerationError) -> Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    /// Simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl SectionGenerator for MockSectionGenerator {
    async fn generate_section(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let title = request.section_title.clone();
        lock(&self.calls).push(request);

        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| Ok(format!("Draft for {title}.")))
    }
}
