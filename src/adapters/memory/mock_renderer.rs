//! Mock rendering service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::lock;
use crate::ports::{DocumentExportService, ExportError, ExportRequest};

/// Returns queued results in order, then a fixed placeholder artifact.
#[derive(Debug, Clone, Default)]
pub struct MockRenderer {
    responses: Arc<Mutex<VecDeque<Result<Vec<u8>, ExportError>>>>,
    requests: Arc<Mutex<Vec<ExportRequest>>>,
}

impl MockRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifact(self, content: Vec<u8>) -> Self {
        lock(&self.responses).push_back(Ok(content));
        self
    }

    pub fn with_error(self, error: ExportError) -> Self {
        lock(&self.responses).push_back(Err(error));
        self
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ExportRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl DocumentExportService for MockRenderer {
    async fn render(&self, request: &ExportRequest) -> Result<Vec<u8>, ExportError> {
        lock(&self.requests).push(request.clone());

        lock(&self.responses).pop_front().unwrap_or_else(|| {
            Ok(format!("{} ({})", request.document.title, request.format).into_bytes())
        })
    }
}
