//! Rendering service over REST.

use async_trait::async_trait;

use super::client::{describe, RestClient};
use crate::ports::{DocumentExportService, ExportError, ExportRequest};

/// [`DocumentExportService`] that posts the snapshot and returns the body.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: RestClient,
}

impl HttpRenderer {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentExportService for HttpRenderer {
    async fn render(&self, request: &ExportRequest) -> Result<Vec<u8>, ExportError> {
        let url = self.client.endpoint(&["export", request.format.extension()]);
        let response = self
            .client
            .post(url)
            .json(&request.document)
            .send()
            .await
            .map_err(|e| ExportError::service_unavailable(describe(&e, self.client.timeout())))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ExportError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExportError::service_unavailable(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
