//! Persistence service over REST.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use super::client::{describe, RestClient};
use crate::domain::document::Document;
use crate::domain::foundation::{DocumentId, SectionId};
use crate::ports::{DocumentRepository, DocumentStoreError};

#[derive(Debug, Serialize)]
struct SaveSectionBody<'a> {
    content: &'a str,
}

/// [`DocumentRepository`] backed by the proposals API.
#[derive(Debug, Clone)]
pub struct HttpDocumentRepository {
    client: RestClient,
}

impl HttpDocumentRepository {
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn transport_error(&self, error: reqwest::Error) -> DocumentStoreError {
        DocumentStoreError::unavailable(describe(&error, self.client.timeout()))
    }
}

/// Maps a non-success status; `not_found` covers 404.
fn status_error(status: StatusCode, body: String, not_found: DocumentStoreError) -> DocumentStoreError {
    match status {
        StatusCode::NOT_FOUND => not_found,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DocumentStoreError::Unauthorized,
        _ => DocumentStoreError::Service {
            status: status.as_u16(),
            message: body,
        },
    }
}

#[async_trait]
impl DocumentRepository for HttpDocumentRepository {
    async fn load_document(&self, document_id: &DocumentId) -> Result<Document, DocumentStoreError> {
        let url = self.client.endpoint(&["proposals", document_id.as_str()]);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(
                status,
                body,
                DocumentStoreError::DocumentNotFound(document_id.clone()),
            ));
        }

        response
            .json::<Document>()
            .await
            .map_err(|e| DocumentStoreError::InvalidResponse(e.to_string()))
    }

    async fn save_section(
        &self,
        document_id: &DocumentId,
        section_id: &SectionId,
        content: &str,
    ) -> Result<(), DocumentStoreError> {
        let url = self.client.endpoint(&[
            "proposals",
            document_id.as_str(),
            "sections",
            section_id.as_str(),
        ]);
        let response = self
            .client
            .put(url)
            .json(&SaveSectionBody { content })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(
            status,
            body,
            DocumentStoreError::SectionNotFound(section_id.clone()),
        ))
    }
}
