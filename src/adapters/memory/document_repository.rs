//! In-memory persistence service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use super::lock;
use crate::domain::document::Document;
use crate::domain::foundation::{DocumentId, SectionId};
use crate::ports::{DocumentRepository, DocumentStoreError};

/// One `save_section` call as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSave {
    pub document_id: DocumentId,
    pub section_id: SectionId,
    pub content: String,
}

#[derive(Debug, Default)]
struct State {
    documents: HashMap<DocumentId, Document>,
    saves: Vec<RecordedSave>,
    save_error: Option<DocumentStoreError>,
}

/// Documents held in a map. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentRepository {
    state: Arc<Mutex<State>>,
    save_delay: Duration,
}

impl InMemoryDocumentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, document: Document) -> Self {
        self.insert(document);
        self
    }

    /// Simulated latency of every save.
    pub fn with_save_delay(mut self, delay: Duration) -> Self {
        self.save_delay = delay;
        self
    }

    pub fn insert(&self, document: Document) {
        lock(&self.state)
            .documents
            .insert(document.metadata.id.clone(), document);
    }

    /// Makes every following save fail with `error` (`None` to recover).
    pub fn fail_saves(&self, error: Option<DocumentStoreError>) {
        lock(&self.state).save_error = error;
    }

    /// Every save attempt, failed ones included, in call order.
    pub fn saves(&self) -> Vec<RecordedSave> {
        lock(&self.state).saves.clone()
    }

    /// Stored content of one section.
    pub fn section_content(&self, document_id: &DocumentId, section_id: &SectionId) -> Option<String> {
        lock(&self.state)
            .documents
            .get(document_id)?
            .sections
            .iter()
            .find(|section| &section.id == section_id)
            .map(|section| section.content.clone())
    }
}

#[async_trait]
impl DocumentRepository for InMemoryDocumentRepository {
    async fn load_document(&self, document_id: &DocumentId) -> Result<Document, DocumentStoreError> {
        lock(&self.state)
            .documents
            .get(document_id)
            .cloned()
            .ok_or_else(|| DocumentStoreError::DocumentNotFound(document_id.clone()))
    }

    async fn save_section(
        &self,
        document_id: &DocumentId,
        section_id: &SectionId,
        content: &str,
    ) -> Result<(), DocumentStoreError> {
        if !self.save_delay.is_zero() {
            sleep(self.save_delay).await;
        }

        let mut state = lock(&self.state);
        state.saves.push(RecordedSave {
            document_id: document_id.clone(),
            section_id: section_id.clone(),
            content: content.to_string(),
        });
        if let Some(err) = state.save_error.clone() {
            return Err(err);
        }

        let document = state
            .documents
            .get_mut(document_id)
            .ok_or_else(|| DocumentStoreError::DocumentNotFound(document_id.clone()))?;
        let section = document
            .sections
            .iter_mut()
            .find(|section| &section.id == section_id)
            .ok_or_else(|| DocumentStoreError::SectionNotFound(section_id.clone()))?;
        section.content = content.to_string();
        Ok(())
    }
}
