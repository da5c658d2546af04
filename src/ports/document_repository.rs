//! Document Repository Port - the persistence service.
//!
//! The editing core loads a proposal once per session and afterwards
//! only ever writes single sections back.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::document::Document;
use crate::domain::foundation::{DocumentId, SectionId};

/// Port for loading proposals and saving section content.
///
/// # Contract
///
/// - `load_document` returns every section of the document; their order
///   in the returned vector is the order the editor shows them in.
/// - `save_section` replaces the stored content of one section. It is
///   called at most once at a time per section by the save pipeline.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    /// Fetch a document with all its sections.
    ///
    /// # Errors
    ///
    /// Any error here is fatal to the editing session.
    async fn load_document(&self, document_id: &DocumentId) -> Result<Document, DocumentStoreError>;

    /// Persist the content of one section.
    ///
    /// # Errors
    ///
    /// Failures are logged by the caller and never retried automatically.
    async fn save_section(
        &self,
        document_id: &DocumentId,
        section_id: &SectionId,
        content: &str,
    ) -> Result<(), DocumentStoreError>;
}

/// Errors reported by the persistence service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentStoreError {
    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("Section not found: {0}")]
    SectionNotFound(SectionId),

    #[error("Not authorized to access document")]
    Unauthorized,

    #[error("Persistence service returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Persistence service unreachable: {0}")]
    Unavailable(String),

    #[error("Malformed response from persistence service: {0}")]
    InvalidResponse(String),
}

impl DocumentStoreError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable(reason.into())
    }
}
