//! Document Export Service Port - the external rendering service.
//!
//! The export orchestrator assembles an [`ExportRequest`] (ordered
//! sections plus document and organization metadata); an implementation
//! of [`DocumentExportService`] turns it into a binary artifact.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{DocumentId, SectionId, Timestamp};

/// Port for rendering an assembled proposal.
///
/// # Contract
///
/// Implementations must:
/// - Produce the whole artifact or fail; partial output is never returned
/// - Render sections in the order given by the request
#[async_trait]
pub trait DocumentExportService: Send + Sync {
    /// Render the snapshot in the requested format.
    ///
    /// # Errors
    ///
    /// Returns `ExportError` if the service is unreachable or refuses.
    async fn render(&self, request: &ExportRequest) -> Result<Vec<u8>, ExportError>;
}

/// Formats the rendering service produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// Word-processor document.
    Docx,
    /// Spreadsheet (compliance matrix style).
    Xlsx,
    /// Fixed-layout document.
    Pdf,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    /// Extension, also the path segment on the rendering service.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Pdf => "pdf",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "docx" | "word" => Ok(ExportFormat::Docx),
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Fixed organizational fields stamped on every export.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrganizationProfile {
    pub organization_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cage_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uei: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_of_contact: Option<String>,
}

/// One section as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSection {
    pub id: SectionId,
    pub title: String,
    pub content: String,
    pub order: i32,
}

/// Complete, ordered snapshot of a proposal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSnapshot {
    pub document_id: DocumentId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_number: Option<String>,
    pub organization: OrganizationProfile,
    pub generated_at: Timestamp,
    pub sections: Vec<ExportSection>,
}

/// Body sent to the rendering service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub document: DocumentSnapshot,
}

impl ExportRequest {
    /// Base filename (no extension) derived from the reference number,
    /// falling back to the title.
    pub fn base_filename(&self) -> String {
        let source = self
            .document
            .reference_number
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(&self.document.title);

        let cleaned: String = source
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let trimmed = cleaned.trim_matches('_');

        if trimmed.is_empty() {
            "proposal".to_string()
        } else {
            trimmed.to_string()
        }
    }
}

/// A rendered artifact ready to hand to the user.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub content: Vec<u8>,
    pub content_type: String,
    /// `{reference or title}.{extension}`
    pub filename: String,
    pub format: ExportFormat,
}

impl ExportedDocument {
    pub fn new(content: Vec<u8>, format: ExportFormat, base_filename: &str) -> Self {
        Self {
            content,
            content_type: format.content_type().to_string(),
            filename: format!("{}.{}", base_filename, format.extension()),
            format,
        }
    }
}

/// Rendering failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    /// Unsupported export format requested.
    #[error("Unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// Rendering service could not be reached.
    #[error("Export service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Rendering service answered with a non-success status.
    #[error("Export service returned {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The service answered but produced nothing.
    #[error("Export service returned an empty document")]
    EmptyArtifact,
}

impl ExportError {
    pub fn service_unavailable(reason: impl Into<String>) -> Self {
        Self::ServiceUnavailable(reason.into())
    }
}
