//! Export orchestration.
//!
//! Builds the rendering request from the workspace (committing the live
//! buffer first) and hands it to the rendering service. A failed render
//! leaves no trace: the workspace is only touched by the commit, which
//! would have happened on the next save anyway.

use crate::domain::document::DocumentWorkspace;
use crate::domain::foundation::Timestamp;
use crate::ports::{
    DocumentExportService, DocumentSnapshot, ExportError, ExportFormat, ExportRequest,
    ExportSection, ExportedDocument, OrganizationProfile,
};

/// Assembles export requests stamped with the organization's fixed fields.
#[derive(Debug, Clone)]
pub struct ExportOrchestrator {
    organization: OrganizationProfile,
}

impl ExportOrchestrator {
    pub fn new(organization: OrganizationProfile) -> Self {
        Self { organization }
    }

    pub fn organization(&self) -> &OrganizationProfile {
        &self.organization
    }

    /// Commits the edit buffer and snapshots every section in ascending order.
    pub fn build_request(
        &self,
        workspace: &mut DocumentWorkspace,
        format: ExportFormat,
    ) -> ExportRequest {
        let sections = workspace
            .committed_sections()
            .into_iter()
            .map(|section| ExportSection {
                id: section.id.clone(),
                title: section.title.clone(),
                content: section.content.clone(),
                order: section.order,
            })
            .collect();

        let metadata = workspace.metadata();
        ExportRequest {
            format,
            document: DocumentSnapshot {
                document_id: metadata.id.clone(),
                title: metadata.title.clone(),
                reference_number: metadata.reference_number.clone(),
                organization: self.organization.clone(),
                generated_at: Timestamp::now(),
                sections,
            },
        }
    }
}

/// Renders a prepared request. Runs off the session actor.
pub async fn render(
    renderer: &dyn DocumentExportService,
    request: &ExportRequest,
) -> Result<ExportedDocument, ExportError> {
    let content = renderer.render(request).await?;
    if content.is_empty() {
        return Err(ExportError::EmptyArtifact);
    }

    let exported = ExportedDocument::new(content, request.format, &request.base_filename());
    tracing::info!(
        document_id = %request.document.document_id,
        format = %request.format,
        filename = %exported.filename,
        bytes = exported.content.len(),
        "Export rendered"
    );
    Ok(exported)
}
