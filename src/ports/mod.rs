//! Ports - Interfaces for external collaborators.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the editing core and the outside world. Adapters implement these ports.
//!
//! - `DocumentRepository` - Persistence service (load proposal, save section)
//! - `DocumentExportService` - Rendering service (snapshot → binary artifact)
//! - `SectionGenerator` - AI content-generation service
//! - `RealtimeConnector` - Collaboration hub connection

mod document_export_service;
mod document_repository;
mod realtime_connector;
mod section_generator;

pub use document_export_service::{
    DocumentExportService, DocumentSnapshot, ExportError, ExportFormat, ExportRequest,
    ExportSection, ExportedDocument, OrganizationProfile,
};
pub use document_repository::{DocumentRepository, DocumentStoreError};
pub use realtime_connector::{ChannelError, Credential, RealtimeConnection, RealtimeConnector};
pub use section_generator::{GenerationError, GenerationRequest, SectionGenerator};
