//! Editing sessions.
//!
//! An [`EditingSession`] is a cheap, cloneable handle on one open document.
//! The state itself (workspace, presence roster, save pipeline and realtime
//! channel) lives in a private task; handles talk to it over a command
//! queue, so every operation is applied in arrival order.
//!
//! # Example
//!
//! ```ignore
//! let session = EditingSession::open(document_id, credential, config, services).await?;
//! session.activate_section(&SectionId::new("s2")).await?;
//! session.edit("Our approach is...").await?;
//! let status = session.close().await?;
//! ```

mod actor;
mod commands;
mod config;
mod error;
mod events;
mod snapshot;

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};

pub use config::{LocalUser, SessionConfig};
pub use error::SessionError;
pub use events::SessionEvent;
pub use snapshot::{CollaboratorView, SessionSnapshot};

use self::actor::SessionActor;
use self::commands::SessionCommand;
use crate::application::export::ExportOrchestrator;
use crate::application::realtime_channel::RealtimeChannel;
use crate::application::save_pipeline::{SavePipeline, SaveStatus};
use crate::domain::document::{Activation, DocumentWorkspace};
use crate::domain::foundation::{DocumentId, SectionId};
use crate::ports::{
    Credential, DocumentExportService, DocumentRepository, ExportFormat, ExportRequest,
    ExportedDocument, RealtimeConnector, SectionGenerator,
};

/// Save results buffered between save tasks and the session task.
const SAVE_RESULT_CAPACITY: usize = 16;

/// The external collaborators a session talks to.
#[derive(Clone)]
pub struct SessionServices {
    pub documents: Arc<dyn DocumentRepository>,
    pub renderer: Arc<dyn DocumentExportService>,
    pub generator: Arc<dyn SectionGenerator>,
    pub connector: Arc<dyn RealtimeConnector>,
}

/// Handle on a running editing session.
///
/// Dropping every handle ends the session the same way [`close`] does,
/// minus the returned status.
///
/// [`close`]: EditingSession::close
#[derive(Debug, Clone)]
pub struct EditingSession {
    document_id: DocumentId,
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<SessionEvent>,
}

impl EditingSession {
    /// Loads the document, connects to the collaboration hub and starts the
    /// session task.
    ///
    /// # Errors
    ///
    /// Fails only if the document cannot be loaded or is not editable. A
    /// failed realtime connection leaves the session in non-collaborative
    /// mode.
    pub async fn open(
        document_id: DocumentId,
        credential: Credential,
        config: SessionConfig,
        services: SessionServices,
    ) -> Result<Self, SessionError> {
        let document = services
            .documents
            .load_document(&document_id)
            .await
            .inspect_err(|err| {
                tracing::error!(document_id = %document_id, error = %err, "Failed to load document");
            })?;
        let workspace = DocumentWorkspace::load(document).map_err(SessionError::InvalidDocument)?;

        tracing::info!(
            document_id = %document_id,
            sections = workspace.store().len(),
            "Document loaded"
        );

        let mut channel = RealtimeChannel::new(document_id.clone());
        let inbound = channel
            .connect(services.connector.as_ref(), &credential)
            .await
            .ok();

        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (event_tx, _) = broadcast::channel(config.event_capacity);
        let (save_tx, save_rx) = mpsc::channel(SAVE_RESULT_CAPACITY);

        let actor = SessionActor::new(
            document_id.clone(),
            config.local_user,
            workspace,
            channel,
            SavePipeline::new(config.save_debounce),
            ExportOrchestrator::new(config.organization),
            services,
            event_tx.clone(),
            save_tx,
        );
        tokio::spawn(actor.run(command_rx, inbound, save_rx));

        Ok(Self {
            document_id,
            commands: command_tx,
            events: event_tx,
        })
    }

    pub fn document_id(&self) -> &DocumentId {
        &self.document_id
    }

    /// Replaces the active section's text. Broadcasts immediately and
    /// schedules a debounced save.
    pub async fn edit(&self, content: impl Into<String>) -> Result<(), SessionError> {
        let content = content.into();
        self.request(|reply| SessionCommand::Edit { content, reply })
            .await
    }

    /// Broadcasts the local cursor. Returns the offset after clamping to the
    /// active section's length.
    pub async fn move_cursor(&self, offset: usize) -> Result<usize, SessionError> {
        self.request(|reply| SessionCommand::MoveCursor { offset, reply })
            .await
    }

    /// Commits the current section and makes `section_id` the active one.
    pub async fn activate_section(&self, section_id: &SectionId) -> Result<Activation, SessionError> {
        let section_id = section_id.clone();
        self.request(|reply| SessionCommand::Activate { section_id, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::Snapshot { reply }).await
    }

    /// Builds the request the rendering service would receive, including
    /// text not yet saved.
    pub async fn build_export_request(
        &self,
        format: ExportFormat,
    ) -> Result<ExportRequest, SessionError> {
        self.request(|reply| SessionCommand::BuildExport { format, reply })
            .await
    }

    /// Renders the document through the export service.
    pub async fn export(&self, format: ExportFormat) -> Result<ExportedDocument, SessionError> {
        self.request(|reply| SessionCommand::Export { format, reply })
            .await
    }

    /// Asks the generator to draft the active section. The draft is only
    /// returned; call [`accept_suggestion`](Self::accept_suggestion) to use it.
    pub async fn suggest_section(
        &self,
        requirements: Vec<String>,
        context: impl Into<String>,
    ) -> Result<String, SessionError> {
        let context = context.into();
        self.request(|reply| SessionCommand::Suggest {
            requirements,
            context,
            reply,
        })
        .await
    }

    /// Replaces the active section's text with an accepted suggestion.
    pub async fn accept_suggestion(&self, suggestion: impl Into<String>) -> Result<(), SessionError> {
        self.edit(suggestion).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Commits and saves everything pending, closes the channel and stops
    /// the session. Returns the final save status.
    pub async fn close(&self) -> Result<SaveStatus, SessionError> {
        self.request(|reply| SessionCommand::Close { reply }).await
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(commands::Reply<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)?
    }
}

#[cfg(test)]
mod tests;
