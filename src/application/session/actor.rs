//! The task that owns one editing session.
//!
//! Every mutation (keystrokes, section switches, remote messages, timer
//! expiry and save completions) is handled one at a time inside a single
//! `select!` loop, so the workspace never needs a lock and a section switch
//! always commits before anything else can read the store. Network calls
//! run in spawned tasks and report back through channels.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep_until, Instant};

use super::commands::{Reply, SessionCommand};
use super::snapshot::CollaboratorView;
use super::{LocalUser, SessionError, SessionEvent, SessionServices, SessionSnapshot};
use crate::application::export::{self, ExportOrchestrator};
use crate::application::realtime_channel::RealtimeChannel;
use crate::application::save_pipeline::{SaveJob, SavePipeline, SaveStatus};
use crate::domain::document::{Activation, DocumentWorkspace, RemoteChangeOutcome};
use crate::domain::foundation::{DocumentId, SectionId, UserId};
use crate::domain::presence::PresenceTracker;
use crate::domain::realtime::RealtimeMessage;
use crate::ports::{
    ChannelError, ExportFormat, ExportedDocument, GenerationError, GenerationRequest,
};

/// Result of a save task, fed back into the pipeline.
#[derive(Debug)]
pub(super) struct SaveOutcome {
    section_id: SectionId,
    result: Result<(), String>,
}

pub(super) struct SessionActor {
    document_id: DocumentId,
    local_user: LocalUser,
    workspace: DocumentWorkspace,
    presence: PresenceTracker,
    channel: RealtimeChannel,
    saves: SavePipeline,
    export: ExportOrchestrator,
    services: SessionServices,
    events: broadcast::Sender<SessionEvent>,
    save_results: mpsc::Sender<SaveOutcome>,
    last_status: SaveStatus,
}

impl SessionActor {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        document_id: DocumentId,
        local_user: LocalUser,
        workspace: DocumentWorkspace,
        channel: RealtimeChannel,
        saves: SavePipeline,
        export: ExportOrchestrator,
        services: SessionServices,
        events: broadcast::Sender<SessionEvent>,
        save_results: mpsc::Sender<SaveOutcome>,
    ) -> Self {
        let presence = PresenceTracker::new(local_user.id.clone());
        let last_status = saves.status();
        Self {
            document_id,
            local_user,
            workspace,
            presence,
            channel,
            saves,
            export,
            services,
            events,
            save_results,
            last_status,
        }
    }

    /// Runs until `close` is requested or every handle is dropped.
    pub(super) async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
        mut inbound: Option<mpsc::Receiver<RealtimeMessage>>,
        mut save_results: mpsc::Receiver<SaveOutcome>,
    ) {
        tracing::info!(
            document_id = %self.document_id,
            user_id = %self.local_user.id,
            channel = %self.channel.state(),
            "Editing session started"
        );

        loop {
            let deadline = self.saves.deadline();

            tokio::select! {
                command = commands.recv() => match command {
                    Some(SessionCommand::Close { reply }) => {
                        let status = self.shutdown(&mut save_results).await;
                        let _ = reply.send(Ok(status));
                        return;
                    }
                    Some(command) => self.handle_command(command),
                    None => {
                        self.shutdown(&mut save_results).await;
                        return;
                    }
                },
                message = next_inbound(&mut inbound) => match message {
                    Some(message) => self.handle_message(message),
                    None => {
                        inbound = None;
                        self.channel_closed();
                    }
                },
                Some(outcome) = save_results.recv() => self.handle_save_outcome(outcome),
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.flush_due();
                }
            }
        }
    }

    fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Edit { content, reply } => {
                let _ = reply.send(self.edit(content));
            }
            SessionCommand::MoveCursor { offset, reply } => {
                let _ = reply.send(self.move_cursor(offset));
            }
            SessionCommand::Activate { section_id, reply } => {
                let _ = reply.send(self.activate(&section_id));
            }
            SessionCommand::Snapshot { reply } => {
                let _ = reply.send(Ok(self.snapshot()));
            }
            SessionCommand::BuildExport { format, reply } => {
                let _ = reply.send(Ok(self.export.build_request(&mut self.workspace, format)));
            }
            SessionCommand::Export { format, reply } => self.start_export(format, reply),
            SessionCommand::Suggest {
                requirements,
                context,
                reply,
            } => self.start_suggestion(requirements, context, reply),
            // Handled by the run loop.
            SessionCommand::Close { reply } => {
                let _ = reply.send(Err(SessionError::Closed));
            }
        }
    }

    fn edit(&mut self, content: String) -> Result<(), SessionError> {
        let section_id = self.workspace.edit(content.clone())?.clone();

        self.broadcast(RealtimeMessage::ContentChanged {
            user_id: self.local_user.id.clone(),
            section_id: section_id.clone(),
            content: content.clone(),
        });

        if let Some(displaced) = self.saves.on_edit(section_id, content, Instant::now()) {
            self.spawn_save(displaced);
        }
        self.publish_save_status();
        Ok(())
    }

    fn move_cursor(&mut self, offset: usize) -> Result<usize, SessionError> {
        let buffer = self.workspace.buffer().ok_or(SessionError::NoActiveSection)?;
        let clamped = offset.min(buffer.char_len());
        let section_id = buffer.section_id().clone();

        self.broadcast(RealtimeMessage::CursorUpdate {
            user_id: self.local_user.id.clone(),
            section_id: Some(section_id),
            position: clamped,
        });
        Ok(clamped)
    }

    fn activate(&mut self, target: &SectionId) -> Result<Activation, SessionError> {
        let activation = self.workspace.activate(target)?;

        // The outgoing section's text is already in the store; persist it
        // now instead of waiting out the quiet period.
        if let Some(previous) = &activation.previous {
            if previous != target && self.saves.scheduled_section() == Some(previous) {
                if let Some(job) = self.saves.flush_now() {
                    self.spawn_save(job);
                }
            }
        }

        tracing::debug!(
            document_id = %self.document_id,
            previous = ?activation.previous,
            section_id = %activation.current,
            "Section activated"
        );

        self.broadcast(RealtimeMessage::CursorUpdate {
            user_id: self.local_user.id.clone(),
            section_id: Some(activation.current.clone()),
            position: 0,
        });
        self.publish_save_status();
        Ok(activation)
    }

    fn snapshot(&self) -> SessionSnapshot {
        let collaborators = self
            .presence
            .roster()
            .into_iter()
            .map(|collaborator| {
                let section_len = collaborator
                    .cursor
                    .section_id
                    .as_ref()
                    .and_then(|id| self.workspace.visible_char_len(id));
                CollaboratorView::new(collaborator, section_len)
            })
            .collect();

        SessionSnapshot {
            metadata: self.workspace.metadata().clone(),
            sections: self.workspace.store().ordered().into_iter().cloned().collect(),
            active_section: self.workspace.active_section().cloned(),
            buffer: self.workspace.buffer().map(|b| b.content().to_string()),
            collaborators,
            save_status: self.saves.status(),
            channel_state: self.channel.state(),
        }
    }

    fn start_export(&mut self, format: ExportFormat, reply: Reply<ExportedDocument>) {
        let request = self.export.build_request(&mut self.workspace, format);
        let renderer = Arc::clone(&self.services.renderer);

        tokio::spawn(async move {
            let result = export::render(renderer.as_ref(), &request).await;
            if let Err(err) = &result {
                tracing::warn!(
                    document_id = %request.document.document_id,
                    format = %request.format,
                    error = %err,
                    "Export failed"
                );
            }
            let _ = reply.send(result.map_err(SessionError::from));
        });
    }

    fn start_suggestion(
        &mut self,
        requirements: Vec<String>,
        context: String,
        reply: Reply<String>,
    ) {
        let title = self
            .workspace
            .active_section()
            .and_then(|id| self.workspace.store().get(id))
            .map(|section| section.title.clone());
        let Some(title) = title else {
            let _ = reply.send(Err(SessionError::NoActiveSection));
            return;
        };

        let request = GenerationRequest {
            section_title: title,
            requirements,
            context,
        };
        let generator = Arc::clone(&self.services.generator);
        let document_id = self.document_id.clone();

        tokio::spawn(async move {
            let result = match generator.generate_section(request).await {
                Ok(content) if content.trim().is_empty() => Err(GenerationError::EmptySuggestion),
                other => other,
            };
            if let Err(err) = &result {
                tracing::warn!(document_id = %document_id, error = %err, "Section suggestion failed");
            }
            let _ = reply.send(result.map_err(SessionError::from));
        });
    }

    fn handle_message(&mut self, message: RealtimeMessage) {
        let own_echo = !matches!(message, RealtimeMessage::InitialState { .. })
            && message.user_id() == Some(&self.local_user.id);
        if own_echo {
            tracing::trace!(message_type = message.type_name(), "Ignoring echo of own message");
            return;
        }

        match message {
            RealtimeMessage::InitialState { active_users, .. } => {
                self.presence.seed(active_users);
                self.presence_changed();
            }
            RealtimeMessage::UserJoined { user_id, user_name } => {
                tracing::info!(document_id = %self.document_id, user_id = %user_id, "Collaborator joined");
                if self.presence.on_join(user_id, user_name) {
                    self.presence_changed();
                }
            }
            RealtimeMessage::UserLeft { user_id } => {
                tracing::info!(document_id = %self.document_id, user_id = %user_id, "Collaborator left");
                if self.presence.on_leave(&user_id) {
                    self.presence_changed();
                }
            }
            RealtimeMessage::CursorUpdate {
                user_id,
                section_id,
                position,
            } => {
                if self.presence.on_cursor_update(&user_id, section_id, position) {
                    self.presence_changed();
                }
            }
            RealtimeMessage::ContentChanged {
                user_id,
                section_id,
                content,
            } => self.apply_remote_change(user_id, section_id, content),
        }
    }

    fn apply_remote_change(
        &mut self,
        user_id: UserId,
        section_id: SectionId,
        content: String,
    ) {
        match self.workspace.apply_remote_change(&section_id, content) {
            RemoteChangeOutcome::Applied => {
                tracing::debug!(
                    document_id = %self.document_id,
                    section_id = %section_id,
                    user_id = %user_id,
                    "Applied remote change"
                );
                self.emit(SessionEvent::RemoteContentApplied { section_id, user_id });
            }
            RemoteChangeOutcome::Skipped => {
                tracing::info!(
                    document_id = %self.document_id,
                    section_id = %section_id,
                    user_id = %user_id,
                    "Ignoring remote change to the active section"
                );
                self.emit(SessionEvent::RemoteContentIgnored { section_id, user_id });
            }
            RemoteChangeOutcome::UnknownSection => {
                tracing::warn!(
                    document_id = %self.document_id,
                    section_id = %section_id,
                    user_id = %user_id,
                    "Remote change for unknown section"
                );
                self.emit(SessionEvent::RemoteContentIgnored { section_id, user_id });
            }
        }
    }

    fn flush_due(&mut self) {
        self.workspace.commit_buffer();
        if let Some(job) = self.saves.fire_due(Instant::now()) {
            self.spawn_save(job);
        }
        self.publish_save_status();
    }

    fn spawn_save(&self, job: SaveJob) {
        tracing::debug!(
            document_id = %self.document_id,
            section_id = %job.section_id,
            chars = job.content.chars().count(),
            "Saving section"
        );

        let documents = Arc::clone(&self.services.documents);
        let document_id = self.document_id.clone();
        let results = self.save_results.clone();

        tokio::spawn(async move {
            let result = documents
                .save_section(&document_id, &job.section_id, &job.content)
                .await
                .map_err(|err| err.to_string());
            let _ = results
                .send(SaveOutcome {
                    section_id: job.section_id,
                    result,
                })
                .await;
        });
    }

    fn handle_save_outcome(&mut self, outcome: SaveOutcome) {
        match &outcome.result {
            Ok(()) => tracing::info!(
                document_id = %self.document_id,
                section_id = %outcome.section_id,
                "Section saved"
            ),
            Err(message) => {
                tracing::error!(
                    document_id = %self.document_id,
                    section_id = %outcome.section_id,
                    error = %message,
                    "Section save failed"
                );
                self.emit(SessionEvent::SaveFailed {
                    section_id: outcome.section_id.clone(),
                    message: message.clone(),
                });
            }
        }

        if let Some(next) = self.saves.complete(&outcome.section_id, outcome.result) {
            self.spawn_save(next);
        }
        self.publish_save_status();
    }

    fn channel_closed(&mut self) {
        self.channel.mark_closed();
        if !self.presence.is_empty() {
            self.presence.seed(std::iter::empty());
            self.presence_changed();
        }
        self.emit(SessionEvent::ChannelStateChanged {
            state: self.channel.state(),
        });
    }

    /// Commits the buffer, persists what is pending, makes one last attempt
    /// for sections whose save failed and waits for every save to finish.
    /// Returns the final save status.
    async fn shutdown(&mut self, save_results: &mut mpsc::Receiver<SaveOutcome>) -> SaveStatus {
        self.workspace.commit_buffer();
        if let Some(job) = self.saves.flush_now() {
            self.spawn_save(job);
        }
        for section_id in self.saves.failed_sections() {
            let Some(content) = self.workspace.store().content(&section_id) else {
                continue;
            };
            let job = SaveJob {
                section_id,
                content: content.to_string(),
            };
            if let Some(job) = self.saves.resubmit(job) {
                self.spawn_save(job);
            }
        }
        self.publish_save_status();

        while !self.saves.is_idle() {
            match save_results.recv().await {
                Some(outcome) => self.handle_save_outcome(outcome),
                None => break,
            }
        }

        if self.channel.state().is_open() {
            self.channel.mark_closed();
            self.emit(SessionEvent::ChannelStateChanged {
                state: self.channel.state(),
            });
        }

        let status = self.saves.status();
        tracing::info!(document_id = %self.document_id, status = ?status, "Editing session closed");
        status
    }

    fn broadcast(&self, message: RealtimeMessage) {
        if let Err(err) = self.channel.send(message) {
            if err != ChannelError::NotOpen {
                tracing::debug!(document_id = %self.document_id, error = %err, "Broadcast dropped");
            }
        }
    }

    fn presence_changed(&self) {
        self.emit(SessionEvent::PresenceChanged {
            collaborators: self.presence.len(),
        });
    }

    fn publish_save_status(&mut self) {
        let status = self.saves.status();
        if status != self.last_status {
            self.last_status = status.clone();
            self.emit(SessionEvent::SaveStatusChanged { status });
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

async fn next_inbound(
    inbound: &mut Option<mpsc::Receiver<RealtimeMessage>>,
) -> Option<RealtimeMessage> {
    match inbound {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
