//! Session-side handle on the collaboration channel.
//!
//! Wraps a [`RealtimeConnector`] with the [`ChannelState`] machine. Sends
//! are best-effort: nothing is queued or retried while the channel is not
//! open, and a full outbound queue drops the message.

use tokio::sync::mpsc::{self, error::TrySendError};

use crate::domain::foundation::{DocumentId, StateMachine};
use crate::domain::realtime::{ChannelState, RealtimeMessage};
use crate::ports::{ChannelError, Credential, RealtimeConnector};

/// One realtime connection per open document.
#[derive(Debug)]
pub struct RealtimeChannel {
    document_id: DocumentId,
    state: ChannelState,
    outbound: Option<mpsc::Sender<RealtimeMessage>>,
}

impl RealtimeChannel {
    pub fn new(document_id: DocumentId) -> Self {
        Self {
            document_id,
            state: ChannelState::Disconnected,
            outbound: None,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    /// Opens the connection and returns the inbound message stream.
    ///
    /// On failure the channel falls back to `Disconnected` and the session
    /// carries on without collaboration.
    pub async fn connect(
        &mut self,
        connector: &dyn RealtimeConnector,
        credential: &Credential,
    ) -> Result<mpsc::Receiver<RealtimeMessage>, ChannelError> {
        self.transition(ChannelState::Connecting);

        match connector.connect(&self.document_id, credential).await {
            Ok(connection) => {
                self.outbound = Some(connection.outbound);
                self.transition(ChannelState::Open);
                Ok(connection.inbound)
            }
            Err(err) => {
                tracing::warn!(
                    document_id = %self.document_id,
                    error = %err,
                    "Realtime connect failed, continuing without collaboration"
                );
                self.transition(ChannelState::Disconnected);
                Err(err)
            }
        }
    }

    /// Publishes a locally generated message without waiting.
    pub fn send(&self, message: RealtimeMessage) -> Result<(), ChannelError> {
        let outbound = match (&self.outbound, self.state) {
            (Some(outbound), ChannelState::Open) => outbound,
            _ => return Err(ChannelError::NotOpen),
        };

        outbound.try_send(message).map_err(|err| match err {
            TrySendError::Full(dropped) => {
                tracing::warn!(
                    document_id = %self.document_id,
                    message_type = dropped.type_name(),
                    "Realtime outbound queue full, dropping message"
                );
                ChannelError::Backpressure
            }
            TrySendError::Closed(_) => ChannelError::NotOpen,
        })
    }

    /// Records that the connection went away. No reconnection is attempted.
    pub fn mark_closed(&mut self) {
        self.outbound = None;
        if self.state != ChannelState::Disconnected {
            self.transition(ChannelState::Disconnected);
        }
    }

    fn transition(&mut self, target: ChannelState) {
        match self.state.transition_to(target) {
            Ok(next) => {
                tracing::info!(
                    document_id = %self.document_id,
                    from = %self.state,
                    to = %next,
                    "Realtime channel state changed"
                );
                self.state = next;
            }
            Err(err) => {
                tracing::warn!(document_id = %self.document_id, error = %err, "Ignoring channel transition");
            }
        }
    }
}
