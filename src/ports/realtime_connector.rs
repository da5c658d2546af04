//! Realtime Connector Port - opening the collaboration channel.
//!
//! A connection is a pair of queues: the session pushes outbound
//! messages without waiting, and reads inbound messages until the
//! receiver yields `None`, which is how a close becomes observable.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::foundation::DocumentId;
use crate::domain::realtime::RealtimeMessage;

/// Session credential presented during the connection handshake.
#[derive(Debug, Clone)]
pub struct Credential(Secret<String>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Secret::new(token.into()))
    }

    /// Exposes the token (for building the handshake).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Both ends of an open realtime connection.
#[derive(Debug)]
pub struct RealtimeConnection {
    /// Messages to broadcast to the other collaborators.
    pub outbound: mpsc::Sender<RealtimeMessage>,
    /// Messages from the hub. `None` means the connection closed.
    pub inbound: mpsc::Receiver<RealtimeMessage>,
}

/// Port for connecting to the collaboration hub.
///
/// One connection per open document. Implementations do not reconnect;
/// a retry policy, if wanted, wraps `connect`.
#[async_trait]
pub trait RealtimeConnector: Send + Sync {
    async fn connect(
        &self,
        document_id: &DocumentId,
        credential: &Credential,
    ) -> Result<RealtimeConnection, ChannelError>;
}

/// Realtime connect/send failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("Invalid realtime endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Realtime handshake failed: {0}")]
    ConnectFailed(String),

    #[error("Realtime channel is not open")]
    NotOpen,

    #[error("Realtime outbound queue is full")]
    Backpressure,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_debug_does_not_leak_token() {
        let credential = Credential::new("super-secret-token");
        assert!(!format!("{credential:?}").contains("super-secret-token"));
        assert_eq!(credential.expose(), "super-secret-token");
    }

    #[test]
    fn realtime_connector_is_object_safe() {
        fn check<T: RealtimeConnector + ?Sized>() {}
        check::<dyn RealtimeConnector>();
    }
}
