//! Realtime connector wired to a test peer instead of a hub.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::lock;
use crate::domain::foundation::DocumentId;
use crate::domain::realtime::RealtimeMessage;
use crate::ports::{ChannelError, Credential, RealtimeConnection, RealtimeConnector};

const LOOPBACK_CAPACITY: usize = 64;

/// The far end of a loopback connection, playing the hub.
#[derive(Debug)]
pub struct LoopbackPeer {
    /// Messages delivered to the session as if from the hub.
    pub to_session: mpsc::Sender<RealtimeMessage>,
    /// Messages the session broadcast.
    pub from_session: mpsc::Receiver<RealtimeMessage>,
}

#[derive(Debug)]
enum Mode {
    /// Hands out the prepared connection once.
    Pair(Option<RealtimeConnection>),
    Failing(ChannelError),
}

/// Connector that yields a single pre-built connection.
#[derive(Debug, Clone)]
pub struct LoopbackConnector {
    mode: Arc<Mutex<Mode>>,
}

impl LoopbackConnector {
    /// A connector and the peer on the other side of its only connection.
    pub fn pair() -> (Self, LoopbackPeer) {
        let (to_session, inbound) = mpsc::channel(LOOPBACK_CAPACITY);
        let (outbound, from_session) = mpsc::channel(LOOPBACK_CAPACITY);

        let connector = Self {
            mode: Arc::new(Mutex::new(Mode::Pair(Some(RealtimeConnection {
                outbound,
                inbound,
            })))),
        };
        (
            connector,
            LoopbackPeer {
                to_session,
                from_session,
            },
        )
    }

    /// A connector whose every attempt fails with `error`.
    pub fn failing(error: ChannelError) -> Self {
        Self {
            mode: Arc::new(Mutex::new(Mode::Failing(error))),
        }
    }
}

#[async_trait]
impl RealtimeConnector for LoopbackConnector {
    async fn connect(
        &self,
        document_id: &DocumentId,
        credential: &Credential,
    ) -> Result<RealtimeConnection, ChannelError> {
        if credential.expose().is_empty() {
            return Err(ChannelError::ConnectFailed("missing credential".into()));
        }

        match &mut *lock(&self.mode) {
            Mode::Pair(connection) => connection.take().ok_or_else(|| {
                ChannelError::ConnectFailed(format!("loopback for {document_id} already used"))
            }),
            Mode::Failing(error) => Err(error.clone()),
        }
    }
}
