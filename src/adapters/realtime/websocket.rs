//! WebSocket client for the collaboration hub.
//!
//! `connect` performs the handshake and then splits the socket between two
//! tasks: a reader that decodes text frames into the inbound queue, and a
//! writer that encodes the outbound queue (and answers pings). When the
//! socket closes the reader ends, the inbound queue closes, and the session
//! sees the channel go `Disconnected`. Dropping the outbound sender closes
//! the socket from this side.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::domain::foundation::{DocumentId, UserId};
use crate::domain::realtime::RealtimeMessage;
use crate::ports::{ChannelError, Credential, RealtimeConnection, RealtimeConnector};

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct WebSocketConnectorConfig {
    /// Hub base URL, e.g. `ws://localhost:8080/ws/documents`.
    pub base_url: Url,
    pub user_id: UserId,
    pub user_name: String,
    /// Depth of the inbound and outbound queues.
    pub queue_capacity: usize,
}

impl WebSocketConnectorConfig {
    pub fn new(base_url: Url, user_id: UserId, user_name: impl Into<String>) -> Self {
        Self {
            base_url,
            user_id,
            user_name: user_name.into(),
            queue_capacity: 256,
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }
}

/// Messages for the writer task.
enum WriteCommand {
    Send(RealtimeMessage),
    Pong(Vec<u8>),
    /// The session dropped its sender; close the socket.
    Close,
}

/// [`RealtimeConnector`] over `tokio-tungstenite`.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    config: WebSocketConnectorConfig,
}

impl WebSocketConnector {
    pub fn new(config: WebSocketConnectorConfig) -> Self {
        Self { config }
    }

    /// `{base}/{document_id}?token=..&user_id=..&user_name=..`
    pub fn document_url(
        &self,
        document_id: &DocumentId,
        credential: &Credential,
    ) -> Result<Url, ChannelError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ChannelError::InvalidEndpoint(self.config.base_url.to_string()))?
            .pop_if_empty()
            .push(document_id.as_str());
        url.query_pairs_mut()
            .append_pair("token", credential.expose())
            .append_pair("user_id", self.config.user_id.as_str())
            .append_pair("user_name", &self.config.user_name);
        Ok(url)
    }
}

#[async_trait]
impl RealtimeConnector for WebSocketConnector {
    async fn connect(
        &self,
        document_id: &DocumentId,
        credential: &Credential,
    ) -> Result<RealtimeConnection, ChannelError> {
        let url = self.document_url(document_id, credential)?;
        match url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(ChannelError::InvalidEndpoint(format!(
                    "unsupported scheme {other}"
                )))
            }
        }

        tracing::info!(document_id = %document_id, host = ?url.host_str(), "Connecting to collaboration hub");
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::ConnectFailed(e.to_string()))?;

        let (write, read) = stream.split();
        let capacity = self.config.queue_capacity;
        let (outbound_tx, outbound_rx) = mpsc::channel::<RealtimeMessage>(capacity);
        let (inbound_tx, inbound_rx) = mpsc::channel::<RealtimeMessage>(capacity);
        let (write_tx, write_rx) = mpsc::channel::<WriteCommand>(capacity);

        tokio::spawn(forward_outbound(outbound_rx, write_tx.clone()));
        tokio::spawn(run_writer(write, write_rx));
        tokio::spawn(run_reader(read, inbound_tx, write_tx, document_id.clone()));

        Ok(RealtimeConnection {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}

async fn forward_outbound(
    mut outbound: mpsc::Receiver<RealtimeMessage>,
    write_tx: mpsc::Sender<WriteCommand>,
) {
    while let Some(message) = outbound.recv().await {
        if write_tx.send(WriteCommand::Send(message)).await.is_err() {
            return;
        }
    }
    let _ = write_tx.send(WriteCommand::Close).await;
}

async fn run_reader<S>(
    mut read: S,
    inbound: mpsc::Sender<RealtimeMessage>,
    write_tx: mpsc::Sender<WriteCommand>,
    document_id: DocumentId,
) where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => match RealtimeMessage::from_json(text.as_str()) {
                Ok(message) => {
                    if inbound.send(message).await.is_err() {
                        // Session is gone.
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!(document_id = %document_id, error = %e, "Dropping malformed realtime frame");
                }
            },
            Ok(Message::Ping(data)) => {
                if write_tx.send(WriteCommand::Pong(data.to_vec())).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!(document_id = %document_id, "Collaboration hub closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(document_id = %document_id, error = %e, "Realtime connection error");
                break;
            }
        }
    }
}

async fn run_writer<S>(mut write: S, mut commands: mpsc::Receiver<WriteCommand>)
where
    S: SinkExt<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    while let Some(command) = commands.recv().await {
        let frame = match command {
            WriteCommand::Send(message) => match message.to_json() {
                Ok(json) => Message::text(json),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode realtime message");
                    continue;
                }
            },
            WriteCommand::Pong(data) => Message::Pong(data.into()),
            WriteCommand::Close => break,
        };
        if let Err(e) = write.send(frame).await {
            tracing::debug!(error = %e, "Realtime write failed");
            break;
        }
    }
    let _ = write.close().await;
}
