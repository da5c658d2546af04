//! Realtime channel adapters.

mod websocket;

pub use websocket::{WebSocketConnector, WebSocketConnectorConfig};
