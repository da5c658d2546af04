//! Collaboration hub server.
//!
//! Serves `GET /ws/documents/:document_id` (realtime channel) and
//! `GET /health`. Configuration comes from `PROPOSAL_COLLAB__*` variables.

use std::sync::Arc;

use proposal_collab::adapters::hub::{hub_router, HubState, RoomManager};
use proposal_collab::config::AppConfig;
use proposal_collab::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    telemetry::init_tracing(&config.server);

    let rooms = Arc::new(RoomManager::new(config.server.broadcast_capacity));
    let app = hub_router(HubState::new(rooms)).layer(telemetry::trace_layer());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Collaboration hub listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Collaboration hub stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
