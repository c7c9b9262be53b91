//! notify-gateway server entry point.
//!
//! Builds the broker and gateway from environment configuration and
//! starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use notify_gateway::app_state::AppState;
use notify_gateway::config::GatewayConfig;
use notify_gateway::gateway::TransportGateway;
use notify_gateway::server;
use notify_gateway::service::NotificationBroker;
use notify_gateway::transport::{Transport, TransportKind, WebSocketTransport};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        addr = %config.listen_addr,
        persist = config.broker.persist,
        history_capacity = config.broker.history_capacity,
        max_retries = config.broker.retry.max_retries,
        transport = %config.transport,
        "starting notify-gateway"
    );

    // Build broker
    let broker = NotificationBroker::new(&config.broker);

    // Build transport + gateway
    let transport: Arc<dyn Transport> = match config.transport {
        TransportKind::WebSocket => Arc::new(WebSocketTransport::new(config.client_buffer)),
    };
    let gateway = Arc::new(TransportGateway::start(broker.clone(), transport));

    // Build application state
    let app_state = AppState::new(broker, Arc::clone(&gateway));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    server::serve(listener, app_state, shutdown_signal()).await?;

    gateway.shutdown();
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
