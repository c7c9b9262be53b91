//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::gateway::TransportGateway;
use crate::service::NotificationBroker;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Broker used by the REST producer endpoints.
    pub broker: NotificationBroker,
    /// Gateway owning WebSocket clients and rooms.
    pub gateway: Arc<TransportGateway>,
}

impl AppState {
    /// Bundles a broker with a gateway started on it.
    #[must_use]
    pub fn new(broker: NotificationBroker, gateway: Arc<TransportGateway>) -> Self {
        Self { broker, gateway }
    }
}
