//! Transport layer: how notifications reach connected clients.
//!
//! [`Transport`] is the capability the gateway routes through. Every
//! client gets a bounded outbound queue; delivery only ever enqueues, so
//! it never blocks the broker's fan-out. [`WebSocketTransport`] is the one
//! implementation; the axum socket loop in [`crate::ws`] drains its queues.

pub mod rooms;
pub mod websocket;

pub use rooms::RoomRegistry;
pub use websocket::WebSocketTransport;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::domain::{ClientId, Notification};
use crate::error::GatewayError;

/// Receiving half of a client's outbound queue.
pub type ClientReceiver = mpsc::Receiver<Arc<Notification>>;

/// Transports selectable in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// WebSocket clients on `/ws`.
    WebSocket,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WebSocket => f.write_str("websocket"),
        }
    }
}

impl FromStr for TransportKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "websocket" | "ws" => Ok(Self::WebSocket),
            other => Err(GatewayError::UnsupportedTransport(other.to_string())),
        }
    }
}

/// Emission counts for one delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Clients the notification was queued for.
    pub delivered: usize,
    /// Clients whose queue was full or closed.
    pub failed: usize,
}

/// Client connection set plus delivery.
///
/// All methods are synchronous and must return promptly; they are invoked
/// from inside the broker's fan-out.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Which transport this is.
    fn kind(&self) -> TransportKind;

    /// Registers a live connection and returns its outbound queue with
    /// `first` already at its head. No other delivery can reach the queue
    /// before `first`.
    fn attach(&self, client_id: ClientId, first: Arc<Notification>) -> ClientReceiver;

    /// Removes a connection and its room memberships. Returns `false` if
    /// `client_id` was not connected.
    fn detach(&self, client_id: &ClientId) -> bool;

    /// Adds a connected client to `room`.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Delivery`] if `client_id` is not connected.
    fn join_room(&self, client_id: &ClientId, room: &str) -> Result<bool, GatewayError>;

    /// Removes a client from `room`. Returns `false` if it was not a member.
    fn leave_room(&self, client_id: &ClientId, room: &str) -> bool;

    /// Number of live connections.
    fn connection_count(&self) -> usize;

    /// Number of rooms with at least one member.
    fn room_count(&self) -> usize;

    /// Rooms `client_id` currently belongs to, sorted.
    fn rooms_of(&self, client_id: &ClientId) -> Vec<String>;

    /// Queues `notification` for every connected client.
    fn deliver(&self, notification: &Arc<Notification>) -> DeliveryReport;

    /// Queues `notification` for members of `room` only.
    fn deliver_to_room(&self, room: &str, notification: &Arc<Notification>) -> DeliveryReport;

    /// Queues `notification` for a single client.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Delivery`] if the client is unknown or its
    /// queue is full or closed.
    fn deliver_to_client(
        &self,
        client_id: &ClientId,
        notification: Arc<Notification>,
    ) -> Result<(), GatewayError>;
}
