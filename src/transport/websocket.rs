//! WebSocket transport: live connection set and room routing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::{ClientReceiver, DeliveryReport, RoomRegistry, Transport, TransportKind};
use crate::domain::{ClientId, Notification};
use crate::error::GatewayError;

/// Default outbound queue length per client.
pub const DEFAULT_CLIENT_BUFFER: usize = 256;

/// One live client.
#[derive(Debug)]
struct Connection {
    sender: mpsc::Sender<Arc<Notification>>,
    rooms: HashSet<String>,
}

#[derive(Debug, Default)]
struct TransportState {
    connections: HashMap<ClientId, Connection>,
    rooms: RoomRegistry,
}

/// Connection registry for WebSocket clients.
///
/// The connection map and the [`RoomRegistry`] share one coarse lock. The
/// active-connection count is the size of the map, so a disconnect for an
/// unknown or already-removed client cannot push it below zero.
#[derive(Debug)]
pub struct WebSocketTransport {
    state: RwLock<TransportState>,
    client_buffer: usize,
}

impl WebSocketTransport {
    /// Creates a transport whose clients each buffer up to `client_buffer`
    /// undelivered notifications.
    #[must_use]
    pub fn new(client_buffer: usize) -> Self {
        Self {
            state: RwLock::new(TransportState::default()),
            client_buffer: client_buffer.max(1),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, TransportState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, TransportState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_BUFFER)
    }
}

/// Queues without waiting; returns a description of the failure, if any.
fn enqueue(
    sender: &mpsc::Sender<Arc<Notification>>,
    notification: &Arc<Notification>,
) -> Result<(), &'static str> {
    match sender.try_send(Arc::clone(notification)) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => Err("client queue full"),
        Err(TrySendError::Closed(_)) => Err("client queue closed"),
    }
}

impl Transport for WebSocketTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::WebSocket
    }

    fn attach(&self, client_id: ClientId, first: Arc<Notification>) -> ClientReceiver {
        let (sender, receiver) = mpsc::channel(self.client_buffer);
        let mut state = self.write();
        // Fresh channel with capacity >= 1, and the lock keeps deliveries out
        // until the connection is visible.
        if let Err(reason) = enqueue(&sender, &first) {
            tracing::warn!(%client_id, id = %first.id, reason, "first notification not queued");
        }
        let connection = Connection {
            sender,
            rooms: HashSet::new(),
        };
        if let Some(stale) = state.connections.insert(client_id, connection) {
            state.rooms.leave_all(client_id, &stale.rooms);
        }
        receiver
    }

    fn detach(&self, client_id: &ClientId) -> bool {
        let mut state = self.write();
        let Some(connection) = state.connections.remove(client_id) else {
            return false;
        };
        state.rooms.leave_all(*client_id, &connection.rooms);
        true
    }

    fn join_room(&self, client_id: &ClientId, room: &str) -> Result<bool, GatewayError> {
        let mut state = self.write();
        let Some(connection) = state.connections.get_mut(client_id) else {
            return Err(GatewayError::Delivery(format!(
                "client {client_id} is not connected"
            )));
        };
        connection.rooms.insert(room.to_string());
        Ok(state.rooms.join(room, *client_id))
    }

    fn leave_room(&self, client_id: &ClientId, room: &str) -> bool {
        let mut state = self.write();
        if let Some(connection) = state.connections.get_mut(client_id) {
            connection.rooms.remove(room);
        }
        state.rooms.leave(room, *client_id)
    }

    fn connection_count(&self) -> usize {
        self.read().connections.len()
    }

    fn room_count(&self) -> usize {
        self.read().rooms.room_count()
    }

    fn rooms_of(&self, client_id: &ClientId) -> Vec<String> {
        let mut rooms: Vec<String> = self
            .read()
            .connections
            .get(client_id)
            .map(|c| c.rooms.iter().cloned().collect())
            .unwrap_or_default();
        rooms.sort();
        rooms
    }

    fn deliver(&self, notification: &Arc<Notification>) -> DeliveryReport {
        let state = self.read();
        let mut report = DeliveryReport::default();
        for (client_id, connection) in &state.connections {
            match enqueue(&connection.sender, notification) {
                Ok(()) => report.delivered += 1,
                Err(reason) => {
                    report.failed += 1;
                    tracing::warn!(%client_id, id = %notification.id, reason, "emit failed");
                }
            }
        }
        report
    }

    fn deliver_to_room(&self, room: &str, notification: &Arc<Notification>) -> DeliveryReport {
        let state = self.read();
        let mut report = DeliveryReport::default();
        for client_id in state.rooms.members(room) {
            let Some(connection) = state.connections.get(client_id) else {
                continue;
            };
            match enqueue(&connection.sender, notification) {
                Ok(()) => report.delivered += 1,
                Err(reason) => {
                    report.failed += 1;
                    tracing::warn!(%client_id, room, id = %notification.id, reason, "room emit failed");
                }
            }
        }
        report
    }

    fn deliver_to_client(
        &self,
        client_id: &ClientId,
        notification: Arc<Notification>,
    ) -> Result<(), GatewayError> {
        let state = self.read();
        let connection = state.connections.get(client_id).ok_or_else(|| {
            GatewayError::Delivery(format!("client {client_id} is not connected"))
        })?;
        enqueue(&connection.sender, &notification)
            .map_err(|reason| GatewayError::Delivery(format!("{reason} for {client_id}")))
    }
}
