//! Transport gateway: bridges the broker to connected clients.
//!
//! [`TransportGateway::start`] registers exactly one broker subscriber. That
//! listener checks each notification's shape, then routes it through the
//! [`Transport`]: to the members of `context.room` when present, otherwise
//! to every client. The gateway also owns the client lifecycle (connect,
//! disconnect, join/leave room) and the synthetic per-client notifications
//! that go with it.

use std::sync::Arc;

use crate::domain::{
    ClientId, Notification, NotificationContext, NotificationId, NotificationType, ROOM_KEY,
};
use crate::error::GatewayError;
use crate::service::{NotificationBroker, SubscriptionId};
use crate::transport::{ClientReceiver, DeliveryReport, Transport, TransportKind};

/// Message of the welcome notification sent on connect.
pub const WELCOME_MESSAGE: &str = "Connected to notification service";

/// A freshly connected client: its id and outbound queue.
#[derive(Debug)]
pub struct ClientSession {
    /// Transport-assigned id.
    pub client_id: ClientId,
    /// Notifications queued for this client. The welcome notification is
    /// already waiting here.
    pub receiver: ClientReceiver,
}

/// Owns the broker subscription and the client lifecycle.
///
/// Dropping the gateway unsubscribes its listener from the broker.
#[derive(Debug)]
pub struct TransportGateway {
    broker: NotificationBroker,
    transport: Arc<dyn Transport>,
    subscription: SubscriptionId,
}

impl TransportGateway {
    /// Subscribes a single forwarding listener on `broker` and returns the
    /// running gateway.
    #[must_use]
    pub fn start(broker: NotificationBroker, transport: Arc<dyn Transport>) -> Self {
        let listener = Arc::clone(&transport);
        let subscription =
            broker.subscribe(move |notification: &Notification| -> Result<(), GatewayError> {
                forward(listener.as_ref(), notification);
                Ok(())
            });
        tracing::info!(transport = %transport.kind(), %subscription, "transport gateway started");
        Self {
            broker,
            transport,
            subscription,
        }
    }

    /// Active transport.
    #[must_use]
    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Number of live connections.
    #[must_use]
    pub fn active_connections(&self) -> usize {
        self.transport.connection_count()
    }

    /// Number of rooms with at least one member.
    #[must_use]
    pub fn active_rooms(&self) -> usize {
        self.transport.room_count()
    }

    /// Rooms `client_id` belongs to, sorted.
    #[must_use]
    pub fn rooms_of(&self, client_id: &ClientId) -> Vec<String> {
        self.transport.rooms_of(client_id)
    }

    /// Registers a new client and queues its welcome notification.
    #[must_use]
    pub fn connect(&self) -> ClientSession {
        let client_id = ClientId::new();
        let mut context = NotificationContext::new();
        context.insert("clientId".to_string(), client_id.to_string().into());
        let welcome = Notification::with_id(
            NotificationId::welcome(client_id),
            NotificationType::Info,
            WELCOME_MESSAGE,
            Some(context),
        );
        let receiver = self.transport.attach(client_id, Arc::new(welcome));

        tracing::info!(%client_id, active = self.active_connections(), "client connected");
        ClientSession {
            client_id,
            receiver,
        }
    }

    /// Removes a client. Returns `false` for an unknown or already removed
    /// id; the connection count is unaffected in that case.
    pub fn disconnect(&self, client_id: &ClientId) -> bool {
        let removed = self.transport.detach(client_id);
        if removed {
            tracing::info!(%client_id, active = self.active_connections(), "client disconnected");
        } else {
            tracing::debug!(%client_id, "disconnect for unknown client ignored");
        }
        removed
    }

    /// Adds `client_id` to `room` and sends it a confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an empty room name and
    /// [`GatewayError::Delivery`] if the client is not connected.
    pub fn join_room(&self, client_id: &ClientId, room: &str) -> Result<(), GatewayError> {
        let room = validate_room(room)?;
        let newly_joined = self.transport.join_room(client_id, room)?;
        tracing::info!(%client_id, room, newly_joined, "client joined room");

        let mut context = NotificationContext::new();
        context.insert(ROOM_KEY.to_string(), room.into());
        let confirmation = Notification::with_id(
            NotificationId::room_joined(*client_id),
            NotificationType::Success,
            format!("Joined room {room}"),
            Some(context),
        );
        if let Err(err) = self
            .transport
            .deliver_to_client(client_id, Arc::new(confirmation))
        {
            tracing::warn!(%client_id, room, error = %err, "join confirmation not delivered");
        }
        Ok(())
    }

    /// Removes `client_id` from `room`. Returns `false` if it was not a
    /// member.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for an empty room name.
    pub fn leave_room(&self, client_id: &ClientId, room: &str) -> Result<bool, GatewayError> {
        let room = validate_room(room)?;
        let left = self.transport.leave_room(client_id, room);
        tracing::info!(%client_id, room, left, "client left room");
        Ok(left)
    }

    /// Stops forwarding broker notifications. Idempotent.
    pub fn shutdown(&self) {
        if self.broker.unsubscribe(self.subscription) {
            tracing::info!(subscription = %self.subscription, "transport gateway stopped");
        }
    }
}

impl Drop for TransportGateway {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn validate_room(room: &str) -> Result<&str, GatewayError> {
    let room = room.trim();
    if room.is_empty() {
        tracing::warn!("room request with empty name rejected");
        return Err(GatewayError::InvalidRequest(
            "room name must not be empty".to_string(),
        ));
    }
    Ok(room)
}

/// Broker listener body: validate, then route by `context.room`.
fn forward(transport: &dyn Transport, notification: &Notification) -> DeliveryReport {
    if let Err(err) = notification.validate() {
        tracing::warn!(id = %notification.id, error = %err, "dropping malformed notification");
        return DeliveryReport::default();
    }

    let shared = Arc::new(notification.clone());
    let report = match notification.room() {
        Some(room) => transport.deliver_to_room(room, &shared),
        None => transport.deliver(&shared),
    };
    if report.failed > 0 {
        tracing::warn!(
            id = %notification.id,
            delivered = report.delivered,
            failed = report.failed,
            "notification partially delivered"
        );
    }
    report
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use serde_json::json;

    use crate::config::BrokerConfig;
    use crate::transport::WebSocketTransport;

    fn setup() -> (NotificationBroker, TransportGateway) {
        let broker = NotificationBroker::new(&BrokerConfig {
            enable_logging: false,
            ..BrokerConfig::default()
        });
        let transport: Arc<dyn Transport> = Arc::new(WebSocketTransport::default());
        let gateway = TransportGateway::start(broker.clone(), transport);
        (broker, gateway)
    }

    fn drain(receiver: &mut ClientReceiver) -> Vec<Arc<Notification>> {
        let mut out = Vec::new();
        while let Ok(n) = receiver.try_recv() {
            out.push(n);
        }
        out
    }

    #[test]
    fn start_subscribes_exactly_once() {
        let (broker, gateway) = setup();
        assert_eq!(broker.subscriber_count(), 1);
        drop(gateway);
        assert_eq!(broker.subscriber_count(), 0);
    }

    #[test]
    fn connect_sends_welcome_to_that_client_only() {
        let (_broker, gateway) = setup();
        let mut first = gateway.connect();
        let mut second = gateway.connect();

        let first_msgs = drain(&mut first.receiver);
        assert_eq!(first_msgs.len(), 1);
        let Some(welcome) = first_msgs.first() else {
            panic!("welcome expected");
        };
        assert_eq!(welcome.id.as_str(), format!("welcome-{}", first.client_id));
        assert_eq!(welcome.notification_type, NotificationType::Info);
        assert_eq!(drain(&mut second.receiver).len(), 1);
    }

    #[test]
    fn connection_count_never_goes_negative() {
        let (_broker, gateway) = setup();
        let a = gateway.connect();
        let b = gateway.connect();
        assert_eq!(gateway.active_connections(), 2);
        assert!(gateway.disconnect(&a.client_id));
        assert!(gateway.disconnect(&b.client_id));
        assert_eq!(gateway.active_connections(), 0);
        assert!(!gateway.disconnect(&a.client_id));
        assert!(!gateway.disconnect(&ClientId::new()));
        assert_eq!(gateway.active_connections(), 0);
    }

    #[tokio::test]
    async fn push_reaches_all_clients() {
        let (broker, gateway) = setup();
        let mut a = gateway.connect();
        let mut b = gateway.connect();
        drain(&mut a.receiver);
        drain(&mut b.receiver);

        let n = broker.push(NotificationType::Update, "changed", None).await;
        let got_a = drain(&mut a.receiver);
        let got_b = drain(&mut b.receiver);
        assert_eq!(got_a.first().map(|x| x.id.clone()), Some(n.id.clone()));
        assert_eq!(got_b.first().map(|x| x.id.clone()), Some(n.id));
    }

    #[tokio::test]
    async fn broadcast_reaches_room_members_only() {
        let (broker, gateway) = setup();
        let mut member = gateway.connect();
        let mut outsider = gateway.connect();
        assert!(gateway.join_room(&member.client_id, "room-1").is_ok());
        drain(&mut member.receiver);
        drain(&mut outsider.receiver);

        broker
            .broadcast("room-1", NotificationType::Success, "x", None)
            .await;

        let got = drain(&mut member.receiver);
        assert_eq!(got.len(), 1);
        assert_eq!(got.first().and_then(|n| n.room()), Some("room-1"));
        assert!(drain(&mut outsider.receiver).is_empty());
    }

    #[test]
    fn join_sends_confirmation_to_joiner() {
        let (_broker, gateway) = setup();
        let mut member = gateway.connect();
        let mut other = gateway.connect();
        drain(&mut member.receiver);
        drain(&mut other.receiver);

        assert!(gateway.join_room(&member.client_id, " room-1 ").is_ok());
        let got = drain(&mut member.receiver);
        assert_eq!(got.len(), 1);
        assert_eq!(got.first().map(|n| n.notification_type), Some(NotificationType::Success));
        assert!(drain(&mut other.receiver).is_empty());
        assert_eq!(gateway.rooms_of(&member.client_id), vec!["room-1"]);
        assert_eq!(gateway.active_rooms(), 1);
    }

    #[test]
    fn empty_room_name_is_rejected() {
        let (_broker, gateway) = setup();
        let session = gateway.connect();
        assert!(matches!(
            gateway.join_room(&session.client_id, "  "),
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn leave_room_stops_room_delivery() {
        let (broker, gateway) = setup();
        let mut member = gateway.connect();
        let _ = gateway.join_room(&member.client_id, "room-1");
        assert_eq!(gateway.leave_room(&member.client_id, "room-1"), Ok(true));
        drain(&mut member.receiver);

        broker
            .broadcast("room-1", NotificationType::Info, "x", None)
            .await;
        assert!(drain(&mut member.receiver).is_empty());
    }

    #[tokio::test]
    async fn malformed_notification_is_dropped() {
        let (broker, gateway) = setup();
        let mut client = gateway.connect();
        drain(&mut client.receiver);

        let n = broker.push(NotificationType::Info, "", None).await;
        assert!(n.message.is_empty());
        assert!(drain(&mut client.receiver).is_empty());
        assert_eq!(broker.stats().subscriber_failures, 0);
    }

    #[tokio::test]
    async fn unset_or_blank_room_reaches_every_client() {
        let (broker, gateway) = setup();
        let mut client = gateway.connect();
        drain(&mut client.receiver);

        for ctx in [json!({"room": null, "teamId": 1}), json!({"room": ""})] {
            let n = broker
                .push(NotificationType::Info, "hello", ctx.as_object().cloned())
                .await;
            let got = drain(&mut client.receiver);
            assert_eq!(got.first().map(|x| x.id.clone()), Some(n.id));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn welcome_is_first_under_concurrent_pushes() {
        let (broker, gateway) = setup();
        let stop = Arc::new(AtomicBool::new(false));
        let pushers: Vec<_> = (0..3)
            .map(|_| {
                let broker = broker.clone();
                let stop = Arc::clone(&stop);
                tokio::spawn(async move {
                    while !stop.load(Ordering::Relaxed) {
                        broker.push(NotificationType::Update, "tick", None).await;
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for _ in 0..2_000 {
            let mut session = gateway.connect();
            let Ok(head) = session.receiver.try_recv() else {
                panic!("welcome missing");
            };
            assert_eq!(head.message, WELCOME_MESSAGE);
            gateway.disconnect(&session.client_id);
        }

        stop.store(true, Ordering::Relaxed);
        for pusher in pushers {
            let _ = pusher.await;
        }
    }

    #[tokio::test]
    async fn disconnected_client_does_not_block_others() {
        let (broker, gateway) = setup();
        let gone = gateway.connect();
        let mut alive = gateway.connect();
        drain(&mut alive.receiver);
        drop(gone.receiver);

        broker.push(NotificationType::Info, "still here", None).await;
        assert_eq!(drain(&mut alive.receiver).len(), 1);
    }
}
