//! WebSocket connection loop.
//!
//! Handles the read/write loop for a single WebSocket connection: inbound
//! room commands go to the gateway, queued notifications go out as
//! `notification` events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};

use super::messages::{ClientEvent, ServerEvent, WsErrorPayload};
use crate::domain::ClientId;
use crate::error::GatewayError;
use crate::gateway::{ClientSession, TransportGateway};

/// Runs the read/write loop for a single WebSocket connection.
///
/// Registers the client with the gateway on entry and always unregisters
/// it on exit, whichever side closed the socket.
pub async fn run_connection(socket: WebSocket, gateway: Arc<TransportGateway>) {
    let ClientSession {
        client_id,
        mut receiver,
    } = gateway.connect();
    let (mut ws_tx, mut ws_rx) = socket.split();

    loop {
        tokio::select! {
            // Incoming frame from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handle_text_message(&text, client_id, &gateway)
                            && send_event(&mut ws_tx, &reply).await.is_err() {
                                break;
                            }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        tracing::debug!(%client_id, error = %err, "ws read failed");
                        break;
                    }
                    _ => {}
                }
            }
            // Notification queued by the transport
            queued = receiver.recv() => {
                let Some(notification) = queued else {
                    break;
                };
                let event = ServerEvent::Notification((*notification).clone());
                if let Err(err) = send_event(&mut ws_tx, &event).await {
                    tracing::warn!(%client_id, id = %notification.id, error = %err, "ws emit failed");
                    break;
                }
            }
        }
    }

    gateway.disconnect(&client_id);
    tracing::debug!(%client_id, "ws connection closed");
}

/// Serializes and sends one event. A serialization failure is logged and
/// skipped; only socket errors are returned.
async fn send_event(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    match serde_json::to_string(event) {
        Ok(json) => ws_tx.send(Message::text(json)).await,
        Err(err) => {
            tracing::warn!(error = %err, "failed to serialize ws event");
            Ok(())
        }
    }
}

/// Handles a text frame from the client, returning an optional reply.
///
/// Successful joins are confirmed through the client's notification queue,
/// so only failures produce a direct reply.
fn handle_text_message(
    text: &str,
    client_id: ClientId,
    gateway: &TransportGateway,
) -> Option<ServerEvent> {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(err) => {
            tracing::debug!(%client_id, error = %err, "malformed ws frame");
            return Some(error_event(&GatewayError::InvalidRequest(
                "malformed event".to_string(),
            )));
        }
    };

    let result = match event {
        ClientEvent::JoinRoom(room) => gateway.join_room(&client_id, &room),
        ClientEvent::LeaveRoom(room) => gateway.leave_room(&client_id, &room).map(|_| ()),
    };

    result.err().map(|err| error_event(&err))
}

fn error_event(err: &GatewayError) -> ServerEvent {
    ServerEvent::Error(WsErrorPayload {
        code: err.error_code(),
        message: err.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::config::BrokerConfig;
    use crate::service::NotificationBroker;
    use crate::transport::{Transport, WebSocketTransport};

    fn gateway() -> TransportGateway {
        let broker = NotificationBroker::new(&BrokerConfig::default());
        let transport: Arc<dyn Transport> = Arc::new(WebSocketTransport::default());
        TransportGateway::start(broker, transport)
    }

    #[test]
    fn join_room_frame_updates_membership() {
        let gateway = gateway();
        let session = gateway.connect();
        let reply = handle_text_message(
            r#"{"event":"join-room","data":"room-1"}"#,
            session.client_id,
            &gateway,
        );
        assert!(reply.is_none());
        assert_eq!(gateway.rooms_of(&session.client_id), vec!["room-1"]);

        let reply = handle_text_message(
            r#"{"event":"leave-room","data":"room-1"}"#,
            session.client_id,
            &gateway,
        );
        assert!(reply.is_none());
        assert!(gateway.rooms_of(&session.client_id).is_empty());
    }

    #[test]
    fn malformed_frame_yields_error_event() {
        let gateway = gateway();
        let session = gateway.connect();
        let Some(ServerEvent::Error(payload)) =
            handle_text_message("not json", session.client_id, &gateway)
        else {
            panic!("expected error event");
        };
        assert_eq!(payload.code, 1001);
        assert_eq!(payload.message, "invalid request: malformed event");
    }

    #[test]
    fn empty_room_yields_error_event() {
        let gateway = gateway();
        let session = gateway.connect();
        let Some(ServerEvent::Error(payload)) = handle_text_message(
            r#"{"event":"join-room","data":" "}"#,
            session.client_id,
            &gateway,
        ) else {
            panic!("expected error event");
        };
        assert_eq!(payload.code, 1001);
    }
}
