//! WebSocket wire events.
//!
//! Every frame is a JSON text message of the form
//! `{"event": "<name>", "data": <payload>}`.
//!
//! | Direction       | Event          | Data                       |
//! |-----------------|----------------|----------------------------|
//! | server → client | `notification` | [`Notification`]           |
//! | server → client | `error`        | [`WsErrorPayload`]         |
//! | client → server | `join-room`    | room name (string)         |
//! | client → server | `leave-room`   | room name (string)         |

use serde::{Deserialize, Serialize};

use crate::domain::Notification;

/// Events sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// A notification addressed to this client.
    Notification(Notification),
    /// The client sent something the server could not act on.
    Error(WsErrorPayload),
}

/// Body of an `error` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WsErrorPayload {
    /// [`crate::error::GatewayError`] code; unparseable frames report
    /// `InvalidRequest` (1001).
    pub code: u32,
    /// Human-readable reason.
    pub message: String,
}

/// Events a client can send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Start receiving notifications broadcast to this room.
    JoinRoom(String),
    /// Stop receiving notifications broadcast to this room.
    LeaveRoom(String),
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::NotificationType;

    #[test]
    fn client_events_parse() {
        let Ok(join) = serde_json::from_str::<ClientEvent>(r#"{"event":"join-room","data":"room-1"}"#)
        else {
            panic!("join-room should parse");
        };
        assert_eq!(join, ClientEvent::JoinRoom("room-1".to_string()));

        let Ok(leave) = serde_json::from_str::<ClientEvent>(r#"{"event":"leave-room","data":"room-1"}"#)
        else {
            panic!("leave-room should parse");
        };
        assert_eq!(leave, ClientEvent::LeaveRoom("room-1".to_string()));
    }

    #[test]
    fn unknown_client_event_fails() {
        assert!(serde_json::from_str::<ClientEvent>(r#"{"event":"dance","data":"x"}"#).is_err());
    }

    #[test]
    fn notification_event_shape() {
        let n = Notification::new(NotificationType::Success, "done", None);
        let Ok(value) = serde_json::to_value(ServerEvent::Notification(n.clone())) else {
            panic!("serialization failed");
        };
        assert_eq!(value["event"], "notification");
        assert_eq!(value["data"]["id"], n.id.as_str());
        assert_eq!(value["data"]["type"], "SUCCESS");
        assert!(value["data"]["timestamp"].is_string());
    }
}
