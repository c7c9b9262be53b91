//! Notification record and its closed type enum.
//!
//! A [`Notification`] is created by the broker (or synthesised by the
//! gateway for a single client) and never mutated afterwards. On the wire
//! `timestamp` is an RFC 3339 string and `type` is the upper-case variant
//! name.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use super::NotificationId;
use crate::error::GatewayError;

/// Context key naming the room a notification is scoped to.
pub const ROOM_KEY: &str = "room";

/// Free-form producer context attached to a notification.
pub type NotificationContext = serde_json::Map<String, serde_json::Value>;

/// Kind of a notification. Closed set.
///
/// Serialized upper case; deserialized through [`FromStr`], so any case is
/// accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// An operation completed.
    Success,
    /// An operation failed.
    Error,
    /// Informational message.
    Info,
    /// Some resource changed.
    Update,
}

impl NotificationType {
    /// All known variants, in declaration order.
    pub const ALL: [Self; 4] = [Self::Success, Self::Error, Self::Info, Self::Update];

    /// Returns the canonical wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Error => "ERROR",
            Self::Info => "INFO",
            Self::Update => "UPDATE",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| GatewayError::InvalidNotificationType(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for NotificationType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A single notification as stored in history and sent to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    /// Unique id.
    pub id: NotificationId,
    /// Notification kind.
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    /// Human-readable message.
    pub message: String,
    /// Optional producer context. `context.room` scopes delivery to a room.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub context: Option<NotificationContext>,
    /// Creation instant.
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    /// Builds a notification with a fresh id, stamped now.
    #[must_use]
    pub fn new(
        notification_type: NotificationType,
        message: impl Into<String>,
        context: Option<NotificationContext>,
    ) -> Self {
        Self::with_id(NotificationId::generate(), notification_type, message, context)
    }

    /// Builds a notification with an explicit id, stamped now.
    #[must_use]
    pub fn with_id(
        id: NotificationId,
        notification_type: NotificationType,
        message: impl Into<String>,
        context: Option<NotificationContext>,
    ) -> Self {
        Self {
            id,
            notification_type,
            message: message.into(),
            context,
            timestamp: Utc::now(),
        }
    }

    /// Room this notification targets.
    ///
    /// `None` when `context.room` is absent, `null`, `false` or a blank
    /// string; such notifications go to every client. Room names are
    /// trimmed.
    #[must_use]
    pub fn room(&self) -> Option<&str> {
        self.context
            .as_ref()
            .and_then(|ctx| ctx.get(ROOM_KEY))
            .and_then(serde_json::Value::as_str)
            .map(str::trim)
            .filter(|room| !room.is_empty())
    }

    /// Checks the shape required before a notification goes on the wire.
    ///
    /// `type` and `timestamp` are guaranteed by construction; the id and
    /// message must be non-empty. A `context.room` that is neither a string
    /// nor unset (`null`/`false`) cannot name a room and is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MalformedNotification`] describing the first
    /// violated rule.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.id.as_str().trim().is_empty() {
            return Err(GatewayError::MalformedNotification("empty id".to_string()));
        }
        if self.message.trim().is_empty() {
            return Err(GatewayError::MalformedNotification(
                "empty message".to_string(),
            ));
        }
        if let Some(room) = self.context.as_ref().and_then(|ctx| ctx.get(ROOM_KEY)) {
            match room {
                serde_json::Value::Null
                | serde_json::Value::Bool(false)
                | serde_json::Value::String(_) => {}
                other => {
                    return Err(GatewayError::MalformedNotification(format!(
                        "context.room must be a string, got {other}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context(value: serde_json::Value) -> Option<NotificationContext> {
        value.as_object().cloned()
    }

    #[test]
    fn type_parses_case_insensitively() {
        assert_eq!("info".parse::<NotificationType>(), Ok(NotificationType::Info));
        assert_eq!(
            "UPDATE".parse::<NotificationType>(),
            Ok(NotificationType::Update)
        );
    }

    #[test]
    fn unknown_type_is_rejected() {
        let err = "WARNING".parse::<NotificationType>();
        assert_eq!(
            err,
            Err(GatewayError::InvalidNotificationType("WARNING".to_string()))
        );
    }

    #[test]
    fn serializes_wire_shape() {
        let n = Notification::new(
            NotificationType::Success,
            "saved",
            context(json!({"teamId": 7})),
        );
        let Ok(value) = serde_json::to_value(&n) else {
            panic!("serialization failed");
        };
        assert_eq!(value["type"], "SUCCESS");
        assert_eq!(value["message"], "saved");
        assert_eq!(value["context"]["teamId"], 7);
        let Some(ts) = value["timestamp"].as_str() else {
            panic!("timestamp should be a string");
        };
        let Ok(parsed) = DateTime::parse_from_rfc3339(ts) else {
            panic!("timestamp should be ISO-8601");
        };
        assert_eq!(parsed.with_timezone(&Utc), n.timestamp);
    }

    #[test]
    fn context_is_omitted_when_absent() {
        let n = Notification::new(NotificationType::Info, "hi", None);
        let json = serde_json::to_string(&n).unwrap_or_default();
        assert!(!json.contains("context"));
    }

    #[test]
    fn room_reads_string_context_key() {
        let n = Notification::new(NotificationType::Info, "x", context(json!({"room": "r1"})));
        assert_eq!(n.room(), Some("r1"));
        let n = Notification::new(NotificationType::Info, "x", None);
        assert_eq!(n.room(), None);
    }

    #[test]
    fn validate_rejects_empty_message_and_id() {
        let mut n = Notification::new(NotificationType::Info, "  ", None);
        assert!(n.validate().is_err());
        n.message = "ok".to_string();
        assert!(n.validate().is_ok());
        n.id = NotificationId::from("");
        assert!(n.validate().is_err());
    }

    #[test]
    fn unset_or_blank_room_means_everyone() {
        for ctx in [json!({"room": null, "teamId": 1}), json!({"room": ""}), json!({"room": "  "})] {
            let n = Notification::new(NotificationType::Info, "hello", context(ctx));
            assert_eq!(n.room(), None);
            assert!(n.validate().is_ok());
        }
        let n = Notification::new(NotificationType::Info, "x", context(json!({"room": " r1 "})));
        assert_eq!(n.room(), Some("r1"));
    }

    #[test]
    fn type_deserializes_in_any_case() {
        let parsed: Result<NotificationType, _> = serde_json::from_str("\"info\"");
        assert_eq!(parsed.ok(), Some(NotificationType::Info));
        let parsed: Result<NotificationType, _> = serde_json::from_str("\"LOUD\"");
        assert!(parsed.is_err());
    }

    #[test]
    fn validate_rejects_non_string_room() {
        let n = Notification::new(NotificationType::Info, "x", context(json!({"room": 5})));
        assert!(matches!(
            n.validate(),
            Err(GatewayError::MalformedNotification(_))
        ));
    }
}
