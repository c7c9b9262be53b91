//! Opaque notification identifier.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ClientId;

/// Identifier of a [`super::Notification`].
///
/// Broker-generated notifications carry a UUID v4 string. Synthetic
/// per-client notifications built by the gateway use readable prefixes
/// (`welcome-<clientId>`), so the id is kept as an opaque string rather
/// than a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    /// Generates a fresh unique id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Id of the welcome notification sent to `client_id` on connect.
    #[must_use]
    pub fn welcome(client_id: ClientId) -> Self {
        Self(format!("welcome-{client_id}"))
    }

    /// Id of a room-join confirmation sent to `client_id`.
    #[must_use]
    pub fn room_joined(client_id: ClientId) -> Self {
        Self(format!("joined-{client_id}-{}", uuid::Uuid::new_v4()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the id is the empty string.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NotificationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for NotificationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_unique_and_non_empty() {
        let a = NotificationId::generate();
        let b = NotificationId::generate();
        assert_ne!(a, b);
        assert!(!a.is_empty());
    }

    #[test]
    fn welcome_id_embeds_client() {
        let client = ClientId::new();
        let id = NotificationId::welcome(client);
        assert_eq!(id.as_str(), format!("welcome-{client}"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = NotificationId::from("abc");
        let json = serde_json::to_string(&id).unwrap_or_default();
        assert_eq!(json, "\"abc\"");
    }
}
