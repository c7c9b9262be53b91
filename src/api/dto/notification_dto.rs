//! Notification DTOs for the producer endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Notification, NotificationContext};
use crate::error::GatewayError;

/// Request body for `POST /notifications` and
/// `POST /rooms/{room}/notifications`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PushNotificationRequest {
    /// One of `SUCCESS`, `ERROR`, `INFO`, `UPDATE`.
    #[serde(rename = "type")]
    pub notification_type: String,
    /// Human-readable message; must not be blank.
    pub message: String,
    /// Optional free-form context.
    #[serde(default)]
    #[schema(value_type = Option<Object>)]
    pub context: Option<NotificationContext>,
}

impl PushNotificationRequest {
    /// Rejects blank messages.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] if `message` is blank.
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.message.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "message must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Response body for `GET /notifications`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HistoryResponse {
    /// Matching notifications, oldest first.
    pub data: Vec<Notification>,
    /// Number of entries in `data`.
    pub count: usize,
}

impl From<Vec<Notification>> for HistoryResponse {
    fn from(data: Vec<Notification>) -> Self {
        let count = data.len();
        Self { data, count }
    }
}
