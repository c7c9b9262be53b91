//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Only
//! [`GatewayError::InvalidNotificationType`] ever reaches a producer calling
//! the broker; every other variant is contained, logged, and swallowed by the
//! component that hit it. The REST layer maps variants to HTTP status codes
//! and a structured JSON body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid notification type: WARNING",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code.
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status               |
/// |-----------|-----------------|---------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request           |
/// | 2000–2999 | Delivery        | 502 Bad Gateway           |
/// | 3000–3999 | Server          | 500 Internal Server Error |
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    /// Notification type string is not one of the known variants.
    #[error("invalid notification type: {0}")]
    InvalidNotificationType(String),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A notification failed the shape check before hitting the wire.
    #[error("malformed notification: {0}")]
    MalformedNotification(String),

    /// Unsupported transport selected in configuration.
    #[error("unsupported transport: {0}")]
    UnsupportedTransport(String),

    /// A subscriber callback reported failure.
    #[error("subscriber failed: {0}")]
    Subscriber(String),

    /// A client could not be reached (queue full, closed, or unknown id).
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// History backend rejected a write.
    #[error("store error: {0}")]
    Store(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidNotificationType(_) => 1002,
            Self::MalformedNotification(_) => 1003,
            Self::UnsupportedTransport(_) => 1004,
            Self::Delivery(_) => 2001,
            Self::Subscriber(_) => 2002,
            Self::Store(_) => 3001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidNotificationType(_)
            | Self::MalformedNotification(_)
            | Self::UnsupportedTransport(_) => StatusCode::BAD_REQUEST,
            Self::Delivery(_) | Self::Subscriber(_) => StatusCode::BAD_GATEWAY,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let err = GatewayError::InvalidNotificationType("WARNING".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1002);
        assert_eq!(err.to_string(), "invalid notification type: WARNING");
    }

    #[test]
    fn into_response_carries_status() {
        let response = GatewayError::Store("boom".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
