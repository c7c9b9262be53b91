//! Producer endpoints: push, room broadcast, history.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{HistoryResponse, PushNotificationRequest};
use crate::app_state::AppState;
use crate::domain::{HistoryFilter, Notification};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /notifications` — Push a notification to every connected client.
///
/// # Errors
///
/// Returns [`GatewayError`] on an unknown type or a blank message.
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    tag = "Notifications",
    summary = "Push a notification",
    description = "Creates a notification, records it in history when persistence is enabled, and delivers it to every connected client.",
    request_body = PushNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = Notification),
        (status = 400, description = "Unknown type or blank message", body = ErrorResponse),
    )
)]
pub async fn push_notification(
    State(state): State<AppState>,
    Json(req): Json<PushNotificationRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    req.validate()?;
    let notification = state
        .broker
        .push_raw(&req.notification_type, req.message, req.context)
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// `POST /rooms/{room}/notifications` — Push a notification to one room.
///
/// # Errors
///
/// Returns [`GatewayError`] on an unknown type, a blank message, or a
/// blank room name.
#[utoipa::path(
    post,
    path = "/api/v1/rooms/{room}/notifications",
    tag = "Notifications",
    summary = "Broadcast to a room",
    description = "Creates a notification with `context.room` set to the path room (overriding any `room` key in the body) and delivers it to that room's members only.",
    params(("room" = String, Path, description = "Target room name")),
    request_body = PushNotificationRequest,
    responses(
        (status = 201, description = "Notification created", body = Notification),
        (status = 400, description = "Unknown type or blank message", body = ErrorResponse),
    )
)]
pub async fn broadcast_notification(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Json(req): Json<PushNotificationRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    req.validate()?;
    let notification = state
        .broker
        .broadcast_raw(&room, &req.notification_type, req.message, req.context)
        .await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

/// `GET /notifications` — Query notification history.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    tag = "Notifications",
    summary = "Notification history",
    description = "Returns retained notifications, oldest first. `limit` keeps the most recent matches. Empty when persistence is disabled.",
    params(HistoryFilter),
    responses(
        (status = 200, description = "Matching notifications", body = HistoryResponse),
    )
)]
pub async fn get_history(
    State(state): State<AppState>,
    Query(filter): Query<HistoryFilter>,
) -> impl IntoResponse {
    Json(HistoryResponse::from(state.broker.history(&filter)))
}

/// Notification routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/notifications", post(push_notification).get(get_history))
        .route("/rooms/{room}/notifications", post(broadcast_notification))
}
