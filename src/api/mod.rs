//! REST API layer: producer endpoints, DTOs, and router composition.
//!
//! Notification endpoints are mounted under `/api/v1`; `/health` sits at
//! the root. With the `swagger-ui` feature the OpenAPI document is served
//! at `/api-docs/openapi.json` and browsable at `/swagger-ui`.

pub mod dto;
pub mod handlers;

use axum::Router;
use utoipa::OpenApi;

use crate::app_state::AppState;

/// OpenAPI document for the REST surface.
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "notify-gateway", description = "Notification broker REST API"),
    paths(
        handlers::notifications::push_notification,
        handlers::notifications::broadcast_notification,
        handlers::notifications::get_history,
        handlers::system::health_handler,
    ),
    components(schemas(
        crate::domain::Notification,
        crate::domain::NotificationType,
        crate::domain::NotificationId,
        dto::PushNotificationRequest,
        dto::HistoryResponse,
        handlers::system::HealthResponse,
        crate::service::BrokerStats,
        crate::error::ErrorResponse,
        crate::error::ErrorBody,
    )),
    tags(
        (name = "Notifications", description = "Push, broadcast and history"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes());

    #[cfg(feature = "swagger-ui")]
    let router = router.merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
            .url("/api-docs/openapi.json", ApiDoc::openapi()),
    );

    router
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_notification_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/notifications"));
        assert!(doc.paths.paths.contains_key("/api/v1/rooms/{room}/notifications"));
        assert!(doc.paths.paths.contains_key("/health"));
    }
}
