use axum::{routing::get, routing::post, Router};

use crate::AppState;
use crate::http::handlers;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn notifications() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            get(handlers::list_notifications).post(handlers::send_notification),
        )
        .route("/notifications/unread-count", get(handlers::unread_total))
        .route(
            "/notifications/:id/read",
            post(handlers::mark_notification_read),
        )
        .route("/recipients", get(handlers::list_recipients))
}
