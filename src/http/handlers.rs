use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::app::composer::{NotificationDraft, RecipientOptions};
use crate::app::delivery::FeedView;
use crate::app::presentation::{present, DisplayNotification};
use crate::app::read_state::persist_read;
use crate::domain::notification::Notification;
use crate::http::{AppError, AuthViewer};
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let store = state.notifications.ping().await.is_ok();
    let status = if store { "ok" } else { "degraded" };

    Json(HealthResponse { status })
}

#[derive(Deserialize)]
pub struct FeedQuery {
    pub view: Option<FeedView>,
}

#[derive(Serialize)]
pub struct FeedResponse {
    pub items: Vec<DisplayNotification>,
    /// Unread entries among `items` only.
    pub unread_count: usize,
}

pub async fn list_notifications(
    auth: AuthViewer,
    State(state): State<AppState>,
    query: Result<Query<FeedQuery>, QueryRejection>,
) -> Result<Json<FeedResponse>, AppError> {
    let Query(query) = query?;
    let view = query.view.unwrap_or_default();
    let entries = state.resolver().resolve(&auth.viewer(), view).await?;

    let now = OffsetDateTime::now_utc();
    let unread_count = entries
        .iter()
        .filter(|entry| !entry.notification.is_read)
        .count();
    let items = entries.iter().map(|entry| present(entry, now)).collect();

    Ok(Json(FeedResponse {
        items,
        unread_count,
    }))
}

#[derive(Serialize)]
pub struct UnreadTotalResponse {
    pub unread_total: i64,
}

pub async fn unread_total(
    auth: AuthViewer,
    State(state): State<AppState>,
) -> Result<Json<UnreadTotalResponse>, AppError> {
    let unread_total = state.resolver().unread_total(&auth.viewer()).await?;
    Ok(Json(UnreadTotalResponse { unread_total }))
}

pub async fn send_notification(
    auth: AuthViewer,
    State(state): State<AppState>,
    payload: Result<Json<NotificationDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    let Json(payload) = payload?;
    let notification = state.composer().send(&auth.profile, &payload).await?;
    Ok((StatusCode::CREATED, Json(notification)))
}

pub async fn mark_notification_read(
    auth: AuthViewer,
    id: Result<Path<Uuid>, PathRejection>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id?;
    persist_read(
        state.notifications.as_ref(),
        &state.events,
        id,
        &auth.viewer(),
        state.store_timeout,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_recipients(
    auth: AuthViewer,
    State(state): State<AppState>,
) -> Result<Json<RecipientOptions>, AppError> {
    let options = state.composer().recipients(&auth.profile).await?;
    Ok(Json(options))
}
