mod center;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::web::{
    ApiError, ApiMessage, AppState,
    auth::{require_admin_json, require_user_json},
    domain_error, json_ok,
};

pub use center::{NewNotification, NotificationCenter, NotificationLevel, NotificationView};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/notifications",
            get(list_notifications).post(create_notification),
        )
        .route("/api/notifications/unread-count", get(unread_count))
        .route("/api/notifications/read-all", post(mark_all_read))
        .route("/api/notifications/:id", delete(delete_notification))
        .route("/api/notifications/:id/read", post(mark_read))
}

#[derive(Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    unread_only: bool,
}

#[derive(Serialize)]
struct UnreadCount {
    unread: usize,
}

#[derive(Serialize)]
struct MarkedCount {
    marked: usize,
}

async fn list_notifications(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<NotificationView>>, ApiError> {
    let user = require_user_json(&state, &jar).await?;
    let store = state.read().await;
    Ok(Json(store.notifications.list_for(user.id, query.unread_only)))
}

async fn unread_count(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<UnreadCount>, ApiError> {
    let user = require_user_json(&state, &jar).await?;
    let unread = state.read().await.notifications.unread_count(user.id);
    Ok(Json(UnreadCount { unread }))
}

async fn create_notification(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<NewNotification>,
) -> Result<Json<NotificationView>, ApiError> {
    let user = require_admin_json(&state, &jar).await?;
    let created = state
        .write()
        .await
        .notifications
        .create(input, Utc::now())
        .map_err(domain_error)?;

    info!(id = %created.id, level = ?created.level, by = %user.username, "notification created");
    Ok(Json(NotificationView {
        id: created.id,
        audience: created.audience,
        title: created.title,
        body: created.body,
        level: created.level,
        created_at: created.created_at,
        read: false,
    }))
}

async fn mark_read(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    let user = require_user_json(&state, &jar).await?;
    state
        .write()
        .await
        .notifications
        .mark_read(id, user.id)
        .map_err(domain_error)?;
    Ok(json_ok("已标记为已读。"))
}

async fn mark_all_read(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<MarkedCount>, ApiError> {
    let user = require_user_json(&state, &jar).await?;
    let marked = state.write().await.notifications.mark_all_read(user.id);
    Ok(Json(MarkedCount { marked }))
}

async fn delete_notification(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    let user = require_admin_json(&state, &jar).await?;
    state
        .write()
        .await
        .notifications
        .delete(id)
        .map_err(domain_error)?;

    info!(%id, by = %user.username, "notification deleted");
    Ok(json_ok("已删除通知。"))
}
