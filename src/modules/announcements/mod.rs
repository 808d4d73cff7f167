mod board;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::web::{
    ApiError, ApiMessage, AppState,
    auth::{require_admin_json, require_user_json},
    domain_error, json_ok,
};

pub use board::{
    Announcement, AnnouncementBoard, AnnouncementCategory, AnnouncementDraft, AnnouncementFilter,
    AnnouncementPatch,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/public/announcements", get(public_feed))
        .route(
            "/api/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route(
            "/api/announcements/:id",
            get(show_announcement)
                .put(update_announcement)
                .delete(delete_announcement),
        )
        .route("/api/announcements/:id/publish", post(publish_announcement))
        .route("/api/announcements/:id/archive", post(archive_announcement))
        .route("/api/announcements/:id/pin", post(pin_announcement))
}

#[derive(Deserialize)]
struct PinRequest {
    pinned: bool,
}

async fn public_feed(State(state): State<AppState>) -> Json<Vec<Announcement>> {
    Json(state.read().await.announcements.published())
}

async fn list_announcements(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(filter): Query<AnnouncementFilter>,
) -> Result<Json<Vec<Announcement>>, ApiError> {
    require_user_json(&state, &jar).await?;
    Ok(Json(state.read().await.announcements.list(&filter)))
}

async fn show_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>, ApiError> {
    require_user_json(&state, &jar).await?;
    let store = state.read().await;
    store
        .announcements
        .get(id)
        .cloned()
        .map(Json)
        .map_err(domain_error)
}

async fn create_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(draft): Json<AnnouncementDraft>,
) -> Result<Json<Announcement>, ApiError> {
    let user = require_user_json(&state, &jar).await?;
    let created = state
        .write()
        .await
        .announcements
        .create(draft, &user.display_name, Utc::now())
        .map_err(domain_error)?;

    info!(id = %created.id, author = %user.username, "announcement created");
    Ok(Json(created))
}

async fn update_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(patch): Json<AnnouncementPatch>,
) -> Result<Json<Announcement>, ApiError> {
    require_user_json(&state, &jar).await?;
    state
        .write()
        .await
        .announcements
        .update(id, patch, Utc::now())
        .map(Json)
        .map_err(domain_error)
}

async fn delete_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    let user = require_admin_json(&state, &jar).await?;
    state
        .write()
        .await
        .announcements
        .delete(id)
        .map_err(domain_error)?;

    info!(%id, by = %user.username, "announcement deleted");
    Ok(json_ok("已删除公告。"))
}

async fn publish_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>, ApiError> {
    require_user_json(&state, &jar).await?;
    state
        .write()
        .await
        .announcements
        .publish(id, Utc::now())
        .map(Json)
        .map_err(domain_error)
}

async fn archive_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Json<Announcement>, ApiError> {
    require_user_json(&state, &jar).await?;
    state
        .write()
        .await
        .announcements
        .archive(id, Utc::now())
        .map(Json)
        .map_err(domain_error)
}

async fn pin_announcement(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(request): Json<PinRequest>,
) -> Result<Json<Announcement>, ApiError> {
    require_user_json(&state, &jar).await?;
    state
        .write()
        .await
        .announcements
        .set_pinned(id, request.pinned, Utc::now())
        .map(Json)
        .map_err(domain_error)
}
