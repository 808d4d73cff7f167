mod filter;
mod inbox;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    modules::notifications::NotificationLevel,
    web::{
        ApiError, ApiMessage, AppState, ClientKey,
        auth::{require_admin_json, require_user_json},
        domain_error, json_error, json_ok,
    },
};

pub use filter::MessageFilter;
pub use inbox::{MessageInbox, MessageStatus, MessageSubmission, PublicMessage};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/public/messages", post(submit_message))
        .route("/api/messages", get(list_messages))
        .route("/api/messages/:id", delete(delete_message))
        .route("/api/messages/:id/reply", post(reply_message))
        .route("/api/messages/:id/hide", post(hide_message))
}

#[derive(Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    status: Option<MessageStatus>,
}

#[derive(Deserialize)]
struct ReplyRequest {
    reply: String,
}

async fn submit_message(
    State(state): State<AppState>,
    ClientKey(client_key): ClientKey,
    Json(submission): Json<MessageSubmission>,
) -> Result<Json<ApiMessage>, ApiError> {
    let now = Utc::now();
    let mut filter = state.filter().lock().await;

    if let Err(rejection) = filter.check(&client_key, &submission.content, now) {
        let status = if rejection.is_rate_limit() {
            StatusCode::TOO_MANY_REQUESTS
        } else {
            StatusCode::BAD_REQUEST
        };
        warn!(client = %client_key, reason = ?rejection, "public message rejected");
        return Err(json_error(status, rejection.message()));
    }

    let message = {
        let mut store = state.write().await;
        let message = store
            .messages
            .submit(submission, &client_key, now)
            .map_err(domain_error)?;
        store.notifications.broadcast(
            "收到新的群众留言",
            format!("{} 提交了一条留言，请及时处理。", message.name),
            NotificationLevel::Info,
            now,
        );
        message
    };
    filter.record(&client_key, now);

    info!(id = %message.id, client = %client_key, "public message accepted");
    Ok(json_ok("留言已提交，我们会尽快回复。"))
}

async fn list_messages(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<PublicMessage>>, ApiError> {
    require_user_json(&state, &jar).await?;
    Ok(Json(state.read().await.messages.list(query.status)))
}

async fn reply_message(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
    Json(request): Json<ReplyRequest>,
) -> Result<Json<PublicMessage>, ApiError> {
    let user = require_user_json(&state, &jar).await?;
    let message = state
        .write()
        .await
        .messages
        .reply(id, &request.reply, Utc::now())
        .map_err(domain_error)?;

    info!(%id, by = %user.username, "public message replied");
    Ok(Json(message))
}

async fn hide_message(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicMessage>, ApiError> {
    require_user_json(&state, &jar).await?;
    state
        .write()
        .await
        .messages
        .hide(id)
        .map(Json)
        .map_err(domain_error)
}

async fn delete_message(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiMessage>, ApiError> {
    let user = require_admin_json(&state, &jar).await?;
    state
        .write()
        .await
        .messages
        .delete(id)
        .map_err(domain_error)?;

    info!(%id, by = %user.username, "public message deleted");
    Ok(json_ok("已删除留言。"))
}
