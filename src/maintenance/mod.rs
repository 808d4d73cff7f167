//! Maintenance mode: a single process-wide switch that sends everyone but
//! administrators to a static notice page.

pub mod cleanup;

use axum::{
    Json, Router,
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    config::AppConfig,
    store::{DomainError, DomainResult, clean_optional},
    web::{
        ApiError, AppState, SITE_TITLE,
        auth::{current_user, require_admin_json},
        domain_error, escape_html, json_error, render_footer,
    },
};

pub const MAINTENANCE_PATH: &str = "/maintenance";
const MAX_MESSAGE_CHARS: usize = 200;

const EXEMPT_PATHS: &[&str] = &[
    MAINTENANCE_PATH,
    "/login",
    "/logout",
    "/healthz",
    "/api/auth/login",
];

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceMode {
    pub enabled: bool,
    pub message: String,
    pub updated_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
}

impl MaintenanceMode {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            enabled: config.maintenance_enabled,
            message: config.maintenance_message.clone(),
            updated_at: None,
            updated_by: None,
        }
    }

    /// Flips the switch. A blank message keeps the current one.
    pub fn set(
        &mut self,
        enabled: bool,
        message: Option<&str>,
        actor: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let message = clean_optional(message);
        if message
            .as_ref()
            .is_some_and(|text| text.chars().count() > MAX_MESSAGE_CHARS)
        {
            return Err(DomainError::invalid(format!(
                "维护提示语不能超过 {MAX_MESSAGE_CHARS} 个字符。"
            )));
        }

        self.enabled = enabled;
        if let Some(message) = message {
            self.message = message;
        }
        self.updated_at = Some(now);
        self.updated_by = Some(actor.to_string());
        Ok(())
    }
}

#[derive(Deserialize)]
pub struct MaintenanceUpdate {
    pub enabled: bool,
    #[serde(default)]
    pub message: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(MAINTENANCE_PATH, get(maintenance_page))
        .route("/api/maintenance", get(status).put(update))
}

/// Requests that stay reachable while maintenance mode is on.
pub fn is_exempt(method: &Method, path: &str) -> bool {
    EXEMPT_PATHS.contains(&path) || (method == Method::GET && path == "/api/maintenance")
}

/// Middleware in front of every route.
pub async fn gate(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let message = {
        let mode = state.maintenance().read().await;
        if !mode.enabled {
            return next.run(request).await;
        }
        mode.message.clone()
    };

    if is_exempt(request.method(), request.uri().path()) {
        return next.run(request).await;
    }
    if current_user(&state, &jar)
        .await
        .is_some_and(|user| user.is_admin)
    {
        return next.run(request).await;
    }

    if request.uri().path().starts_with("/api/") {
        return json_error(StatusCode::SERVICE_UNAVAILABLE, message).into_response();
    }
    Redirect::to(MAINTENANCE_PATH).into_response()
}

async fn status(State(state): State<AppState>) -> Json<MaintenanceMode> {
    Json(state.maintenance().read().await.clone())
}

async fn update(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(update): Json<MaintenanceUpdate>,
) -> Result<Json<MaintenanceMode>, ApiError> {
    let user = require_admin_json(&state, &jar).await?;
    let mode = apply_update(&state, &update, &user.username).await.map_err(domain_error)?;
    Ok(Json(mode))
}

/// Shared by the JSON endpoint and the dashboard form.
pub async fn apply_update(
    state: &AppState,
    update: &MaintenanceUpdate,
    actor: &str,
) -> DomainResult<MaintenanceMode> {
    let mut mode = state.maintenance().write().await;
    mode.set(update.enabled, update.message.as_deref(), actor, Utc::now())?;
    info!(enabled = mode.enabled, by = %actor, "maintenance mode updated");
    Ok(mode.clone())
}

async fn maintenance_page(State(state): State<AppState>) -> Result<Html<String>, Redirect> {
    let mode = state.maintenance().read().await.clone();
    if !mode.enabled {
        return Err(Redirect::to("/"));
    }
    Ok(Html(render_maintenance_page(&mode)))
}

fn render_maintenance_page(mode: &MaintenanceMode) -> String {
    let footer = render_footer();
    let message = escape_html(&mode.message);
    let updated = mode
        .updated_at
        .map(|at| format!(r#"<p class="meta">更新时间：{}</p>"#, at.format("%Y-%m-%d %H:%M UTC")))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
    <meta charset="UTF-8">
    <title>系统维护中 - {SITE_TITLE}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="robots" content="noindex,nofollow">
    <style>
        body {{ font-family: "Helvetica Neue", Arial, sans-serif; display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; margin: 0; background: #f1f5f9; color: #0f172a; padding: 1.5rem; box-sizing: border-box; }}
        .panel {{ background: #ffffff; padding: 2.5rem 2.25rem; border-radius: 18px; box-shadow: 0 20px 60px rgba(15, 23, 42, 0.08); max-width: 520px; width: 100%; border: 1px solid #e2e8f0; text-align: center; box-sizing: border-box; }}
        h1 {{ margin: 0 0 1rem; font-size: 1.7rem; }}
        p {{ color: #475569; line-height: 1.7; }}
        p.meta {{ font-size: 0.85rem; color: #94a3b8; }}
        a {{ color: #1d4ed8; font-weight: 600; text-decoration: none; }}
        .app-footer {{ margin-top: 2rem; font-size: 0.85rem; color: #64748b; }}
    </style>
</head>
<body>
    <section class="panel">
        <h1>系统维护中</h1>
        <p>{message}</p>
        {updated}
        <p><a href="/login">管理员登录</a></p>
    </section>
    {footer}
</body>
</html>"#,
    )
}
