use axum::{
    Json,
    extract::{Form, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use cookie::time::Duration as CookieDuration;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    store::{DomainError, SESSION_TTL_DAYS, UserAccount},
    web::{ApiError, AppState, domain_error, json_error, json_ok, render_login_page},
};

pub const SESSION_COOKIE: &str = "auth_token";

/// The signed-in account as seen by handlers.
#[derive(Clone, Debug, Serialize)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub is_admin: bool,
}

impl From<&UserAccount> for AuthUser {
    fn from(account: &UserAccount) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            display_name: account.display_name.clone(),
            is_admin: account.is_admin,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Html<String>, Redirect> {
    if current_user(&state, &jar).await.is_some() {
        return Err(Redirect::to("/"));
    }

    Ok(Html(render_login_page(None)))
}

pub async fn process_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<(CookieJar, Redirect), (StatusCode, Html<String>)> {
    match sign_in(&state, &form.username, &form.password).await {
        Ok((_, token)) => Ok((jar.add(session_cookie(token)), Redirect::to("/"))),
        Err(DomainError::Internal(detail)) => {
            error!(%detail, "failed to process login");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>服务器错误</h1><p>请稍后再试。</p>".to_string()),
            ))
        }
        Err(err) => Err((
            StatusCode::UNAUTHORIZED,
            Html(render_login_page(Some(err.message()))),
        )),
    }
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Redirect) {
    (sign_out(&state, jar).await, Redirect::to("/?status=logged_out"))
}

pub async fn api_login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(form): Json<LoginForm>,
) -> Result<(CookieJar, Json<AuthUser>), ApiError> {
    let (user, token) = sign_in(&state, &form.username, &form.password)
        .await
        .map_err(domain_error)?;
    Ok((jar.add(session_cookie(token)), Json(user)))
}

pub async fn api_logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<crate::web::ApiMessage>) {
    (sign_out(&state, jar).await, json_ok("已退出登录。"))
}

pub async fn api_me(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<AuthUser>, ApiError> {
    require_user_json(&state, &jar).await.map(Json)
}

async fn sign_in(
    state: &AppState,
    username: &str,
    password: &str,
) -> Result<(AuthUser, Uuid), DomainError> {
    let now = Utc::now();
    let mut store = state.write().await;

    let account = match store.accounts.authenticate(username, password, now) {
        Ok(account) => account,
        Err(err) => {
            warn!(username = %username.trim(), "rejected login attempt");
            return Err(err);
        }
    };
    let token = store.sessions.create(account.id, now);

    info!(username = %account.username, "user signed in");
    Ok((
        AuthUser {
            id: account.id,
            username: account.username,
            display_name: account.display_name,
            is_admin: account.is_admin,
        },
        token,
    ))
}

async fn sign_out(state: &AppState, jar: CookieJar) -> CookieJar {
    if let Some(token) = session_token(&jar) {
        state.write().await.sessions.revoke(token);
    }

    let mut removal = Cookie::new(SESSION_COOKIE, "");
    removal.set_path("/");
    removal.set_http_only(true);
    removal.set_same_site(SameSite::Lax);
    removal.set_max_age(CookieDuration::seconds(0));
    jar.remove(removal)
}

fn session_cookie(token: Uuid) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_max_age(CookieDuration::days(SESSION_TTL_DAYS));
    cookie
}

pub fn session_token(jar: &CookieJar) -> Option<Uuid> {
    let cookie = jar.get(SESSION_COOKIE)?;
    Uuid::parse_str(cookie.value()).ok()
}

pub async fn current_user(state: &AppState, jar: &CookieJar) -> Option<AuthUser> {
    let token = session_token(jar)?;
    let store = state.read().await;
    store.current_user(token, Utc::now()).map(AuthUser::from)
}

pub async fn require_user_json(state: &AppState, jar: &CookieJar) -> Result<AuthUser, ApiError> {
    current_user(state, jar)
        .await
        .ok_or_else(|| json_error(StatusCode::UNAUTHORIZED, "请先登录。"))
}

pub async fn require_admin_json(state: &AppState, jar: &CookieJar) -> Result<AuthUser, ApiError> {
    let user = require_user_json(state, jar).await?;
    if !user.is_admin {
        return Err(json_error(StatusCode::FORBIDDEN, "需要管理员权限。"));
    }
    Ok(user)
}
