use axum::response::Redirect;
use axum_extra::extract::cookie::CookieJar;

use crate::web::{AppState, AuthUser, auth::current_user};

pub async fn require_signed_in_user(
    state: &AppState,
    jar: &CookieJar,
) -> Result<AuthUser, Redirect> {
    current_user(state, jar)
        .await
        .ok_or_else(|| Redirect::to("/login"))
}

pub async fn require_admin_user(state: &AppState, jar: &CookieJar) -> Result<AuthUser, Redirect> {
    let auth_user = require_signed_in_user(state, jar).await?;

    if !auth_user.is_admin {
        return Err(Redirect::to("/?error=not_authorized"));
    }

    Ok(auth_user)
}
