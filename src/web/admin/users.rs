use axum::{
    Json,
    extract::{Form, Query, State},
    response::Redirect,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};

use crate::{
    maintenance::{self, MaintenanceUpdate},
    store::{AccountView, DomainError, NewAccount},
    web::{ApiError, AppState, auth::require_admin_json},
};

use super::auth::require_admin_user;

#[derive(Deserialize)]
pub(crate) struct CreateUserForm {
    username: String,
    password: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    is_admin: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct UpdatePasswordForm {
    username: String,
    password: String,
}

#[derive(Deserialize)]
pub(crate) struct UserStatusForm {
    username: String,
    disabled: bool,
}

#[derive(Deserialize)]
pub(crate) struct DeleteUserForm {
    username: String,
}

#[derive(Deserialize)]
pub(crate) struct MaintenanceForm {
    #[serde(default)]
    enabled: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Default, Deserialize)]
pub(crate) struct UserListQuery {
    #[serde(default)]
    keyword: Option<String>,
}

fn to_dashboard(query: &str) -> Redirect {
    Redirect::to(&format!("/dashboard?{query}"))
}

pub async fn create_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<CreateUserForm>,
) -> Result<Redirect, Redirect> {
    let admin = require_admin_user(&state, &jar).await?;

    if form.username.trim().is_empty() {
        return Ok(to_dashboard("error=missing_username"));
    }
    if form.password.trim().is_empty() {
        return Ok(to_dashboard("error=missing_password"));
    }

    let result = state.write().await.accounts.create(
        NewAccount {
            username: &form.username,
            display_name: form.display_name.as_deref(),
            password: &form.password,
            is_admin: form.is_admin.is_some(),
        },
        Utc::now(),
    );

    match result {
        Ok(created) => {
            info!(username = %created.username, by = %admin.username, "account created");
            Ok(to_dashboard("status=created"))
        }
        Err(DomainError::Conflict(_)) => Ok(to_dashboard("error=duplicate")),
        Err(DomainError::Invalid(_)) => Ok(to_dashboard("error=invalid_account")),
        Err(err) => {
            error!(?err, "failed to create user");
            Ok(to_dashboard("error=hash_failed"))
        }
    }
}

pub async fn update_user_password(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<UpdatePasswordForm>,
) -> Result<Redirect, Redirect> {
    let admin = require_admin_user(&state, &jar).await?;

    if form.username.trim().is_empty() {
        return Ok(to_dashboard("error=user_missing"));
    }
    if form.password.trim().is_empty() {
        return Ok(to_dashboard("error=password_missing"));
    }

    let result = state
        .write()
        .await
        .accounts
        .reset_password(&form.username, &form.password);

    match result {
        Ok(()) => {
            info!(username = %form.username.trim(), by = %admin.username, "password reset");
            Ok(to_dashboard("status=password_updated"))
        }
        Err(DomainError::NotFound(_)) => Ok(to_dashboard("error=user_missing")),
        Err(DomainError::Invalid(_)) => Ok(to_dashboard("error=password_too_short")),
        Err(err) => {
            error!(?err, "failed to update user password");
            Ok(to_dashboard("error=hash_failed"))
        }
    }
}

pub async fn update_user_status(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<UserStatusForm>,
) -> Result<Redirect, Redirect> {
    let admin = require_admin_user(&state, &jar).await?;

    let mut store = state.write().await;
    match store
        .accounts
        .set_disabled(admin.id, &form.username, form.disabled)
    {
        Ok(user_id) => {
            if form.disabled {
                let revoked = store.sessions.revoke_user(user_id);
                info!(username = %form.username, revoked, by = %admin.username, "account disabled");
                Ok(to_dashboard("status=user_disabled"))
            } else {
                info!(username = %form.username, by = %admin.username, "account enabled");
                Ok(to_dashboard("status=user_enabled"))
            }
        }
        Err(DomainError::NotFound(_)) => Ok(to_dashboard("error=user_missing")),
        Err(_) => Ok(to_dashboard("error=cannot_disable")),
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<DeleteUserForm>,
) -> Result<Redirect, Redirect> {
    let admin = require_admin_user(&state, &jar).await?;

    let mut store = state.write().await;
    match store.accounts.delete(admin.id, &form.username) {
        Ok(user_id) => {
            store.sessions.revoke_user(user_id);
            info!(username = %form.username, by = %admin.username, "account deleted");
            Ok(to_dashboard("status=user_deleted"))
        }
        Err(DomainError::NotFound(_)) => Ok(to_dashboard("error=user_missing")),
        Err(_) => Ok(to_dashboard("error=cannot_delete")),
    }
}

pub async fn toggle_maintenance(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<MaintenanceForm>,
) -> Result<Redirect, Redirect> {
    let admin = require_admin_user(&state, &jar).await?;

    let update = MaintenanceUpdate {
        enabled: form.enabled.is_some(),
        message: form.message,
    };
    match maintenance::apply_update(&state, &update, &admin.username).await {
        Ok(mode) if mode.enabled => Ok(to_dashboard("status=maintenance_on")),
        Ok(_) => Ok(to_dashboard("status=maintenance_off")),
        Err(_) => Ok(to_dashboard("error=maintenance_invalid")),
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<UserListQuery>,
) -> Result<Json<Vec<AccountView>>, ApiError> {
    require_admin_json(&state, &jar).await?;
    Ok(Json(
        state.read().await.accounts.list(query.keyword.as_deref()),
    ))
}
