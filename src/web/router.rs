use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{
    maintenance, modules,
    web::{AppState, admin, auth, landing},
};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing::landing_page))
        .route("/login", get(auth::login_page).post(auth::process_login))
        .route("/logout", post(auth::logout))
        .route("/healthz", get(healthz))
        .route("/api/auth/login", post(auth::api_login))
        .route("/api/auth/logout", post(auth::api_logout))
        .route("/api/auth/me", get(auth::api_me))
        .route("/api/users", get(admin::list_users))
        .route("/dashboard", get(admin::dashboard))
        .route("/dashboard/users", post(admin::create_user))
        .route(
            "/dashboard/users/password",
            post(admin::update_user_password),
        )
        .route("/dashboard/users/status", post(admin::update_user_status))
        .route("/dashboard/users/delete", post(admin::delete_user))
        .route("/dashboard/maintenance", post(admin::toggle_maintenance))
        .merge(maintenance::router())
        .merge(modules::announcements::router())
        .merge(modules::api_docs::router())
        .merge(modules::families::router())
        .merge(modules::reports::router())
        .merge(modules::notifications::router())
        .merge(modules::messages::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            maintenance::gate,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    StatusCode::OK
}
