pub mod admin;
pub mod admin_utils;
pub mod auth;
pub mod client;
pub mod landing;
pub mod responses;
pub mod router;
pub mod state;
pub mod templates;

pub use auth::AuthUser;
pub use client::ClientKey;
pub use responses::{ApiError, ApiMessage, domain_error, json_error, json_ok};
pub use state::AppState;
pub use templates::{
    AdminLink, PageLayout, SITE_TITLE, escape_html, render_footer, render_login_page, render_page,
};
