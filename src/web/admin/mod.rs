mod auth;
mod dashboard;
mod types;
mod users;

pub use auth::require_signed_in_user;
pub use dashboard::dashboard;
pub use users::{
    create_user, delete_user, list_users, toggle_maintenance, update_user_password,
    update_user_status,
};
