pub mod announcements;
pub mod api_docs;
pub mod families;
pub mod messages;
pub mod notifications;
pub mod reports;
