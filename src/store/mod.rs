//! In-memory mock data shared by every dashboard module.
//!
//! Nothing here is persisted. The whole store lives behind one `RwLock` in
//! [`crate::web::AppState`] and each collection exposes plain synchronous
//! operations so they can be exercised directly in unit tests.

pub mod accounts;
mod seed;
pub mod sessions;

use std::fmt;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
    config::AppConfig,
    modules::{
        announcements::AnnouncementBoard, api_docs::ApiCatalog, families::FamilyRegistry,
        messages::MessageInbox, notifications::NotificationCenter,
    },
};

pub use accounts::{AccountDirectory, AccountView, NewAccount, UserAccount};
pub use sessions::{SESSION_TTL_DAYS, SessionStore};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Failure of a domain operation, carrying the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    NotFound(&'static str),
    Invalid(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    Internal(String),
}

impl DomainError {
    pub fn invalid(message: impl Into<String>) -> Self {
        DomainError::Invalid(message.into())
    }

    pub fn message(&self) -> &str {
        match self {
            DomainError::NotFound(message) => message,
            DomainError::Invalid(message)
            | DomainError::Conflict(message)
            | DomainError::Unauthorized(message)
            | DomainError::Forbidden(message)
            | DomainError::Internal(message) => message.as_str(),
        }
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for DomainError {}

pub type DomainResult<T> = Result<T, DomainError>;

/// One page of a filtered listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

/// Slices `items` into a 1-based page. Pages past the end are empty but keep the total.
pub fn paginate<T>(items: Vec<T>, page: Option<usize>, page_size: Option<usize>) -> Page<T> {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let total = items.len();
    let start = (page - 1).saturating_mul(page_size);

    let items = items.into_iter().skip(start).take(page_size).collect();

    Page {
        items,
        total,
        page,
        page_size,
    }
}

/// Trims optional free text, treating blank input as absent.
pub fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Case-insensitive substring match used by every keyword filter.
pub fn matches_keyword<S: AsRef<str>>(keyword: &str, fields: &[S]) -> bool {
    let needle = keyword.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .iter()
        .any(|field| field.as_ref().to_lowercase().contains(&needle))
}

pub struct MockStore {
    pub accounts: AccountDirectory,
    pub sessions: SessionStore,
    pub announcements: AnnouncementBoard,
    pub api_docs: ApiCatalog,
    pub families: FamilyRegistry,
    pub notifications: NotificationCenter,
    pub messages: MessageInbox,
}

impl MockStore {
    pub fn empty() -> Self {
        Self {
            accounts: AccountDirectory::default(),
            sessions: SessionStore::default(),
            announcements: AnnouncementBoard::default(),
            api_docs: ApiCatalog::default(),
            families: FamilyRegistry::default(),
            notifications: NotificationCenter::default(),
            messages: MessageInbox::default(),
        }
    }

    /// Builds the store with the configured administrator and, unless disabled, mock records.
    pub fn seeded(config: &AppConfig) -> Result<Self> {
        let mut store = Self::empty();
        seed::seed_admin(&mut store, config)?;
        seed::seed_api_docs(&mut store)?;
        if config.seed_mock_data {
            seed::seed_mock_data(&mut store, Utc::now())?;
        }
        Ok(store)
    }

    /// Resolves a session token to an enabled account.
    pub fn current_user(&self, token: Uuid, now: DateTime<Utc>) -> Option<&UserAccount> {
        let user_id = self.sessions.resolve(token, now)?;
        self.accounts.get(user_id).filter(|account| !account.disabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paginate_clamps_and_reports_total() {
        let items: Vec<u32> = (1..=25).collect();

        let first = paginate(items.clone(), None, None);
        assert_eq!(first.items, (1..=10).collect::<Vec<_>>());
        assert_eq!(first.total, 25);
        assert_eq!(first.page, 1);

        let last = paginate(items.clone(), Some(3), Some(10));
        assert_eq!(last.items, vec![21, 22, 23, 24, 25]);

        let beyond = paginate(items.clone(), Some(9), Some(10));
        assert!(beyond.items.is_empty());
        assert_eq!(beyond.total, 25);

        let clamped = paginate(items, Some(0), Some(1000));
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.page_size, MAX_PAGE_SIZE);
        assert_eq!(clamped.items.len(), 25);
    }

    #[test]
    fn keyword_matching_ignores_case_and_blank_needles() {
        assert!(matches_keyword("  ", &["anything"]));
        assert!(matches_keyword("ABC", &["xx", "zabcz"]));
        assert!(!matches_keyword("低保", &["临时救助"]));
    }

    #[test]
    fn seeded_store_contains_admin_and_mock_records() {
        let config = AppConfig::default();
        let store = MockStore::seeded(&config).unwrap();

        let admin = store.accounts.find_by_username("admin").unwrap();
        assert!(admin.is_admin);
        assert!(!store.families.is_empty());
        assert!(!store.announcements.published().is_empty());
        assert!(!store.api_docs.list(None, None).is_empty());
    }

    #[test]
    fn seeding_can_skip_mock_records() {
        let config = AppConfig {
            seed_mock_data: false,
            ..AppConfig::default()
        };
        let store = MockStore::seeded(&config).unwrap();
        assert!(store.families.is_empty());
        assert!(store.accounts.find_by_username("admin").is_some());
    }
}
