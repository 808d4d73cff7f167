use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{DomainError, DomainResult, clean_optional};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    All,
    User(Uuid),
}

impl Audience {
    fn includes(self, user_id: Uuid) -> bool {
        match self {
            Audience::All => true,
            Audience::User(id) => id == user_id,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    #[default]
    Info,
    Warning,
    Urgent,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub id: Uuid,
    pub audience: Audience,
    pub title: String,
    pub body: String,
    pub level: NotificationLevel,
    pub created_at: DateTime<Utc>,
    pub read_by: HashSet<Uuid>,
}

/// A notification from one reader's point of view.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationView {
    pub id: Uuid,
    pub audience: Audience,
    pub title: String,
    pub body: String,
    pub level: NotificationLevel,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl NotificationView {
    fn new(notification: &Notification, reader: Uuid) -> Self {
        Self {
            id: notification.id,
            audience: notification.audience,
            title: notification.title.clone(),
            body: notification.body.clone(),
            level: notification.level,
            created_at: notification.created_at,
            read: notification.read_by.contains(&reader),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewNotification {
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub level: NotificationLevel,
    /// Target a single account; omitted means everyone.
    #[serde(default)]
    pub user_id: Option<Uuid>,
}

#[derive(Default)]
pub struct NotificationCenter {
    notifications: Vec<Notification>,
}

impl NotificationCenter {
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.notifications.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    /// Notifications visible to `user_id`, newest first.
    pub fn list_for(&self, user_id: Uuid, unread_only: bool) -> Vec<NotificationView> {
        let mut visible: Vec<NotificationView> = self
            .notifications
            .iter()
            .filter(|n| n.audience.includes(user_id))
            .filter(|n| !unread_only || !n.read_by.contains(&user_id))
            .map(|n| NotificationView::new(n, user_id))
            .collect();
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        visible
    }

    pub fn unread_count(&self, user_id: Uuid) -> usize {
        self.notifications
            .iter()
            .filter(|n| n.audience.includes(user_id) && !n.read_by.contains(&user_id))
            .count()
    }

    pub fn create(
        &mut self,
        input: NewNotification,
        now: DateTime<Utc>,
    ) -> DomainResult<Notification> {
        let title = clean_optional(Some(&input.title))
            .ok_or_else(|| DomainError::invalid("请填写通知标题。"))?;
        let audience = input.user_id.map_or(Audience::All, Audience::User);
        Ok(self.push(audience, title, input.body.trim().to_string(), input.level, now))
    }

    /// System notice addressed to every account.
    pub fn broadcast(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        level: NotificationLevel,
        now: DateTime<Utc>,
    ) -> Notification {
        self.push(Audience::All, title.into(), body.into(), level, now)
    }

    fn push(
        &mut self,
        audience: Audience,
        title: String,
        body: String,
        level: NotificationLevel,
        now: DateTime<Utc>,
    ) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            audience,
            title,
            body,
            level,
            created_at: now,
            read_by: HashSet::new(),
        };
        self.notifications.push(notification.clone());
        notification
    }

    pub fn mark_read(&mut self, id: Uuid, user_id: Uuid) -> DomainResult<()> {
        let notification = self
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.audience.includes(user_id))
            .ok_or(DomainError::NotFound("未找到该通知。"))?;
        notification.read_by.insert(user_id);
        Ok(())
    }

    /// Returns how many notifications changed from unread to read.
    pub fn mark_all_read(&mut self, user_id: Uuid) -> usize {
        self.notifications
            .iter_mut()
            .filter(|n| n.audience.includes(user_id))
            .filter(|n| !n.read_by.contains(&user_id))
            .map(|n| n.read_by.insert(user_id))
            .count()
    }

    pub fn delete(&mut self, id: Uuid) -> DomainResult<()> {
        let before = self.notifications.len();
        self.notifications.retain(|n| n.id != id);
        if self.notifications.len() == before {
            return Err(DomainError::NotFound("未找到该通知。"));
        }
        Ok(())
    }
}
