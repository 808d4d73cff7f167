use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{DomainError, DomainResult, matches_keyword};

const TITLE_MAX_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementCategory {
    Policy,
    Notice,
    Event,
}

impl AnnouncementCategory {
    pub fn label_zh(self) -> &'static str {
        match self {
            AnnouncementCategory::Policy => "政策解读",
            AnnouncementCategory::Notice => "通知公告",
            AnnouncementCategory::Event => "活动资讯",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementStatus {
    Draft,
    Published,
    Archived,
}

#[derive(Debug, Clone, Serialize)]
pub struct Announcement {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub category: AnnouncementCategory,
    pub status: AnnouncementStatus,
    pub pinned: bool,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub published_at: Option<DateTime<Utc>>,
}

impl Announcement {
    fn sort_instant(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnnouncementDraft {
    pub title: String,
    pub content: String,
    pub category: AnnouncementCategory,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub publish: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<AnnouncementCategory>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnnouncementFilter {
    #[serde(default)]
    pub status: Option<AnnouncementStatus>,
    #[serde(default)]
    pub category: Option<AnnouncementCategory>,
    #[serde(default)]
    pub keyword: Option<String>,
}

#[derive(Default)]
pub struct AnnouncementBoard {
    items: Vec<Announcement>,
}

impl AnnouncementBoard {
    /// Pinned entries first, then newest by publication (or creation) time.
    pub fn list(&self, filter: &AnnouncementFilter) -> Vec<Announcement> {
        let mut items: Vec<Announcement> = self
            .items
            .iter()
            .filter(|item| filter.status.is_none_or(|status| item.status == status))
            .filter(|item| {
                filter
                    .category
                    .is_none_or(|category| item.category == category)
            })
            .filter(|item| {
                filter
                    .keyword
                    .as_deref()
                    .is_none_or(|keyword| matches_keyword(keyword, &[&item.title, &item.content]))
            })
            .cloned()
            .collect();

        items.sort_by(|a, b| {
            b.pinned
                .cmp(&a.pinned)
                .then_with(|| b.sort_instant().cmp(&a.sort_instant()))
        });
        items
    }

    pub fn published(&self) -> Vec<Announcement> {
        self.list(&AnnouncementFilter {
            status: Some(AnnouncementStatus::Published),
            ..AnnouncementFilter::default()
        })
    }

    pub fn get(&self, id: Uuid) -> DomainResult<&Announcement> {
        self.items
            .iter()
            .find(|item| item.id == id)
            .ok_or(DomainError::NotFound("未找到该公告。"))
    }

    fn get_mut(&mut self, id: Uuid) -> DomainResult<&mut Announcement> {
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or(DomainError::NotFound("未找到该公告。"))
    }

    pub fn create(
        &mut self,
        draft: AnnouncementDraft,
        author: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Announcement> {
        let title = validate_title(&draft.title)?;
        let content = validate_content(&draft.content)?;

        let (status, published_at) = if draft.publish {
            (AnnouncementStatus::Published, Some(now))
        } else {
            (AnnouncementStatus::Draft, None)
        };

        let announcement = Announcement {
            id: Uuid::new_v4(),
            title,
            content,
            category: draft.category,
            status,
            pinned: draft.pinned,
            author: author.to_string(),
            created_at: now,
            updated_at: now,
            published_at,
        };
        self.items.push(announcement.clone());
        Ok(announcement)
    }

    pub fn update(
        &mut self,
        id: Uuid,
        patch: AnnouncementPatch,
        now: DateTime<Utc>,
    ) -> DomainResult<Announcement> {
        let title = patch.title.as_deref().map(validate_title).transpose()?;
        let content = patch.content.as_deref().map(validate_content).transpose()?;

        let item = self.get_mut(id)?;
        if let Some(title) = title {
            item.title = title;
        }
        if let Some(content) = content {
            item.content = content;
        }
        if let Some(category) = patch.category {
            item.category = category;
        }
        item.updated_at = now;
        Ok(item.clone())
    }

    /// Publishes a draft or restores an archived entry. The first publication time is kept.
    pub fn publish(&mut self, id: Uuid, now: DateTime<Utc>) -> DomainResult<Announcement> {
        let item = self.get_mut(id)?;
        item.status = AnnouncementStatus::Published;
        item.published_at.get_or_insert(now);
        item.updated_at = now;
        Ok(item.clone())
    }

    pub fn archive(&mut self, id: Uuid, now: DateTime<Utc>) -> DomainResult<Announcement> {
        let item = self.get_mut(id)?;
        if item.status == AnnouncementStatus::Draft {
            return Err(DomainError::invalid("草稿尚未发布，无需归档。"));
        }
        item.status = AnnouncementStatus::Archived;
        item.pinned = false;
        item.updated_at = now;
        Ok(item.clone())
    }

    pub fn set_pinned(
        &mut self,
        id: Uuid,
        pinned: bool,
        now: DateTime<Utc>,
    ) -> DomainResult<Announcement> {
        let item = self.get_mut(id)?;
        if pinned && item.status == AnnouncementStatus::Archived {
            return Err(DomainError::invalid("已归档的公告不能置顶。"));
        }
        item.pinned = pinned;
        item.updated_at = now;
        Ok(item.clone())
    }

    pub fn delete(&mut self, id: Uuid) -> DomainResult<()> {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        if self.items.len() == before {
            return Err(DomainError::NotFound("未找到该公告。"));
        }
        Ok(())
    }

    pub fn count_published(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status == AnnouncementStatus::Published)
            .count()
    }
}

fn validate_title(raw: &str) -> DomainResult<String> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(DomainError::invalid("请填写公告标题。"));
    }
    if title.chars().count() > TITLE_MAX_CHARS {
        return Err(DomainError::invalid(format!(
            "公告标题不能超过 {TITLE_MAX_CHARS} 个字符。"
        )));
    }
    Ok(title.to_string())
}

fn validate_content(raw: &str) -> DomainResult<String> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(DomainError::invalid("请填写公告内容。"));
    }
    Ok(content.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn draft(title: &str, publish: bool) -> AnnouncementDraft {
        AnnouncementDraft {
            title: title.to_string(),
            content: "内容".to_string(),
            category: AnnouncementCategory::Notice,
            pinned: false,
            publish,
        }
    }

    #[test]
    fn create_validates_title_and_content() {
        let mut board = AnnouncementBoard::default();
        let now = Utc::now();

        assert!(board.create(draft("   ", false), "admin", now).is_err());
        assert!(board.create(draft(&"长".repeat(101), false), "admin", now).is_err());

        let mut empty_body = draft("标题", false);
        empty_body.content = " ".to_string();
        assert!(board.create(empty_body, "admin", now).is_err());

        let created = board.create(draft("  标题  ", false), "admin", now).unwrap();
        assert_eq!(created.title, "标题");
        assert_eq!(created.status, AnnouncementStatus::Draft);
        assert!(created.published_at.is_none());
    }

    #[test]
    fn list_orders_pinned_first_then_newest() {
        let mut board = AnnouncementBoard::default();
        let base = Utc::now();

        let old = board.create(draft("旧", true), "admin", base).unwrap();
        let new = board
            .create(draft("新", true), "admin", base + Duration::hours(1))
            .unwrap();
        let pinned = board
            .create(draft("置顶", true), "admin", base - Duration::days(3))
            .unwrap();
        board.set_pinned(pinned.id, true, base).unwrap();

        let ids: Vec<Uuid> = board.published().iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![pinned.id, new.id, old.id]);
    }

    #[test]
    fn public_feed_excludes_drafts_and_archived() {
        let mut board = AnnouncementBoard::default();
        let now = Utc::now();

        board.create(draft("草稿", false), "admin", now).unwrap();
        let archived = board.create(draft("归档", true), "admin", now).unwrap();
        board.archive(archived.id, now).unwrap();
        let live = board.create(draft("发布", true), "admin", now).unwrap();

        let feed = board.published();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, live.id);
        assert_eq!(board.count_published(), 1);
    }

    #[test]
    fn republishing_keeps_first_publication_time() {
        let mut board = AnnouncementBoard::default();
        let first = Utc::now();
        let later = first + Duration::days(2);

        let item = board.create(draft("公告", true), "admin", first).unwrap();
        board.archive(item.id, later).unwrap();
        let restored = board.publish(item.id, later).unwrap();

        assert_eq!(restored.status, AnnouncementStatus::Published);
        assert_eq!(restored.published_at, Some(first));
        assert_eq!(restored.updated_at, later);
    }

    #[test]
    fn drafts_cannot_be_archived_and_archived_cannot_be_pinned() {
        let mut board = AnnouncementBoard::default();
        let now = Utc::now();
        let item = board.create(draft("草稿", false), "admin", now).unwrap();

        assert!(board.archive(item.id, now).is_err());
        board.publish(item.id, now).unwrap();
        board.archive(item.id, now).unwrap();
        assert!(board.set_pinned(item.id, true, now).is_err());
    }

    #[test]
    fn update_and_delete_report_missing_entries() {
        let mut board = AnnouncementBoard::default();
        let now = Utc::now();
        assert_eq!(
            board.delete(Uuid::new_v4()),
            Err(DomainError::NotFound("未找到该公告。"))
        );

        let item = board.create(draft("公告", false), "admin", now).unwrap();
        let updated = board
            .update(
                item.id,
                AnnouncementPatch {
                    title: Some("新标题".to_string()),
                    category: Some(AnnouncementCategory::Policy),
                    ..AnnouncementPatch::default()
                },
                now,
            )
            .unwrap();
        assert_eq!(updated.title, "新标题");
        assert_eq!(updated.category, AnnouncementCategory::Policy);
        assert_eq!(updated.content, "内容");

        board.delete(item.id).unwrap();
        assert!(board.get(item.id).is_err());
    }
}
