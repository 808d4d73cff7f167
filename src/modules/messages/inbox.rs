use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{DomainError, DomainResult, clean_optional};

const MAX_NAME_CHARS: usize = 20;
const MAX_CONTACT_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Replied,
    Hidden,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublicMessage {
    pub id: Uuid,
    pub name: String,
    pub contact: Option<String>,
    pub content: String,
    pub client_key: String,
    pub status: MessageStatus,
    pub reply: Option<String>,
    pub created_at: DateTime<Utc>,
    pub replied_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageSubmission {
    pub name: String,
    #[serde(default)]
    pub contact: Option<String>,
    pub content: String,
}

#[derive(Default)]
pub struct MessageInbox {
    messages: Vec<PublicMessage>,
}

impl MessageInbox {
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.messages.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn count_pending(&self) -> usize {
        self.messages
            .iter()
            .filter(|message| message.status == MessageStatus::Pending)
            .count()
    }

    /// Stores a submission that already passed the message filter.
    pub fn submit(
        &mut self,
        submission: MessageSubmission,
        client_key: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<PublicMessage> {
        let name = clean_optional(Some(&submission.name))
            .ok_or_else(|| DomainError::invalid("请填写称呼。"))?;
        if name.chars().count() > MAX_NAME_CHARS {
            return Err(DomainError::invalid(format!(
                "称呼不能超过 {MAX_NAME_CHARS} 个字符。"
            )));
        }
        let contact = clean_optional(submission.contact.as_deref());
        if contact
            .as_ref()
            .is_some_and(|value| value.chars().count() > MAX_CONTACT_CHARS)
        {
            return Err(DomainError::invalid(format!(
                "联系方式不能超过 {MAX_CONTACT_CHARS} 个字符。"
            )));
        }

        let message = PublicMessage {
            id: Uuid::new_v4(),
            name,
            contact,
            content: submission.content.trim().to_string(),
            client_key: client_key.to_string(),
            status: MessageStatus::Pending,
            reply: None,
            created_at: now,
            replied_at: None,
        };
        self.messages.push(message.clone());
        Ok(message)
    }

    pub fn list(&self, status: Option<MessageStatus>) -> Vec<PublicMessage> {
        let mut messages: Vec<PublicMessage> = self
            .messages
            .iter()
            .filter(|message| status.is_none_or(|status| message.status == status))
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        messages
    }

    fn get_mut(&mut self, id: Uuid) -> DomainResult<&mut PublicMessage> {
        self.messages
            .iter_mut()
            .find(|message| message.id == id)
            .ok_or(DomainError::NotFound("未找到该留言。"))
    }

    pub fn reply(
        &mut self,
        id: Uuid,
        reply: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<PublicMessage> {
        let reply = clean_optional(Some(reply))
            .ok_or_else(|| DomainError::invalid("回复内容不能为空。"))?;
        let message = self.get_mut(id)?;
        message.reply = Some(reply);
        message.status = MessageStatus::Replied;
        message.replied_at = Some(now);
        Ok(message.clone())
    }

    pub fn hide(&mut self, id: Uuid) -> DomainResult<PublicMessage> {
        let message = self.get_mut(id)?;
        message.status = MessageStatus::Hidden;
        Ok(message.clone())
    }

    pub fn delete(&mut self, id: Uuid) -> DomainResult<()> {
        let before = self.messages.len();
        self.messages.retain(|message| message.id != id);
        if self.messages.len() == before {
            return Err(DomainError::NotFound("未找到该留言。"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn submission(name: &str, content: &str) -> MessageSubmission {
        MessageSubmission {
            name: name.to_string(),
            contact: Some("  ".to_string()),
            content: content.to_string(),
        }
    }

    #[test]
    fn submit_validates_name_and_trims_fields() {
        let mut inbox = MessageInbox::default();
        let now = Utc::now();

        assert!(inbox.submit(submission(" ", "你好"), "ip", now).is_err());
        assert!(inbox
            .submit(submission(&"名".repeat(21), "你好"), "ip", now)
            .is_err());

        let message = inbox
            .submit(submission(" 张女士 ", " 请问如何申请低保？ "), "10.0.0.1", now)
            .unwrap();
        assert_eq!(message.name, "张女士");
        assert_eq!(message.content, "请问如何申请低保？");
        assert!(message.contact.is_none());
        assert_eq!(message.status, MessageStatus::Pending);
        assert_eq!(inbox.count_pending(), 1);
    }

    #[test]
    fn reply_and_hide_change_status() {
        let mut inbox = MessageInbox::default();
        let now = Utc::now();
        let first = inbox.submit(submission("甲", "一"), "ip", now).unwrap();
        let second = inbox
            .submit(submission("乙", "二"), "ip", now + Duration::seconds(5))
            .unwrap();

        assert!(inbox.reply(first.id, "  ", now).is_err());
        let replied = inbox.reply(first.id, "已收到，谢谢。", now).unwrap();
        assert_eq!(replied.status, MessageStatus::Replied);
        assert!(replied.replied_at.is_some());

        inbox.hide(second.id).unwrap();
        assert_eq!(inbox.count_pending(), 0);

        let all = inbox.list(None);
        assert_eq!(all[0].id, second.id);
        assert_eq!(inbox.list(Some(MessageStatus::Hidden)).len(), 1);
    }

    #[test]
    fn delete_reports_missing_messages() {
        let mut inbox = MessageInbox::default();
        let message = inbox.submit(submission("丙", "三"), "ip", Utc::now()).unwrap();

        inbox.delete(message.id).unwrap();
        assert!(inbox.is_empty());
        assert!(matches!(inbox.delete(message.id), Err(DomainError::NotFound(_))));
    }
}
