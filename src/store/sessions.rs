use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

pub const SESSION_TTL_DAYS: i64 = 7;

#[derive(Clone, Debug)]
struct Session {
    user_id: Uuid,
    expires_at: DateTime<Utc>,
}

/// Login sessions keyed by the random token stored in the session cookie.
#[derive(Default)]
pub struct SessionStore {
    sessions: HashMap<Uuid, Session>,
}

impl SessionStore {
    pub fn create(&mut self, user_id: Uuid, now: DateTime<Utc>) -> Uuid {
        let token = Uuid::new_v4();
        self.sessions.insert(
            token,
            Session {
                user_id,
                expires_at: now + Duration::days(SESSION_TTL_DAYS),
            },
        );
        token
    }

    pub fn resolve(&self, token: Uuid, now: DateTime<Utc>) -> Option<Uuid> {
        self.sessions
            .get(&token)
            .filter(|session| session.expires_at > now)
            .map(|session| session.user_id)
    }

    pub fn revoke(&mut self, token: Uuid) -> bool {
        self.sessions.remove(&token).is_some()
    }

    pub fn revoke_user(&mut self, user_id: Uuid) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.user_id != user_id);
        before - self.sessions.len()
    }

    pub fn purge_expired(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| session.expires_at > now);
        before - self.sessions.len()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
