use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Keyed mapping from session id to user. Expiry is enforced on lookup;
/// nothing sweeps in the background.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, user_id: i64, expires_at: DateTime<Utc>) -> Uuid;

    /// Live record for `session_id`. An expired record is dropped and reported absent.
    async fn get(&self, session_id: Uuid) -> Option<SessionRecord>;

    /// Returns whether a record was removed. Destroying twice is fine.
    async fn destroy(&self, session_id: Uuid) -> bool;

    /// Drops every session belonging to `user_id`.
    async fn revoke_user(&self, user_id: i64) -> usize;

    async fn purge_expired(&self) -> usize;
}

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, SessionRecord>>,
}

impl InMemorySessionStore {
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, user_id: i64, expires_at: DateTime<Utc>) -> Uuid {
        let session_id = Uuid::new_v4();
        let record = SessionRecord {
            user_id,
            created_at: Utc::now(),
            expires_at,
        };
        self.sessions.write().await.insert(session_id, record);
        session_id
    }

    async fn get(&self, session_id: Uuid) -> Option<SessionRecord> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&session_id) {
                Some(record) if !record.is_expired_at(now) => return Some(record.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        let mut sessions = self.sessions.write().await;
        if sessions
            .get(&session_id)
            .is_some_and(|record| record.is_expired_at(now))
        {
            sessions.remove(&session_id);
        }
        None
    }

    async fn destroy(&self, session_id: Uuid) -> bool {
        self.sessions.write().await.remove(&session_id).is_some()
    }

    async fn revoke_user(&self, user_id: i64) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| record.user_id != user_id);
        before - sessions.len()
    }

    async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| !record.is_expired_at(now));
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{InMemorySessionStore, SessionStore};

    #[tokio::test]
    async fn expired_sessions_vanish_on_lookup() {
        let store = InMemorySessionStore::default();
        let live = store.create(1, Utc::now() + Duration::minutes(5)).await;
        let stale = store.create(1, Utc::now() - Duration::seconds(1)).await;

        assert_eq!(store.get(live).await.map(|record| record.user_id), Some(1));
        assert!(store.get(stale).await.is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn destroy_is_idempotent() {
        let store = InMemorySessionStore::default();
        let session = store.create(3, Utc::now() + Duration::minutes(5)).await;

        assert!(store.destroy(session).await);
        assert!(!store.destroy(session).await);
        assert!(store.get(session).await.is_none());
    }

    #[tokio::test]
    async fn revoke_user_only_touches_that_user() {
        let store = InMemorySessionStore::default();
        let expires = Utc::now() + Duration::minutes(5);
        let a1 = store.create(1, expires).await;
        let a2 = store.create(1, expires).await;
        let b = store.create(2, expires).await;

        assert_eq!(store.revoke_user(1).await, 2);
        assert!(store.get(a1).await.is_none());
        assert!(store.get(a2).await.is_none());
        assert!(store.get(b).await.is_some());
    }

    #[tokio::test]
    async fn purge_expired_keeps_live_sessions() {
        let store = InMemorySessionStore::default();
        store.create(1, Utc::now() - Duration::seconds(5)).await;
        store.create(2, Utc::now() - Duration::seconds(5)).await;
        let live = store.create(3, Utc::now() + Duration::minutes(5)).await;

        assert_eq!(store.purge_expired().await, 2);
        assert!(store.get(live).await.is_some());
    }
}
