use std::{collections::HashMap, sync::Arc};

use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::users::repo_types::User;

#[derive(Debug, Clone)]
struct Binding {
    user: User,
    expires_at: OffsetDateTime,
}

/// Sessions keyed by id. A session is Authenticated while it has a binding
/// here and Anonymous otherwise.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, Binding>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `user` to `sid` until `expires_at`. Expired bindings are dropped
    /// on the way.
    pub async fn bind(&self, sid: Uuid, user: User, expires_at: OffsetDateTime) {
        let now = OffsetDateTime::now_utc();
        let mut sessions = self.inner.write().await;
        sessions.retain(|_, b| b.expires_at > now);
        debug!(%sid, user_id = user.id, "session bound");
        sessions.insert(sid, Binding { user, expires_at });
    }

    pub async fn current(&self, sid: Uuid) -> Option<User> {
        let sessions = self.inner.read().await;
        sessions
            .get(&sid)
            .filter(|b| b.expires_at > OffsetDateTime::now_utc())
            .map(|b| b.user.clone())
    }

    /// Returns whether a binding was removed.
    pub async fn clear(&self, sid: Uuid) -> bool {
        let removed = self.inner.write().await.remove(&sid).is_some();
        if removed {
            debug!(%sid, "session cleared");
        }
        removed
    }

    /// Replaces the record held by every session of `user.id`.
    pub async fn refresh_user(&self, user: &User) -> usize {
        let mut sessions = self.inner.write().await;
        let mut n = 0;
        for binding in sessions.values_mut().filter(|b| b.user.id == user.id) {
            binding.user = user.clone();
            n += 1;
        }
        n
    }

    /// Drops every session of `user_id`.
    pub async fn revoke_user(&self, user_id: i64) -> usize {
        let mut sessions = self.inner.write().await;
        let before = sessions.len();
        sessions.retain(|_, b| b.user.id != user_id);
        before - sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Record;
    use crate::users::repo_types::NewUser;
    use time::Duration;

    fn user(id: i64, username: &str) -> User {
        User::build(
            id,
            NewUser {
                username: username.into(),
                email: format!("{username}@example.com"),
                password: "secret1".into(),
            },
            OffsetDateTime::now_utc(),
        )
    }

    fn in_an_hour() -> OffsetDateTime {
        OffsetDateTime::now_utc() + Duration::hours(1)
    }

    #[tokio::test]
    async fn anonymous_until_bound_and_after_clear() {
        let sessions = SessionStore::new();
        let sid = Uuid::new_v4();
        assert!(sessions.current(sid).await.is_none());

        sessions.bind(sid, user(1, "ada"), in_an_hour()).await;
        let bound = sessions.current(sid).await.expect("bound");
        assert_eq!(bound.id, 1);
        assert_eq!(bound.password, "secret1");

        assert!(sessions.clear(sid).await);
        assert!(sessions.current(sid).await.is_none());
        assert!(!sessions.clear(sid).await);
    }

    #[tokio::test]
    async fn sessions_are_independent() {
        let sessions = SessionStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        sessions.bind(a, user(1, "ada"), in_an_hour()).await;
        sessions.bind(b, user(2, "bob"), in_an_hour()).await;

        sessions.clear(a).await;
        assert!(sessions.current(a).await.is_none());
        assert_eq!(sessions.current(b).await.unwrap().id, 2);
    }

    #[tokio::test]
    async fn expired_bindings_are_ignored_and_pruned() {
        let sessions = SessionStore::new();
        let stale = Uuid::new_v4();
        sessions
            .bind(stale, user(1, "ada"), OffsetDateTime::now_utc() - Duration::seconds(1))
            .await;
        assert!(sessions.current(stale).await.is_none());

        sessions.bind(Uuid::new_v4(), user(2, "bob"), in_an_hour()).await;
        assert!(!sessions.clear(stale).await);
    }

    #[tokio::test]
    async fn refresh_and_revoke_by_user() {
        let sessions = SessionStore::new();
        let (a1, a2, b) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        sessions.bind(a1, user(1, "ada"), in_an_hour()).await;
        sessions.bind(a2, user(1, "ada"), in_an_hour()).await;
        sessions.bind(b, user(2, "bob"), in_an_hour()).await;

        assert_eq!(sessions.refresh_user(&user(1, "ada2")).await, 2);
        assert_eq!(sessions.current(a2).await.unwrap().username, "ada2");

        assert_eq!(sessions.revoke_user(1).await, 2);
        assert!(sessions.current(a1).await.is_none());
        assert!(sessions.current(b).await.is_some());
    }
}
