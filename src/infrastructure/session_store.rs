// Login sessions, keyed by the token stored in the browser cookie
use crate::domain::user::UserSession;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session";

struct Entry {
    user: UserSession,
    created: Instant,
}

/// Sessions expire `ttl` after login. Expired entries are evicted on the
/// next `create`, or when their token is looked up.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::default(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn expired(&self, entry: &Entry) -> bool {
        entry.created.elapsed() >= self.ttl
    }

    pub async fn create(&self, user: UserSession) -> Uuid {
        let token = Uuid::new_v4();
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| !self.expired(entry));
        if sessions.len() < before {
            tracing::debug!("Evicted {} expired sessions", before - sessions.len());
        }

        sessions.insert(
            token,
            Entry {
                user,
                created: Instant::now(),
            },
        );
        token
    }

    pub async fn get(&self, token: &str) -> Option<UserSession> {
        let token = Uuid::parse_str(token).ok()?;
        {
            let sessions = self.sessions.read().await;
            let entry = sessions.get(&token)?;
            if !self.expired(entry) {
                return Some(entry.user.clone());
            }
        }

        self.sessions.write().await.remove(&token);
        None
    }

    pub async fn remove(&self, token: &str) -> Option<UserSession> {
        let token = Uuid::parse_str(token).ok()?;
        self.sessions
            .write()
            .await
            .remove(&token)
            .map(|entry| entry.user)
    }
}

/// Extract the session token from a `Cookie` header value.
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::Role;

    fn user() -> UserSession {
        UserSession {
            id: "ADMIN01".to_string(),
            name: "Admin".to_string(),
            role: Role::Admin,
        }
    }

    const HOUR: Duration = Duration::from_secs(3600);

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = SessionStore::new(HOUR);
        let token = store.create(user()).await.to_string();

        assert_eq!(store.get(&token).await, Some(user()));
        assert_eq!(store.remove(&token).await, Some(user()));
        assert_eq!(store.get(&token).await, None);
    }

    #[tokio::test]
    async fn test_garbage_token() {
        let store = SessionStore::new(HOUR);
        assert_eq!(store.get("not-a-uuid").await, None);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_evicted() {
        let store = SessionStore::new(Duration::ZERO);
        let first = store.create(user()).await.to_string();
        assert_eq!(store.get(&first).await, None);
        assert!(store.sessions.read().await.is_empty());

        store.create(user()).await;
        store.create(user()).await;
        assert_eq!(store.sessions.read().await.len(), 1);
    }

    #[test]
    fn test_token_from_cookie_header() {
        assert_eq!(token_from_cookie_header("theme=dark; session=abc"), Some("abc"));
        assert_eq!(token_from_cookie_header("theme=dark"), None);
    }
}
