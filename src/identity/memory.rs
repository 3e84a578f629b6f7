//! In-memory collaborator implementations

use crate::config::SeedUser;
use crate::error::{MatchmakingError, Result};
use crate::identity::{HeartbeatStore, IdentityResolver, UserDirectory};
use crate::types::{SessionToken, User, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, warn};

#[derive(Debug, Default)]
struct DirectoryInner {
    users: HashMap<UserId, User>,
    by_username: HashMap<String, UserId>,
    sessions: HashMap<String, (UserId, SessionToken)>,
    next_id: UserId,
}

/// User accounts and session tokens held in memory
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    inner: RwLock<DirectoryInner>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a directory pre-populated from configuration
    pub fn with_seed_users(seed: &[SeedUser]) -> Result<Self> {
        let directory = Self::new();
        for entry in seed {
            let user = directory.register_user(&entry.username)?;
            directory.issue_token(&user, &entry.auth_token, &entry.location)?;
        }
        Ok(directory)
    }

    /// Register a username, returning the existing account if already known
    pub fn register_user(&self, username: &str) -> Result<User> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("directory"))?;

        if let Some(id) = inner.by_username.get(username) {
            if let Some(user) = inner.users.get(id) {
                return Ok(user.clone());
            }
        }

        inner.next_id += 1;
        let user = User::new(inner.next_id, username);
        inner.by_username.insert(username.to_string(), user.user_id);
        inner.users.insert(user.user_id, user.clone());
        debug!("Registered user '{}' as {}", username, user.user_id);
        Ok(user)
    }

    /// Bind an auth token to a user together with the location it was issued from
    pub fn issue_token(&self, user: &User, auth_token: &str, location: &str) -> Result<()> {
        let mut inner = self
            .inner
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("directory"))?;

        let session = SessionToken {
            token: auth_token.to_string(),
            user_location: location.to_string(),
        };
        if inner
            .sessions
            .insert(auth_token.to_string(), (user.user_id, session))
            .is_some()
        {
            warn!("Auth token for '{}' replaced an existing session", user.username);
        }
        Ok(())
    }

    pub fn user_count(&self) -> Result<usize> {
        let inner = self
            .inner
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("directory"))?;
        Ok(inner.users.len())
    }
}

#[async_trait]
impl IdentityResolver for InMemoryDirectory {
    async fn resolve(&self, auth_token: &str) -> Result<Option<(User, SessionToken)>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("directory"))?;

        Ok(inner.sessions.get(auth_token).and_then(|(user_id, session)| {
            inner
                .users
                .get(user_id)
                .map(|user| (user.clone(), session.clone()))
        }))
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self
            .inner
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("directory"))?;

        Ok(inner
            .by_username
            .get(username)
            .and_then(|id| inner.users.get(id))
            .cloned())
    }
}

/// Last-seen timestamps held in memory
#[derive(Debug, Default)]
pub struct InMemoryHeartbeatStore {
    heartbeats: RwLock<HashMap<UserId, DateTime<Utc>>>,
}

impl InMemoryHeartbeatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HeartbeatStore for InMemoryHeartbeatStore {
    async fn upsert(&self, user_id: UserId, seen_at: DateTime<Utc>) -> Result<()> {
        let mut heartbeats = self
            .heartbeats
            .write()
            .map_err(|_| MatchmakingError::lock_poisoned("heartbeats"))?;
        heartbeats.insert(user_id, seen_at);
        Ok(())
    }

    async fn last_seen(&self, user_id: UserId) -> Result<Option<DateTime<Utc>>> {
        let heartbeats = self
            .heartbeats
            .read()
            .map_err(|_| MatchmakingError::lock_poisoned("heartbeats"))?;
        Ok(heartbeats.get(&user_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_resolve() {
        let directory = InMemoryDirectory::new();
        let alice = directory.register_user("Alice").unwrap();
        directory
            .issue_token(&alice, "alice-token", "10.0.0.1:3074")
            .unwrap();

        let (user, session) = directory.resolve("alice-token").await.unwrap().unwrap();
        assert_eq!(user, alice);
        assert_eq!(session.user_location, "10.0.0.1:3074");

        assert!(directory.resolve("bogus").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_register_is_idempotent_per_username() {
        let directory = InMemoryDirectory::new();
        let first = directory.register_user("Alice").unwrap();
        let second = directory.register_user("Alice").unwrap();
        assert_eq!(first, second);
        assert_eq!(directory.user_count().unwrap(), 1);

        let found = directory.find_by_username("Alice").await.unwrap();
        assert_eq!(found, Some(first));
        assert!(directory.find_by_username("Nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seed_users() {
        let seed = vec![SeedUser {
            username: "Bob".to_string(),
            auth_token: "bob-token".to_string(),
            location: "10.0.0.2:3074".to_string(),
        }];
        let directory = InMemoryDirectory::with_seed_users(&seed).unwrap();
        let (user, _) = directory.resolve("bob-token").await.unwrap().unwrap();
        assert_eq!(user.username, "Bob");
    }

    #[tokio::test]
    async fn test_heartbeat_upsert_overwrites() {
        let store = InMemoryHeartbeatStore::new();
        let earlier = Utc::now() - chrono::Duration::seconds(30);
        let later = Utc::now();

        store.upsert(1, earlier).await.unwrap();
        store.upsert(1, later).await.unwrap();

        assert_eq!(store.last_seen(1).await.unwrap(), Some(later));
        assert_eq!(store.last_seen(2).await.unwrap(), None);
    }
}
