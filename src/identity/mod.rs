//! Collaborators the command processor depends on
//!
//! Authentication, user lookup and heartbeat persistence sit behind these
//! traits; the in-memory implementations back the standalone binary and
//! the tests.

pub mod memory;

use crate::error::Result;
use crate::types::{SessionToken, User, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::{InMemoryDirectory, InMemoryHeartbeatStore};

/// Resolves a client's auth token to an authenticated user and session
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, auth_token: &str) -> Result<Option<(User, SessionToken)>>;
}

/// Looks users up by their public username
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;
}

/// Records when each user was last seen
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HeartbeatStore: Send + Sync {
    async fn upsert(&self, user_id: UserId, seen_at: DateTime<Utc>) -> Result<()>;

    async fn last_seen(&self, user_id: UserId) -> Result<Option<DateTime<Utc>>>;
}
