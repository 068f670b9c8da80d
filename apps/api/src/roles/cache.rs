//! Role cache — one string entry per user holding a role literal.
//!
//! Read optimistically when a store mounts, written after every successful
//! detection or explicit update, removed on logout.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::roles::permissions::Role;
use crate::roles::RoleError;

pub const DEFAULT_KEY_PREFIX: &str = "user_role";

/// Key-value store for cached roles. Values are returned raw; callers decide
/// whether the literal is a valid role.
#[async_trait]
pub trait RoleCache: Send + Sync {
    async fn load(&self, user_id: Uuid) -> Result<Option<String>, RoleError>;
    async fn store(&self, user_id: Uuid, role: Role) -> Result<(), RoleError>;
    async fn remove(&self, user_id: Uuid) -> Result<(), RoleError>;
}

// ────────────────────────────────────────────────────────────────────────────
// In-process cache
// ────────────────────────────────────────────────────────────────────────────

/// Not durable, not shared between instances. Used when `REDIS_URL` is unset
/// and in tests.
#[derive(Default)]
pub struct InMemoryRoleCache {
    entries: RwLock<HashMap<Uuid, String>>,
}

impl InMemoryRoleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes an arbitrary value, valid role literal or not.
    #[cfg(test)]
    pub async fn insert_raw(&self, user_id: Uuid, value: impl Into<String>) {
        self.entries.write().await.insert(user_id, value.into());
    }
}

#[async_trait]
impl RoleCache for InMemoryRoleCache {
    async fn load(&self, user_id: Uuid) -> Result<Option<String>, RoleError> {
        Ok(self.entries.read().await.get(&user_id).cloned())
    }

    async fn store(&self, user_id: Uuid, role: Role) -> Result<(), RoleError> {
        self.entries
            .write()
            .await
            .insert(user_id, role.as_str().to_string());
        Ok(())
    }

    async fn remove(&self, user_id: Uuid) -> Result<(), RoleError> {
        self.entries.write().await.remove(&user_id);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Redis cache
// ────────────────────────────────────────────────────────────────────────────

pub struct RedisRoleCache {
    client: redis::Client,
    prefix: String,
}

impl RedisRoleCache {
    pub fn new(client: redis::Client, prefix: impl Into<String>) -> Self {
        Self {
            client,
            prefix: prefix.into(),
        }
    }

    fn key(&self, user_id: Uuid) -> String {
        cache_key(&self.prefix, user_id)
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection, RoleError> {
        Ok(self.client.get_multiplexed_async_connection().await?)
    }
}

#[async_trait]
impl RoleCache for RedisRoleCache {
    async fn load(&self, user_id: Uuid) -> Result<Option<String>, RoleError> {
        let mut conn = self.connection().await?;
        let value: Option<String> = conn.get(self.key(user_id)).await?;
        Ok(value)
    }

    async fn store(&self, user_id: Uuid, role: Role) -> Result<(), RoleError> {
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(self.key(user_id), role.as_str()).await?;
        Ok(())
    }

    async fn remove(&self, user_id: Uuid) -> Result<(), RoleError> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(self.key(user_id)).await?;
        Ok(())
    }
}

fn cache_key(prefix: &str, user_id: Uuid) -> String {
    format!("{prefix}:{user_id}")
}
