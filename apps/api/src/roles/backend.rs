use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::roles::permissions::Role;
use crate::roles::RoleError;

/// Persists an explicit role change for a user.
#[async_trait]
pub trait RoleBackend: Send + Sync {
    async fn update_role(
        &self,
        user_id: Uuid,
        role: Role,
        preferences: Option<&Value>,
    ) -> Result<(), RoleError>;
}

/// Accepts every update without storing it. Used when `DATABASE_URL` is unset.
pub struct StubRoleBackend;

#[async_trait]
impl RoleBackend for StubRoleBackend {
    async fn update_role(
        &self,
        user_id: Uuid,
        role: Role,
        preferences: Option<&Value>,
    ) -> Result<(), RoleError> {
        info!(
            "Role update for {user_id} → {role} accepted by stub backend (preferences: {})",
            preferences.is_some()
        );
        Ok(())
    }
}

/// Upserts into `user_roles`. Preferences are only overwritten when supplied.
pub struct PgRoleBackend {
    pool: PgPool,
}

impl PgRoleBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleBackend for PgRoleBackend {
    async fn update_role(
        &self,
        user_id: Uuid,
        role: Role,
        preferences: Option<&Value>,
    ) -> Result<(), RoleError> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role, preferences, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (user_id) DO UPDATE
            SET role = EXCLUDED.role,
                preferences = COALESCE(EXCLUDED.preferences, user_roles.preferences),
                updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(role.as_str())
        .bind(preferences)
        .execute(&self.pool)
        .await?;

        info!("Persisted role {role} for user {user_id}");
        Ok(())
    }
}
