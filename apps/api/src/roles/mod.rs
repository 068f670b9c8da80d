// Role & permission resolution.
// Leaves first: permissions (pure table) → detector → store → registry.
// Handlers expose the store to the frontend; navigation consumes it for view composition.

pub mod backend;
pub mod cache;
pub mod detector;
pub mod handlers;
pub mod permissions;
pub mod registry;
pub mod store;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RoleError {
    #[error("Role cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Role backend error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("A signed-in user is required to change roles")]
    Unauthenticated,
}
