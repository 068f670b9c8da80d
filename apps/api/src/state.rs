use crate::config::Config;
use crate::features::FeatureFlags;
use crate::roles::registry::RoleRegistry;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Mounted role stores, one per signed-in user.
    pub roles: RoleRegistry,
    /// Fixed at startup; never mutated while serving.
    pub feature_flags: FeatureFlags,
}
