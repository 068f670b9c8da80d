pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::handlers as features;
use crate::navigation::handlers as navigation;
use crate::roles::handlers as roles;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Role & permissions
        .route(
            "/api/v1/role",
            get(roles::handle_get_role).put(roles::handle_update_role),
        )
        .route("/api/v1/permissions", get(roles::handle_get_permissions))
        .route(
            "/api/v1/permissions/:capability",
            get(roles::handle_check_capability),
        )
        .route("/api/v1/session/logout", post(roles::handle_logout))
        // Feature flags
        .route("/api/v1/features", get(features::handle_list_features))
        .route("/api/v1/features/:name", get(features::handle_get_feature))
        // View composition
        .route("/api/v1/navigation", get(navigation::handle_get_navigation))
        .with_state(state)
}
