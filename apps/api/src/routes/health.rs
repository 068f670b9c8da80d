use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service version, which role backends are wired in and how many
/// per-user role stores are live.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let role_cache = if state.config.redis_url.is_some() {
        "redis"
    } else {
        "memory"
    };
    let role_backend = if state.config.database_url.is_some() {
        "postgres"
    } else {
        "stub"
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "hireboard-api",
        "role_cache": role_cache,
        "role_backend": role_backend,
        "role_stores": state.roles.mounted().await
    }))
}
