use axum::{extract::State, Json};
use serde::Serialize;

use crate::models::session::Session;
use crate::navigation::{compose_navigation, NavItem};
use crate::roles::permissions::Role;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NavigationResponse {
    pub role: Role,
    pub items: Vec<NavItem>,
}

/// GET /api/v1/navigation
///
/// Uses whatever role the store currently holds; a cached role is good enough
/// for rendering and is corrected on the next request once detection lands.
pub async fn handle_get_navigation(
    State(state): State<AppState>,
    session: Session,
) -> Json<NavigationResponse> {
    let store = state.roles.store_for(&session).await;
    let current = store.snapshot();
    Json(NavigationResponse {
        role: current.role,
        items: compose_navigation(&current.permissions, &state.feature_flags),
    })
}
