//! Axum route handlers for role, permission and session endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::models::session::Session;
use crate::roles::permissions::{Capability, Permissions, Role};
use crate::roles::store::RoleState;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct RoleQuery {
    /// Wait for the in-flight detection instead of returning the cached role.
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: Role,
    pub preferences: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct PermissionsResponse {
    pub role: Role,
    pub permissions: Permissions,
    pub granted: Vec<Capability>,
}

#[derive(Debug, Serialize)]
pub struct CapabilityResponse {
    pub capability: Capability,
    pub allowed: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/role
pub async fn handle_get_role(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<RoleQuery>,
) -> Json<RoleState> {
    let store = state.roles.store_for(&session).await;
    let current = if query.wait {
        store.settled().await
    } else {
        store.snapshot()
    };
    Json(current)
}

/// PUT /api/v1/role
///
/// A backend failure answers 502 and leaves the stored role as it was.
pub async fn handle_update_role(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<RoleState>, AppError> {
    if !session.is_authenticated() {
        return Err(AppError::Unauthorized);
    }

    let store = state.roles.store_for(&session).await;
    let updated = store
        .update_user_role(request.role, request.preferences)
        .await;

    if let Some(message) = &updated.error {
        return Err(AppError::RoleUpdate(message.clone()));
    }
    Ok(Json(updated))
}

/// GET /api/v1/permissions
pub async fn handle_get_permissions(
    State(state): State<AppState>,
    session: Session,
) -> Json<PermissionsResponse> {
    let store = state.roles.store_for(&session).await;
    let current = store.snapshot();
    Json(PermissionsResponse {
        role: current.role,
        permissions: current.permissions,
        granted: current.permissions.granted(),
    })
}

/// GET /api/v1/permissions/:capability
pub async fn handle_check_capability(
    State(state): State<AppState>,
    session: Session,
    Path(name): Path<String>,
) -> Result<Json<CapabilityResponse>, AppError> {
    let capability = name
        .parse::<Capability>()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let store = state.roles.store_for(&session).await;
    Ok(Json(CapabilityResponse {
        capability,
        allowed: store.can_access_feature(capability),
    }))
}

/// POST /api/v1/session/logout
pub async fn handle_logout(State(state): State<AppState>, session: Session) -> StatusCode {
    state.roles.logout(&session).await;
    StatusCode::NO_CONTENT
}
