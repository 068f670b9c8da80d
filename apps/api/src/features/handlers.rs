use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct FeatureStatus {
    pub name: String,
    pub enabled: bool,
}

/// GET /api/v1/features
pub async fn handle_list_features(State(state): State<AppState>) -> Json<Vec<FeatureStatus>> {
    Json(
        state
            .feature_flags
            .entries()
            .into_iter()
            .map(|(feature, enabled)| FeatureStatus {
                name: feature.as_str().to_string(),
                enabled,
            })
            .collect(),
    )
}

/// GET /api/v1/features/:name
///
/// Unknown names report `enabled: false` rather than 404.
pub async fn handle_get_feature(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<FeatureStatus> {
    let enabled = state.feature_flags.is_feature_enabled(&name);
    Json(FeatureStatus { name, enabled })
}
