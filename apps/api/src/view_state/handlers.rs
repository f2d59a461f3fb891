use axum::{
    extract::{Path, State},
    Json,
};

use crate::errors::AppError;
use crate::state::AppState;
use crate::view_state::{ArtifactViewState, ToggleRequest, MAX_INDEX};

/// GET /api/v1/artifacts/:id/state
pub async fn handle_get_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArtifactViewState>, AppError> {
    state
        .view_state
        .get(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("no view state for artifact {id}")))
}

/// PATCH /api/v1/artifacts/:id/state
pub async fn handle_toggle_state(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<ToggleRequest>,
) -> Result<Json<ArtifactViewState>, AppError> {
    if id.trim().is_empty() {
        return Err(AppError::Validation("artifact id must not be empty".to_string()));
    }
    if req.index > MAX_INDEX {
        return Err(AppError::Validation(format!(
            "index {} is out of range (max {MAX_INDEX})",
            req.index
        )));
    }
    Ok(Json(state.view_state.apply(&id, &req).await))
}
