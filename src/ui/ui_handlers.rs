use axum::{extract::State, http::StatusCode, Json};
use validator::Validate;

use crate::{error::Result, state::AppState};

use super::ui_models::UpdateViewRequest;

/// Report which page the viewer is on; refreshes only fire on matching views
#[utoipa::path(
    put,
    path = "/api/view",
    request_body = UpdateViewRequest,
    responses(
        (status = 204, description = "Current view updated"),
        (status = 400, description = "Invalid view path")
    ),
    tag = "view"
)]
pub async fn update_view(
    State(state): State<AppState>,
    Json(payload): Json<UpdateViewRequest>,
) -> Result<StatusCode> {
    payload.validate()?;

    tracing::debug!("Viewer moved to {}", payload.path);
    state.view_tx.send_replace(payload.path);

    Ok(StatusCode::NO_CONTENT)
}
