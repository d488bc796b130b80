use axum::{Json, extract::State};
use storage::repository::StatusReport;

use crate::AppState;

#[utoipa::path(
    get,
    path = "/api/status",
    responses(
        (status = 200, description = "Storage backend state: online, degraded or local_only", body = StatusReport)
    ),
    tag = "status"
)]
pub async fn get_status(State(state): State<AppState>) -> Json<StatusReport> {
    Json(state.status.report())
}
