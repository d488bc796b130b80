use axum::Json;
use storage::{
    dto::flight::FlightRequest,
    services::scoring::{ScoreBreakdown, score_flight},
};
use validator::Validate;

use crate::error::WebError;

/// Score measurements without saving them, using the same sanitisation as a
/// recorded flight.
#[utoipa::path(
    post,
    path = "/api/scoring/preview",
    request_body = FlightRequest,
    responses(
        (status = 200, description = "Score breakdown", body = ScoreBreakdown),
        (status = 400, description = "Validation error")
    ),
    tag = "scoring"
)]
pub async fn preview_score(
    Json(req): Json<FlightRequest>,
) -> Result<Json<ScoreBreakdown>, WebError> {
    req.validate()?;

    Ok(Json(score_flight(&req.into_flight_data())))
}
