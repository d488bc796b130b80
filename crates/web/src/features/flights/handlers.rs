use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use storage::dto::flight::{FlightRequest, FlightResponse};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::WebError;

use super::services;

#[utoipa::path(
    post,
    path = "/api/championships/{id}/flights",
    params(
        ("id" = Uuid, Path, description = "Championship id")
    ),
    request_body = FlightRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Flight recorded and scored", body = FlightResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Championship not found"),
        (status = 502, description = "Saved locally, database write failed")
    ),
    tag = "flights"
)]
pub async fn add_flight(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<FlightRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let flight = services::add_flight(state.store.as_ref(), id, req.into_flight_data()).await?;

    Ok((StatusCode::CREATED, Json(FlightResponse::from(flight))).into_response())
}

#[utoipa::path(
    put,
    path = "/api/championships/{id}/flights/{flight_id}",
    params(
        ("id" = Uuid, Path, description = "Championship id"),
        ("flight_id" = Uuid, Path, description = "Flight id")
    ),
    request_body = FlightRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Flight updated and rescored", body = FlightResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Championship or flight not found"),
        (status = 502, description = "Saved locally, database write failed")
    ),
    tag = "flights"
)]
pub async fn update_flight(
    State(state): State<AppState>,
    Path((id, flight_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<FlightRequest>,
) -> Result<Json<FlightResponse>, WebError> {
    req.validate()?;

    let flight =
        services::update_flight(state.store.as_ref(), id, flight_id, req.into_flight_data())
            .await?;

    Ok(Json(FlightResponse::from(flight)))
}

#[utoipa::path(
    delete,
    path = "/api/championships/{id}/flights/{flight_id}",
    params(
        ("id" = Uuid, Path, description = "Championship id"),
        ("flight_id" = Uuid, Path, description = "Flight id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Flight removed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Championship or flight not found"),
        (status = 502, description = "Removed locally, database write failed")
    ),
    tag = "flights"
)]
pub async fn delete_flight(
    State(state): State<AppState>,
    Path((id, flight_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, WebError> {
    services::delete_flight(state.store.as_ref(), id, flight_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
