use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use chrono::Utc;
use export::{render_printable, suggested_filename};
use futures::stream::{self, Stream};
use storage::{
    dto::championship::{CreateChampionshipRequest, UpdateChampionshipRequest},
    models::Championship,
};
use uuid::Uuid;
use validator::Validate;

use crate::AppState;
use crate::error::WebError;

use super::services::{self, ChampionshipWatch};

#[utoipa::path(
    get,
    path = "/api/championships",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "All championships, newest first", body = Vec<Championship>),
        (status = 401, description = "Unauthorized")
    ),
    tag = "championships"
)]
pub async fn list_championships(
    State(state): State<AppState>,
) -> Result<Json<Vec<Championship>>, WebError> {
    let championships = services::list_championships(state.store.as_ref()).await?;

    Ok(Json(championships))
}

#[utoipa::path(
    post,
    path = "/api/championships",
    request_body = CreateChampionshipRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Championship created", body = Championship),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Saved locally, database write failed")
    ),
    tag = "championships"
)]
pub async fn create_championship(
    State(state): State<AppState>,
    Json(req): Json<CreateChampionshipRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let championship = services::create_championship(state.store.as_ref(), req).await?;

    Ok((StatusCode::CREATED, Json(championship)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/championships/{id}",
    params(
        ("id" = Uuid, Path, description = "Championship id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Championship found", body = Championship),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Championship not found")
    ),
    tag = "championships"
)]
pub async fn get_championship(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Championship>, WebError> {
    let championship = services::get_championship(state.store.as_ref(), id).await?;

    Ok(Json(championship))
}

#[utoipa::path(
    put,
    path = "/api/championships/{id}",
    params(
        ("id" = Uuid, Path, description = "Championship id")
    ),
    request_body = UpdateChampionshipRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Championship updated", body = Championship),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Championship not found"),
        (status = 502, description = "Saved locally, database write failed")
    ),
    tag = "championships"
)]
pub async fn update_championship(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateChampionshipRequest>,
) -> Result<Json<Championship>, WebError> {
    req.validate()?;

    let championship = services::update_championship(state.store.as_ref(), id, &req).await?;

    Ok(Json(championship))
}

#[utoipa::path(
    delete,
    path = "/api/championships/{id}",
    params(
        ("id" = Uuid, Path, description = "Championship id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 204, description = "Championship deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Championship not found"),
        (status = 502, description = "Deleted locally, database write failed")
    ),
    tag = "championships"
)]
pub async fn delete_championship(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, WebError> {
    services::delete_championship(state.store.as_ref(), id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/championships/{id}/publish",
    params(
        ("id" = Uuid, Path, description = "Championship id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Championship is now the only public one", body = Championship),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Championship not found"),
        (status = 502, description = "Published locally, database write failed")
    ),
    tag = "championships"
)]
pub async fn publish_championship(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Championship>, WebError> {
    let championship = services::publish_championship(state.store.as_ref(), id).await?;

    Ok(Json(championship))
}

#[utoipa::path(
    post,
    path = "/api/championships/{id}/unpublish",
    params(
        ("id" = Uuid, Path, description = "Championship id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Championship withdrawn from public view", body = Championship),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Championship not found"),
        (status = 502, description = "Unpublished locally, database write failed")
    ),
    tag = "championships"
)]
pub async fn unpublish_championship(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Championship>, WebError> {
    let championship = services::unpublish_championship(state.store.as_ref(), id).await?;

    Ok(Json(championship))
}

#[utoipa::path(
    get,
    path = "/api/championships/{id}/events",
    params(
        ("id" = Uuid, Path, description = "Championship id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Server-sent events: `championship` with the full record after each change, `deleted` when it is removed", body = String, content_type = "text/event-stream"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Championship not found")
    ),
    tag = "championships"
)]
pub async fn championship_events(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, WebError> {
    services::get_championship(state.store.as_ref(), id).await?;

    let watch = ChampionshipWatch::new(state.store, id);
    let stream = stream::unfold(watch, |mut watch| async move {
        let event = watch.next_event().await?;
        Some((Ok(event), watch))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

#[utoipa::path(
    get,
    path = "/api/championships/{id}/export",
    params(
        ("id" = Uuid, Path, description = "Championship id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Printable standings sheet", body = String, content_type = "text/html"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Championship not found"),
        (status = 500, description = "The sheet could not be rendered")
    ),
    tag = "championships"
)]
pub async fn export_championship(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Response, WebError> {
    let championship = services::get_championship(state.store.as_ref(), id).await?;
    let html = render_printable(&championship, Utc::now())?;

    let headers = [
        (header::CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", suggested_filename(&championship)),
        ),
    ];

    Ok((headers, html).into_response())
}
