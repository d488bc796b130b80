use std::convert::Infallible;

use axum::{
    Json,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{self, Stream};
use storage::dto::leaderboard::LeaderboardResponse;

use crate::AppState;
use crate::error::WebError;

use super::services::{self, LeaderboardWatch};

#[utoipa::path(
    get,
    path = "/api/leaderboard",
    responses(
        (status = 200, description = "Ranked flights of the public championship", body = LeaderboardResponse),
        (status = 404, description = "No championship is public")
    ),
    tag = "leaderboard"
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<LeaderboardResponse>, WebError> {
    services::public_leaderboard(state.store.as_ref())
        .await?
        .map(Json)
        .ok_or(WebError::NotFound("No championship is public"))
}

#[utoipa::path(
    get,
    path = "/api/leaderboard/events",
    responses(
        (status = 200, description = "Server-sent `leaderboard` events carrying the current standings, or null when nothing is public", body = String, content_type = "text/event-stream")
    ),
    tag = "leaderboard"
)]
pub async fn leaderboard_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let watch = LeaderboardWatch::new(state.store);
    let stream = stream::unfold(watch, |mut watch| async move {
        let event = watch.next_event().await?;
        Some((Ok(event), watch))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
