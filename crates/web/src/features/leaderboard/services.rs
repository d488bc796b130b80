use std::sync::Arc;

use axum::response::sse::Event;
use storage::{
    dto::leaderboard::LeaderboardResponse,
    error::Result,
    repository::{ChampionshipStore, ChangeFeed},
    services::leaderboard::build_leaderboard,
};

/// Standings of the public championship, if there is one
pub async fn public_leaderboard(
    store: &dyn ChampionshipStore,
) -> Result<Option<LeaderboardResponse>> {
    Ok(store.find_public().await?.as_ref().map(build_leaderboard))
}

/// Pushes a fresh leaderboard snapshot after any championship changes.
///
/// Publishing moves the leaderboard to another championship, so every change
/// is relevant. A `null` snapshot means nothing is public.
pub struct LeaderboardWatch {
    store: Arc<dyn ChampionshipStore>,
    feed: ChangeFeed,
    started: bool,
}

impl LeaderboardWatch {
    pub fn new(store: Arc<dyn ChampionshipStore>) -> Self {
        let feed = ChangeFeed::new(store.subscribe(), None);
        Self {
            store,
            feed,
            started: false,
        }
    }

    pub async fn next_event(&mut self) -> Option<Event> {
        if self.started {
            self.feed.next().await?;
        }
        self.started = true;

        match public_leaderboard(self.store.as_ref()).await {
            Ok(snapshot) => Some(
                Event::default()
                    .event("leaderboard")
                    .json_data(&snapshot)
                    .unwrap_or_else(|e| {
                        tracing::error!("Failed to encode leaderboard event: {}", e);
                        Event::default().event("error").data("encoding failed")
                    }),
            ),
            Err(e) => {
                tracing::warn!("Failed to reload leaderboard: {}", e);
                Some(Event::default().event("error").data("storage unavailable"))
            }
        }
    }
}
