use std::sync::Arc;

use axum::response::sse::Event;
use storage::{
    dto::championship::{CreateChampionshipRequest, UpdateChampionshipRequest},
    error::{Result, StorageError},
    models::Championship,
    repository::{ChampionshipStore, ChangeFeed},
};
use uuid::Uuid;

/// List all championships, newest first
pub async fn list_championships(store: &dyn ChampionshipStore) -> Result<Vec<Championship>> {
    store.list().await
}

pub async fn get_championship(store: &dyn ChampionshipStore, id: Uuid) -> Result<Championship> {
    store.find_by_id(id).await
}

/// Create a new, unpublished championship
pub async fn create_championship(
    store: &dyn ChampionshipStore,
    request: CreateChampionshipRequest,
) -> Result<Championship> {
    let championship = request.into_championship();
    tracing::info!(
        "Creating championship '{}' ({})",
        championship.name,
        championship.championship_id
    );
    store.upsert(&championship).await
}

/// Edit a championship's header fields
pub async fn update_championship(
    store: &dyn ChampionshipStore,
    id: Uuid,
    request: &UpdateChampionshipRequest,
) -> Result<Championship> {
    let mut championship = store.find_by_id(id).await?;
    request.apply(&mut championship);
    store.upsert(&championship).await
}

pub async fn delete_championship(store: &dyn ChampionshipStore, id: Uuid) -> Result<()> {
    tracing::info!("Deleting championship {}", id);
    store.delete(id).await
}

/// Make a championship the public one, withdrawing any other
pub async fn publish_championship(store: &dyn ChampionshipStore, id: Uuid) -> Result<Championship> {
    store.publish(id).await
}

pub async fn unpublish_championship(
    store: &dyn ChampionshipStore,
    id: Uuid,
) -> Result<Championship> {
    let championship = store.unpublish(id).await?;
    tracing::info!("Championship '{}' withdrawn from public view", championship.name);
    Ok(championship)
}

/// Follows one championship and yields an SSE event per change.
///
/// The first event is the current state. The watch ends after the
/// championship is deleted or the store shuts down.
pub struct ChampionshipWatch {
    store: Arc<dyn ChampionshipStore>,
    feed: ChangeFeed,
    id: Uuid,
    started: bool,
    finished: bool,
}

impl ChampionshipWatch {
    pub fn new(store: Arc<dyn ChampionshipStore>, id: Uuid) -> Self {
        let feed = ChangeFeed::new(store.subscribe(), Some(id));
        Self {
            store,
            feed,
            id,
            started: false,
            finished: false,
        }
    }

    pub async fn next_event(&mut self) -> Option<Event> {
        if self.finished {
            return None;
        }
        if self.started {
            // Deletions are confirmed by the reload below
            self.feed.next().await?;
        }
        self.started = true;

        match self.store.find_by_id(self.id).await {
            Ok(championship) => Some(
                Event::default()
                    .event("championship")
                    .json_data(&championship)
                    .unwrap_or_else(|e| {
                        tracing::error!("Failed to encode championship event: {}", e);
                        Event::default().event("error").data("encoding failed")
                    }),
            ),
            Err(StorageError::NotFound) => {
                self.finished = true;
                Some(Event::default().event("deleted").data(self.id.to_string()))
            }
            Err(e) => {
                tracing::warn!("Failed to reload championship {}: {}", self.id, e);
                Some(Event::default().event("error").data("storage unavailable"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::MemoryChampionshipStore;

    fn request(name: &str) -> CreateChampionshipRequest {
        CreateChampionshipRequest {
            name: format!("  {}  ", name),
            event_date: None,
            location: None,
        }
    }

    #[tokio::test]
    async fn test_create_trims_and_starts_private() {
        let store = MemoryChampionshipStore::new();
        let championship = create_championship(&store, request("Spring Cup")).await.unwrap();
        assert_eq!(championship.name, "Spring Cup");
        assert!(!championship.is_public);
        assert_eq!(list_championships(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_keeps_publication() {
        let store = MemoryChampionshipStore::new();
        let championship = create_championship(&store, request("Spring Cup")).await.unwrap();
        publish_championship(&store, championship.championship_id).await.unwrap();

        let updated = update_championship(
            &store,
            championship.championship_id,
            &UpdateChampionshipRequest {
                location: Some("Toledo".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(updated.is_public);
        assert_eq!(updated.location.as_deref(), Some("Toledo"));
    }

    #[tokio::test]
    async fn test_watch_reports_changes_then_deletion() {
        let store: Arc<dyn ChampionshipStore> = Arc::new(MemoryChampionshipStore::new());
        let championship = create_championship(store.as_ref(), request("Cup")).await.unwrap();
        let id = championship.championship_id;

        let mut watch = ChampionshipWatch::new(Arc::clone(&store), id);
        assert!(watch.next_event().await.is_some());

        publish_championship(store.as_ref(), id).await.unwrap();
        assert!(watch.next_event().await.is_some());

        delete_championship(store.as_ref(), id).await.unwrap();
        assert!(watch.next_event().await.is_some());
        assert!(watch.next_event().await.is_none());
    }
}
