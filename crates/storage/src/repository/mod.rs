use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Result;
use crate::models::Championship;

pub mod memory;
pub mod postgres;
pub mod synced;

pub use memory::MemoryChampionshipStore;
pub use postgres::PgChampionshipStore;
pub use synced::{BackendState, BackendStatus, StatusReport, SyncedStore};

/// Capacity of the change broadcast channels
pub const CHANGE_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Upserted,
    Deleted,
}

/// Something happened to a championship record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChangeEvent {
    pub championship_id: Uuid,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn upserted(championship_id: Uuid) -> Self {
        Self {
            championship_id,
            kind: ChangeKind::Upserted,
        }
    }

    pub fn deleted(championship_id: Uuid) -> Self {
        Self {
            championship_id,
            kind: ChangeKind::Deleted,
        }
    }
}

/// Persistence for championships.
///
/// `publish` is the only way to set a championship's public flag and it clears
/// the flag everywhere else in the same step. `upsert` never touches the flag:
/// new records start unpublished, existing ones keep their publication state.
#[async_trait]
pub trait ChampionshipStore: Send + Sync {
    /// All championships, newest first
    async fn list(&self) -> Result<Vec<Championship>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Championship>;

    async fn find_public(&self) -> Result<Option<Championship>>;

    async fn upsert(&self, championship: &Championship) -> Result<Championship>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    async fn publish(&self, id: Uuid) -> Result<Championship>;

    async fn unpublish(&self, id: Uuid) -> Result<Championship>;

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedItem {
    Change(ChangeEvent),
    /// Events were dropped; reload whatever is being watched
    Resync,
}

/// Change notifications, optionally narrowed to a single championship
pub struct ChangeFeed {
    receiver: broadcast::Receiver<ChangeEvent>,
    championship_id: Option<Uuid>,
}

impl ChangeFeed {
    pub fn new(receiver: broadcast::Receiver<ChangeEvent>, championship_id: Option<Uuid>) -> Self {
        Self {
            receiver,
            championship_id,
        }
    }

    /// Next matching item, or `None` once the store is gone
    pub async fn next(&mut self) -> Option<FeedItem> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.matches(&event) => return Some(FeedItem::Change(event)),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Change feed lagged, {} events skipped", skipped);
                    return Some(FeedItem::Resync);
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    fn matches(&self, event: &ChangeEvent) -> bool {
        self.championship_id
            .is_none_or(|id| id == event.championship_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_feed_filters_by_id() {
        let (sender, receiver) = broadcast::channel(8);
        let watched = Uuid::new_v4();
        let mut feed = ChangeFeed::new(receiver, Some(watched));

        sender.send(ChangeEvent::upserted(Uuid::new_v4())).unwrap();
        sender.send(ChangeEvent::deleted(watched)).unwrap();

        assert_eq!(
            feed.next().await,
            Some(FeedItem::Change(ChangeEvent::deleted(watched)))
        );
    }

    #[tokio::test]
    async fn test_feed_reports_lag_as_resync() {
        let (sender, receiver) = broadcast::channel(2);
        let mut feed = ChangeFeed::new(receiver, None);

        for _ in 0..5 {
            sender.send(ChangeEvent::upserted(Uuid::new_v4())).unwrap();
        }

        assert_eq!(feed.next().await, Some(FeedItem::Resync));
    }

    #[tokio::test]
    async fn test_feed_ends_when_sender_dropped() {
        let (sender, receiver) = broadcast::channel(2);
        let mut feed = ChangeFeed::new(receiver, None);
        drop(sender);

        assert_eq!(feed.next().await, None);
    }

    #[test]
    fn test_change_event_wire_format() {
        let id = Uuid::nil();
        let json = serde_json::to_value(ChangeEvent::deleted(id)).unwrap();
        assert_eq!(json["kind"], "deleted");
        assert_eq!(json["championship_id"], id.to_string());
    }
}
