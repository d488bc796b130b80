use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use uuid::Uuid;

use super::{CHANGE_CHANNEL_CAPACITY, ChampionshipStore, ChangeEvent};
use crate::error::{Result, StorageError};
use crate::models::Championship;
use crate::models::championship::now;

/// Championships held in process memory.
///
/// Every write takes the single write lock, so a publish and the clearing of
/// every other public flag are one step for all readers.
pub struct MemoryChampionshipStore {
    championships: RwLock<HashMap<Uuid, Championship>>,
    events: broadcast::Sender<ChangeEvent>,
}

impl Default for MemoryChampionshipStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChampionshipStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            championships: RwLock::new(HashMap::new()),
            events,
        }
    }

    fn notify(&self, events: impl IntoIterator<Item = ChangeEvent>) {
        for event in events {
            // No subscribers is fine
            let _ = self.events.send(event);
        }
    }

    /// Store a record exactly as another store holds it, public flag included.
    /// Returns whether anything changed.
    pub async fn mirror(&self, championship: Championship) -> bool {
        let mut changed = Vec::new();
        {
            let mut championships = self.championships.write().await;
            if championships.get(&championship.championship_id) == Some(&championship) {
                return false;
            }

            if championship.is_public {
                changed.extend(clear_public_except(
                    &mut championships,
                    championship.championship_id,
                ));
            }
            changed.push(ChangeEvent::upserted(championship.championship_id));
            championships.insert(championship.championship_id, championship);
        }
        self.notify(changed);
        true
    }

    /// Drop a record without complaining if it is absent
    pub async fn forget(&self, id: Uuid) -> bool {
        let removed = self.championships.write().await.remove(&id).is_some();
        if removed {
            self.notify([ChangeEvent::deleted(id)]);
        }
        removed
    }
}

fn clear_public_except(
    championships: &mut HashMap<Uuid, Championship>,
    id: Uuid,
) -> Vec<ChangeEvent> {
    championships
        .values_mut()
        .filter(|c| c.is_public && c.championship_id != id)
        .map(|c| {
            c.is_public = false;
            ChangeEvent::upserted(c.championship_id)
        })
        .collect()
}

#[async_trait]
impl ChampionshipStore for MemoryChampionshipStore {
    async fn list(&self) -> Result<Vec<Championship>> {
        let mut championships: Vec<Championship> =
            self.championships.read().await.values().cloned().collect();
        championships.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(championships)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Championship> {
        self.championships
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn find_public(&self) -> Result<Option<Championship>> {
        Ok(self
            .championships
            .read()
            .await
            .values()
            .find(|c| c.is_public)
            .cloned())
    }

    async fn upsert(&self, championship: &Championship) -> Result<Championship> {
        let mut stored = championship.clone();
        {
            let mut championships = self.championships.write().await;
            match championships.get(&stored.championship_id) {
                Some(existing) => {
                    stored.is_public = existing.is_public;
                    stored.published_at = existing.published_at;
                }
                None => {
                    stored.is_public = false;
                    stored.published_at = None;
                }
            }
            championships.insert(stored.championship_id, stored.clone());
        }
        self.notify([ChangeEvent::upserted(stored.championship_id)]);
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        if self.forget(id).await {
            Ok(())
        } else {
            Err(StorageError::NotFound)
        }
    }

    async fn publish(&self, id: Uuid) -> Result<Championship> {
        let (published, mut changed) = {
            let mut championships = self.championships.write().await;
            if !championships.contains_key(&id) {
                return Err(StorageError::NotFound);
            }

            let changed = clear_public_except(&mut championships, id);
            let target = championships.get_mut(&id).ok_or(StorageError::NotFound)?;
            target.is_public = true;
            target.published_at = Some(now());
            (target.clone(), changed)
        };

        tracing::info!("Championship {} published", id);
        changed.push(ChangeEvent::upserted(id));
        self.notify(changed);
        Ok(published)
    }

    async fn unpublish(&self, id: Uuid) -> Result<Championship> {
        let unpublished = {
            let mut championships = self.championships.write().await;
            let target = championships.get_mut(&id).ok_or(StorageError::NotFound)?;
            target.is_public = false;
            target.clone()
        };

        self.notify([ChangeEvent::upserted(id)]);
        Ok(unpublished)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}
