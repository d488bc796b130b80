use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    ChampionshipStore, ChangeEvent, ChangeFeed, ChangeKind, FeedItem, MemoryChampionshipStore,
};
use crate::error::{Result, StorageError};
use crate::models::Championship;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BackendState {
    /// Last backend call succeeded
    Online,
    /// Backend configured but the last call failed
    Degraded,
    /// No backend at all, everything stays in this process
    LocalOnly,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusReport {
    pub state: BackendState,
    pub last_error: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Shared, observable view of the storage backend health
#[derive(Clone)]
pub struct BackendStatus {
    sender: Arc<watch::Sender<StatusReport>>,
}

impl BackendStatus {
    fn new(state: BackendState, last_error: Option<String>) -> Self {
        let (sender, _) = watch::channel(StatusReport {
            state,
            last_error,
            changed_at: Utc::now(),
        });
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn report(&self) -> StatusReport {
        self.sender.borrow().clone()
    }

    fn mark_online(&self) {
        self.sender.send_if_modified(|report| {
            if report.state == BackendState::Online {
                return false;
            }
            tracing::info!("Storage backend back online");
            report.state = BackendState::Online;
            report.changed_at = Utc::now();
            true
        });
    }

    fn mark_degraded(&self, error: &StorageError) {
        tracing::warn!("Storage backend unavailable, keeping local state: {}", error);
        self.sender.send_replace(StatusReport {
            state: BackendState::Degraded,
            last_error: Some(error.to_string()),
            changed_at: Utc::now(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    /// Record contents, or its removal
    Content,
    /// Public flag
    Publication,
}

/// What the backend has not yet confirmed about one championship
#[derive(Debug, Default)]
struct LocalChanges {
    /// Bumped by every local write
    generation: u64,
    content: bool,
    publication: bool,
}

impl LocalChanges {
    fn flag(&mut self, change: Change) -> &mut bool {
        match change {
            Change::Content => &mut self.content,
            Change::Publication => &mut self.publication,
        }
    }

    fn is_pending(&self) -> bool {
        self.content || self.publication
    }
}

type Backlog = HashMap<Uuid, LocalChanges>;

/// A local write waiting for the backend's answer
#[derive(Debug, Clone, Copy)]
struct Ticket {
    id: Uuid,
    generation: u64,
    change: Change,
    was_pending: bool,
}

/// Whether a backend copy fetched after seeing `generation` may replace local state
fn is_quiet(backlog: &Backlog, id: Uuid, generation: u64) -> bool {
    backlog
        .get(&id)
        .is_none_or(|changes| changes.generation == generation && !changes.is_pending())
}

fn generation_of(backlog: &Backlog, id: Uuid) -> u64 {
    backlog.get(&id).map_or(0, |changes| changes.generation)
}

/// Local state first, backend second.
///
/// Reads are always served from the in-memory copy. Writes land in memory and
/// are then pushed to the backend; when the push fails the local change stays,
/// is remembered as unconfirmed and the caller gets
/// [`StorageError::SyncFailed`]. Unconfirmed changes are replayed after the
/// next successful backend call, and backend copies never overwrite them.
/// Without a backend the store runs purely in memory.
pub struct SyncedStore {
    local: MemoryChampionshipStore,
    remote: Option<Arc<dyn ChampionshipStore>>,
    status: BackendStatus,
    backlog: Mutex<Backlog>,
}

impl SyncedStore {
    pub fn with_remote(remote: Arc<dyn ChampionshipStore>) -> Self {
        Self {
            local: MemoryChampionshipStore::new(),
            remote: Some(remote),
            status: BackendStatus::new(BackendState::Online, None),
            backlog: Mutex::new(HashMap::new()),
        }
    }

    /// No backend, e.g. the database could not be reached at startup
    pub fn local_only(reason: Option<String>) -> Self {
        if let Some(ref reason) = reason {
            tracing::warn!("Running with local-only storage: {}", reason);
        }
        Self {
            local: MemoryChampionshipStore::new(),
            remote: None,
            status: BackendStatus::new(BackendState::LocalOnly, reason),
            backlog: Mutex::new(HashMap::new()),
        }
    }

    pub fn status(&self) -> BackendStatus {
        self.status.clone()
    }

    /// Replay unconfirmed changes, then load the backend's championships.
    /// Records with changes the backend has not confirmed keep their local copy.
    pub async fn hydrate(&self) -> Result<()> {
        let Some(remote) = &self.remote else {
            return Ok(());
        };

        if let Err(e) = self.flush(remote.as_ref()).await {
            self.status.mark_degraded(&e);
            return Err(e);
        }

        let seen: HashMap<Uuid, u64> = {
            let backlog = self.backlog.lock().await;
            backlog.iter().map(|(id, changes)| (*id, changes.generation)).collect()
        };

        let championships = match remote.list().await {
            Ok(championships) => championships,
            Err(e) => {
                self.status.mark_degraded(&e);
                return Err(e);
            }
        };
        tracing::info!("Loaded {} championships from backend", championships.len());

        let backlog = self.backlog.lock().await;
        let quiet = |id: Uuid| is_quiet(&backlog, id, seen.get(&id).copied().unwrap_or(0));

        let on_backend: HashSet<Uuid> = championships.iter().map(|c| c.championship_id).collect();
        for local in self.local.list().await? {
            let id = local.championship_id;
            if !on_backend.contains(&id) && quiet(id) {
                self.local.forget(id).await;
            }
        }
        for championship in championships {
            if quiet(championship.championship_id) {
                self.adopt(&backlog, championship).await;
            }
        }
        drop(backlog);

        self.status.mark_online();
        Ok(())
    }

    /// Keep local state in step with changes other sessions make to the backend
    pub fn spawn_follower(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let remote = self.remote.clone()?;
        let store = Arc::clone(self);
        let mut feed = ChangeFeed::new(remote.subscribe(), None);

        Some(tokio::spawn(async move {
            while let Some(item) = feed.next().await {
                match item {
                    FeedItem::Change(event) => store.follow(remote.as_ref(), event).await,
                    FeedItem::Resync => {
                        let _ = store.hydrate().await;
                    }
                }
            }
            tracing::debug!("Backend change feed closed");
        }))
    }

    async fn follow(&self, remote: &dyn ChampionshipStore, event: ChangeEvent) {
        let id = event.championship_id;
        let seen = generation_of(&*self.backlog.lock().await, id);

        let incoming = match event.kind {
            ChangeKind::Deleted => None,
            ChangeKind::Upserted => match remote.find_by_id(id).await {
                Ok(championship) => Some(championship),
                Err(StorageError::NotFound) => None,
                Err(e) => {
                    self.status.mark_degraded(&e);
                    return;
                }
            },
        };

        let backlog = self.backlog.lock().await;
        if !is_quiet(&backlog, id, seen) {
            tracing::debug!("Keeping unconfirmed local copy of championship {}", id);
            return;
        }
        match incoming {
            Some(championship) => self.adopt(&backlog, championship).await,
            None => {
                self.local.forget(id).await;
            }
        }
    }

    /// Mirror a backend copy. While a publication is still unconfirmed the
    /// local public flags win over the backend's.
    async fn adopt(&self, backlog: &Backlog, mut championship: Championship) {
        if backlog.values().any(|changes| changes.publication) {
            match self.local.find_by_id(championship.championship_id).await {
                Ok(local) => {
                    championship.is_public = local.is_public;
                    championship.published_at = local.published_at;
                }
                Err(_) => {
                    championship.is_public = false;
                    championship.published_at = None;
                }
            }
        }
        self.local.mirror(championship).await;
    }

    async fn begin(&self, id: Uuid, change: Change) -> Ticket {
        let mut backlog = self.backlog.lock().await;
        let changes = backlog.entry(id).or_default();
        changes.generation += 1;
        let was_pending = std::mem::replace(changes.flag(change), true);
        Ticket {
            id,
            generation: changes.generation,
            change,
            was_pending,
        }
    }

    /// The local write itself failed, nothing to confirm
    async fn rollback(&self, ticket: Ticket) {
        let mut backlog = self.backlog.lock().await;
        if let Some(changes) = backlog.get_mut(&ticket.id)
            && changes.generation == ticket.generation
        {
            *changes.flag(ticket.change) = ticket.was_pending;
        }
    }

    async fn complete(&self, ticket: Ticket, confirmed: bool) {
        let mut backlog = self.backlog.lock().await;
        let changes = backlog.entry(ticket.id).or_default();
        if !confirmed {
            *changes.flag(ticket.change) = true;
        } else if changes.generation == ticket.generation {
            *changes.flag(ticket.change) = false;
        }
    }

    async fn confirm(&self, id: Uuid, generation: u64, change: Change) {
        let mut backlog = self.backlog.lock().await;
        if let Some(changes) = backlog.get_mut(&id)
            && changes.generation == generation
        {
            *changes.flag(change) = false;
        }
    }

    /// Push the current local state of every unconfirmed record. Contents and
    /// removals go first, then unpublishes, then publishes, so the backend ends
    /// with the same single public championship as local state.
    async fn flush(&self, remote: &dyn ChampionshipStore) -> Result<()> {
        let pending: Vec<(Uuid, u64, bool, bool)> = {
            let backlog = self.backlog.lock().await;
            backlog
                .iter()
                .filter(|(_, changes)| changes.is_pending())
                .map(|(id, c)| (*id, c.generation, c.content, c.publication))
                .collect()
        };
        if pending.is_empty() {
            return Ok(());
        }
        tracing::info!("Replaying {} unconfirmed championships to backend", pending.len());

        let mut publications = Vec::new();
        for (id, generation, content, publication) in pending {
            let local = match self.local.find_by_id(id).await {
                Ok(championship) => Some(championship),
                Err(StorageError::NotFound) => None,
                Err(e) => return Err(e),
            };

            match local {
                None => {
                    match remote.delete(id).await {
                        Ok(()) | Err(StorageError::NotFound) => {}
                        Err(e) => return Err(e),
                    }
                    self.confirm(id, generation, Change::Content).await;
                    self.confirm(id, generation, Change::Publication).await;
                }
                Some(championship) => {
                    if content {
                        remote.upsert(&championship).await?;
                        self.confirm(id, generation, Change::Content).await;
                    }
                    if publication {
                        publications.push((id, generation, championship.is_public));
                    }
                }
            }
        }

        publications.sort_by_key(|(_, _, is_public)| *is_public);
        for (id, generation, is_public) in publications {
            if is_public {
                remote.publish(id).await?;
            } else {
                remote.unpublish(id).await?;
            }
            self.confirm(id, generation, Change::Publication).await;
        }
        Ok(())
    }

    /// Record the outcome of a backend write
    async fn settle(&self, remote: &dyn ChampionshipStore, outcome: Result<()>) -> Result<()> {
        match outcome {
            Ok(()) => {
                self.status.mark_online();
                if let Err(e) = self.flush(remote).await {
                    self.status.mark_degraded(&e);
                }
                Ok(())
            }
            Err(e) => {
                self.status.mark_degraded(&e);
                Err(StorageError::SyncFailed(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl ChampionshipStore for SyncedStore {
    async fn list(&self) -> Result<Vec<Championship>> {
        self.local.list().await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Championship> {
        self.local.find_by_id(id).await
    }

    async fn find_public(&self) -> Result<Option<Championship>> {
        self.local.find_public().await
    }

    async fn upsert(&self, championship: &Championship) -> Result<Championship> {
        let Some(remote) = &self.remote else {
            return self.local.upsert(championship).await;
        };

        let ticket = self.begin(championship.championship_id, Change::Content).await;
        let stored = match self.local.upsert(championship).await {
            Ok(stored) => stored,
            Err(e) => {
                self.rollback(ticket).await;
                return Err(e);
            }
        };

        let outcome = remote.upsert(&stored).await.map(|_| ());
        self.complete(ticket, outcome.is_ok()).await;
        self.settle(remote.as_ref(), outcome).await?;
        Ok(stored)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let Some(remote) = &self.remote else {
            return self.local.delete(id).await;
        };

        let ticket = self.begin(id, Change::Content).await;
        if let Err(e) = self.local.delete(id).await {
            self.rollback(ticket).await;
            return Err(e);
        }

        let outcome = match remote.delete(id).await {
            // Never reached the backend in the first place
            Err(StorageError::NotFound) => Ok(()),
            outcome => outcome,
        };
        self.complete(ticket, outcome.is_ok()).await;
        self.settle(remote.as_ref(), outcome).await
    }

    async fn publish(&self, id: Uuid) -> Result<Championship> {
        let Some(remote) = &self.remote else {
            return self.local.publish(id).await;
        };

        let ticket = self.begin(id, Change::Publication).await;
        let published = match self.local.publish(id).await {
            Ok(published) => published,
            Err(e) => {
                self.rollback(ticket).await;
                return Err(e);
            }
        };

        let outcome = remote.publish(id).await.map(|_| ());
        self.complete(ticket, outcome.is_ok()).await;
        self.settle(remote.as_ref(), outcome).await?;
        Ok(published)
    }

    async fn unpublish(&self, id: Uuid) -> Result<Championship> {
        let Some(remote) = &self.remote else {
            return self.local.unpublish(id).await;
        };

        let ticket = self.begin(id, Change::Publication).await;
        let unpublished = match self.local.unpublish(id).await {
            Ok(unpublished) => unpublished,
            Err(e) => {
                self.rollback(ticket).await;
                return Err(e);
            }
        };

        let outcome = remote.unpublish(id).await.map(|_| ());
        self.complete(ticket, outcome.is_ok()).await;
        self.settle(remote.as_ref(), outcome).await?;
        Ok(unpublished)
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.local.subscribe()
    }
}
