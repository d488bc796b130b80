use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgListener;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::{CHANGE_CHANNEL_CAPACITY, ChampionshipStore, ChangeEvent};
use crate::error::{Result, StorageError};
use crate::models::championship::now;
use crate::models::{Championship, FlightRecord};

/// Postgres channel the `championships_notify` trigger writes to
pub const CHANGE_CHANNEL: &str = "championship_changes";

/// Advisory lock serialising publications
const PUBLISH_LOCK_KEY: i64 = 0x6661_6c63_6f6e;

#[derive(FromRow)]
struct ChampionshipRow {
    championship_id: Uuid,
    name: String,
    event_date: Option<NaiveDate>,
    location: Option<String>,
    flights: Json<Vec<FlightRecord>>,
    is_public: bool,
    created_at: DateTime<Utc>,
    published_at: Option<DateTime<Utc>>,
}

impl From<ChampionshipRow> for Championship {
    fn from(row: ChampionshipRow) -> Self {
        Self {
            championship_id: row.championship_id,
            name: row.name,
            event_date: row.event_date,
            location: row.location,
            flights: row.flights.0,
            is_public: row.is_public,
            created_at: row.created_at,
            published_at: row.published_at,
        }
    }
}

/// Championships persisted in Postgres, one row each, flights as JSONB
#[derive(Clone)]
pub struct PgChampionshipStore {
    pool: PgPool,
    events: broadcast::Sender<ChangeEvent>,
}

impl PgChampionshipStore {
    pub fn new(pool: PgPool) -> Self {
        let (events, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self { pool, events }
    }

    /// Forward database notifications to subscribers until the listener fails
    pub async fn spawn_listener(&self) -> Result<JoinHandle<()>> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        tracing::info!("Listening for championship changes on '{}'", CHANGE_CHANNEL);

        let events = self.events.clone();
        Ok(tokio::spawn(async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        match serde_json::from_str::<ChangeEvent>(notification.payload()) {
                            Ok(event) => {
                                tracing::debug!("Championship change: {:?}", event);
                                let _ = events.send(event);
                            }
                            Err(e) => {
                                tracing::warn!("Ignoring malformed change notification: {}", e)
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("Championship change listener stopped: {}", e);
                        break;
                    }
                }
            }
        }))
    }
}

#[async_trait]
impl ChampionshipStore for PgChampionshipStore {
    async fn list(&self) -> Result<Vec<Championship>> {
        let rows = sqlx::query_as::<_, ChampionshipRow>(
            r#"
            SELECT championship_id, name, event_date, location, flights,
                   is_public, created_at, published_at
            FROM championships
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Championship::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Championship> {
        let row = sqlx::query_as::<_, ChampionshipRow>(
            r#"
            SELECT championship_id, name, event_date, location, flights,
                   is_public, created_at, published_at
            FROM championships
            WHERE championship_id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(row.into())
    }

    async fn find_public(&self) -> Result<Option<Championship>> {
        let row = sqlx::query_as::<_, ChampionshipRow>(
            r#"
            SELECT championship_id, name, event_date, location, flights,
                   is_public, created_at, published_at
            FROM championships
            WHERE is_public
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Championship::from))
    }

    async fn upsert(&self, championship: &Championship) -> Result<Championship> {
        let row = sqlx::query_as::<_, ChampionshipRow>(
            r#"
            INSERT INTO championships (
                championship_id, name, event_date, location, flights, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (championship_id) DO UPDATE
            SET
                name = EXCLUDED.name,
                event_date = EXCLUDED.event_date,
                location = EXCLUDED.location,
                flights = EXCLUDED.flights,
                updated_at = now()
            RETURNING championship_id, name, event_date, location, flights,
                      is_public, created_at, published_at
            "#,
        )
        .bind(championship.championship_id)
        .bind(&championship.name)
        .bind(championship.event_date)
        .bind(&championship.location)
        .bind(Json(&championship.flights))
        .bind(championship.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM championships
            WHERE championship_id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn publish(&self, id: Uuid) -> Result<Championship> {
        let mut tx = self.pool.begin().await?;

        // Concurrent publishers queue here; the last one to commit wins.
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(PUBLISH_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE championships
            SET is_public = FALSE, updated_at = now()
            WHERE is_public AND championship_id <> $1
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, ChampionshipRow>(
            r#"
            UPDATE championships
            SET is_public = TRUE, published_at = $2, updated_at = now()
            WHERE championship_id = $1
            RETURNING championship_id, name, event_date, location, flights,
                      is_public, created_at, published_at
            "#,
        )
        .bind(id)
        .bind(now())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            let e = StorageError::from(e);
            if e.is_unique_violation() {
                StorageError::ConstraintViolation(
                    "Another championship is already public".to_string(),
                )
            } else {
                e
            }
        })?
        .ok_or(StorageError::NotFound)?;

        tx.commit().await?;
        tracing::info!("Championship {} published", id);

        Ok(row.into())
    }

    async fn unpublish(&self, id: Uuid) -> Result<Championship> {
        let row = sqlx::query_as::<_, ChampionshipRow>(
            r#"
            UPDATE championships
            SET is_public = FALSE, updated_at = now()
            WHERE championship_id = $1
            RETURNING championship_id, name, event_date, location, flights,
                      is_public, created_at, published_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StorageError::NotFound)?;

        Ok(row.into())
    }

    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn store() -> PgChampionshipStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let db = Database::new(&url).await.unwrap();
        db.run_migrations().await.unwrap();
        PgChampionshipStore::new(db.pool().clone())
    }

    #[tokio::test]
    #[ignore] // Needs a Postgres database in DATABASE_URL
    async fn test_publish_is_exclusive() {
        let store = store().await;
        let a = store
            .upsert(&Championship::new("PG A", None, None))
            .await
            .unwrap();
        let b = store
            .upsert(&Championship::new("PG B", None, None))
            .await
            .unwrap();

        store.publish(a.championship_id).await.unwrap();
        store.publish(b.championship_id).await.unwrap();

        let public = store.find_public().await.unwrap().unwrap();
        assert_eq!(public.championship_id, b.championship_id);
        assert!(!store.find_by_id(a.championship_id).await.unwrap().is_public);

        store.delete(a.championship_id).await.unwrap();
        store.delete(b.championship_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore] // Needs a Postgres database in DATABASE_URL
    async fn test_round_trip_keeps_totals() {
        let store = store().await;
        let mut championship = Championship::new("PG round trip", None, None);
        let total = championship
            .add_flight(crate::models::FlightData {
                service_height_m: 220.0,
                dive_speed_kmh: 160.0,
                flight_duration_secs: 450.0,
                ..Default::default()
            })
            .total_points();

        let saved = store.upsert(&championship).await.unwrap();
        assert_eq!(saved, championship);
        assert_eq!(saved.flights[0].total_points(), total);

        store.delete(saved.championship_id).await.unwrap();
    }
}
