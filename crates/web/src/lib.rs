use std::sync::Arc;

use assistant::RulesAssistant;
use axum::Router;
use storage::{
    Database,
    repository::{BackendStatus, ChampionshipStore, PgChampionshipStore, SyncedStore},
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod config;
pub mod error;
pub mod features;
pub mod middleware;

use middleware::auth::ApiKeys;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ChampionshipStore>,
    pub status: BackendStatus,
    pub assistant: Arc<RulesAssistant>,
}

impl AppState {
    pub fn new(store: Arc<SyncedStore>, assistant: RulesAssistant) -> Self {
        Self {
            status: store.status(),
            store,
            assistant: Arc::new(assistant),
        }
    }
}

pub fn create_router(state: AppState, api_keys: ApiKeys) -> Router {
    if api_keys.is_empty() {
        tracing::warn!("No judge API keys configured, judge routes will reject every request");
    }

    Router::new()
        .nest(
            "/api/championships",
            features::championships::routes::routes(api_keys.clone()),
        )
        .nest(
            "/api/championships/:id/flights",
            features::flights::routes::routes(api_keys),
        )
        .nest("/api/leaderboard", features::leaderboard::routes::routes())
        .nest("/api/scoring", features::scoring::routes::routes())
        .merge(features::assistant::routes::routes())
        .nest("/api/status", features::status::routes::routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}

/// Connect to the database when one is configured.
///
/// Any failure leaves the server running on local-only state.
pub async fn connect_store(database_url: Option<&str>) -> Arc<SyncedStore> {
    let Some(database_url) = database_url else {
        return Arc::new(SyncedStore::local_only(Some(
            "DATABASE_URL is not set".to_string(),
        )));
    };

    tracing::info!(
        "Connecting to database at: {}",
        database_url.split('@').next_back().unwrap_or("unknown")
    );

    let db = match Database::new(database_url).await {
        Ok(db) => db,
        Err(e) => return Arc::new(SyncedStore::local_only(Some(e.to_string()))),
    };
    tracing::info!("Database connection established");

    if let Err(e) = db.run_migrations().await {
        return Arc::new(SyncedStore::local_only(Some(e.to_string())));
    }
    tracing::info!("Database migrations completed successfully");

    let remote = PgChampionshipStore::new(db.pool().clone());
    if let Err(e) = remote.spawn_listener().await {
        tracing::warn!("Change notifications unavailable: {}", e);
    }

    let store = Arc::new(SyncedStore::with_remote(Arc::new(remote)));
    if let Err(e) = store.hydrate().await {
        tracing::warn!("Initial load from database failed: {}", e);
    }
    store.spawn_follower();

    store
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Falconry Championship API",
        version = "0.1.0",
        description = "Flight scoring and live standings for falconry championships"
    ),
    paths(
        features::championships::handlers::list_championships,
        features::championships::handlers::create_championship,
        features::championships::handlers::get_championship,
        features::championships::handlers::update_championship,
        features::championships::handlers::delete_championship,
        features::championships::handlers::publish_championship,
        features::championships::handlers::unpublish_championship,
        features::championships::handlers::championship_events,
        features::championships::handlers::export_championship,
        features::flights::handlers::add_flight,
        features::flights::handlers::update_flight,
        features::flights::handlers::delete_flight,
        features::leaderboard::handlers::get_leaderboard,
        features::leaderboard::handlers::leaderboard_events,
        features::scoring::handlers::preview_score,
        features::assistant::handlers::get_rules,
        features::assistant::handlers::ask,
        features::status::handlers::get_status,
    ),
    components(
        schemas(
            storage::dto::championship::CreateChampionshipRequest,
            storage::dto::championship::UpdateChampionshipRequest,
            storage::dto::championship::ChampionshipSummary,
            storage::dto::flight::FlightRequest,
            storage::dto::flight::FlightResponse,
            storage::dto::leaderboard::LeaderboardEntry,
            storage::dto::leaderboard::LeaderboardResponse,
            storage::models::Championship,
            storage::models::FlightRecord,
            storage::models::FlightData,
            storage::models::CaptureOutcome,
            storage::models::TechnicalPenalties,
            storage::models::Disqualifications,
            storage::services::scoring::ScoreBreakdown,
            storage::repository::ChangeEvent,
            storage::repository::ChangeKind,
            storage::repository::StatusReport,
            storage::repository::BackendState,
            assistant::Answer,
            assistant::AnswerSource,
            features::assistant::handlers::AskRequest,
            features::assistant::handlers::RuleEntry,
        )
    ),
    tags(
        (name = "championships", description = "Judge championship management"),
        (name = "flights", description = "Judge flight entry"),
        (name = "leaderboard", description = "Public standings"),
        (name = "scoring", description = "Scoring rules and previews"),
        (name = "assistant", description = "Rules assistant"),
        (name = "status", description = "Storage backend status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("API Key")
                        .build(),
                ),
            )
        }
    }
}
