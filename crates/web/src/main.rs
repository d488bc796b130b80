use anyhow::Context;
use assistant::{OllamaClient, RulesAssistant};
use axum::http::Method;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use web::{AppState, config::Config, connect_store, create_router, middleware::auth::ApiKeys};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("Starting falconry championship API");

    let config = Config::from_env().context("Failed to load API configuration")?;
    tracing::info!("Configuration loaded successfully");

    let store = connect_store(config.database_url.as_deref()).await;
    tracing::info!("Storage backend: {:?}", store.status().report().state);

    let assistant = if config.assistant_enabled {
        let client = OllamaClient::new(&config.ollama_url, &config.ollama_model)
            .context("Failed to initialize Ollama client")?;
        tracing::info!("Rules assistant using model {}", client.model());
        check_ollama(&client, &config.ollama_url).await;
        RulesAssistant::new(Box::new(client))
    } else {
        tracing::info!("Rules assistant disabled, answering from the rules lookup");
        RulesAssistant::offline()
    };

    let api_keys = ApiKeys::from_comma_separated(&config.judge_api_keys);
    let state = AppState::new(store, assistant);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600));

    let app = create_router(state, api_keys).layer(cors);

    let bind_address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Starting server at http://{}", bind_address);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Warn early when the assistant's model server or model is missing
async fn check_ollama(client: &OllamaClient, url: &str) {
    match client.health_check().await {
        Ok(true) => {}
        Ok(false) => {
            tracing::warn!("Ollama at {} answered with an error status", url);
            return;
        }
        Err(e) => {
            tracing::warn!("Ollama not reachable at {}: {}", url, e);
            return;
        }
    }

    match client.list_models().await {
        Ok(models) if models.iter().any(|m| m.name == client.model()) => {
            tracing::info!("Ollama model {} is available", client.model());
        }
        Ok(models) => tracing::warn!(
            "Ollama model {} not found, available: {:?}",
            client.model(),
            models.iter().map(|m| m.name.as_str()).collect::<Vec<_>>()
        ),
        Err(e) => tracing::warn!("Could not list Ollama models: {}", e),
    }
}
