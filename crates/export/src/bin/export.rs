use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use export::{ExportError, render_printable, suggested_filename};
use storage::{
    Database,
    repository::{ChampionshipStore, PgChampionshipStore},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "falconry-export")]
#[command(about = "Export a championship's standings as a printable sheet", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    target: Target,

    /// Output file or directory; defaults to a name derived from the championship
    #[arg(short, long)]
    output: Option<PathBuf>,

    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(clap::Args)]
#[group(required = true, multiple = false)]
struct Target {
    /// Championship id
    #[arg(short, long)]
    championship: Option<Uuid>,

    /// Export whichever championship is currently public
    #[arg(long)]
    public: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "falconry_export={},export={},storage={}",
                    log_level, log_level, log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let db = Database::new(&cli.database_url).await?;
    let store = PgChampionshipStore::new(db.pool().clone());

    let championship = match cli.target.championship {
        Some(id) => store.find_by_id(id).await.map_err(ExportError::from)?,
        None => store
            .find_public()
            .await
            .map_err(ExportError::from)?
            .ok_or(ExportError::NothingPublished)?,
    };

    tracing::info!(
        "Exporting '{}' ({} flights)",
        championship.name,
        championship.flights.len()
    );

    let path = match cli.output {
        Some(path) if path.is_dir() => path.join(suggested_filename(&championship)),
        Some(path) => path,
        None => PathBuf::from(suggested_filename(&championship)),
    };

    let html = render_printable(&championship, Utc::now())?;
    tokio::fs::write(&path, html)
        .await
        .map_err(ExportError::from)?;

    tracing::info!("Wrote {}", path.display());
    println!("{}", path.display());

    Ok(())
}
