use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use server::config::AppConfig;
use server::database::init_db;
use server::seed::{ensure_indexes, seed_defaults};
use server::state::AppState;
use server::store::HackdayStore;
use server::store::db::DbStore;
use server::store::memory::MemoryStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::load().context("Failed to load config")?;
    if config.auth.dev_impersonation {
        warn!("Role impersonation is enabled; do not run this configuration in production");
    }

    let store: Arc<dyn HackdayStore> = match &config.database.url {
        Some(url) => {
            let db = init_db(url).await.context("Failed to connect to database")?;
            ensure_indexes(&db).await.context("Failed to create indexes")?;
            info!("Database connected");
            Arc::new(DbStore::new(db))
        }
        None => {
            warn!("No database configured; running on the in-memory store, data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    seed_defaults(store.as_ref(), &config)
        .await
        .context("Failed to seed defaults")?;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState { store, config };
    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("HackDay server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
