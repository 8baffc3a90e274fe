use axum::Router;
use dotenvy::dotenv;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use hacktrack_server::clock::SystemClock;
use hacktrack_server::config::Config;
use hacktrack_server::identity::MemoryIdentity;
use hacktrack_server::routes::create_routes;
use hacktrack_server::state::AppState;
use hacktrack_server::store::{DocumentStore, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();
    let identity = MemoryIdentity::from_config(&config)?;

    let store: Arc<dyn DocumentStore> = match &config.database_url {
        Some(url) => Arc::new(PgStore::connect(url, config.database_max_connections).await?),
        None => {
            tracing::warn!("DATABASE_URL not set, keeping data in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let state = AppState::new(store, Arc::new(identity), Arc::new(SystemClock));
    let app: Router = create_routes(state, &config);

    let addr = config.bind_addr();
    tracing::info!("🚀 Server running at http://{}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
