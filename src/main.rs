use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use clinic_booking::config::{AppConfig, StoreBackend};
use clinic_booking::handlers;
use clinic_booking::services::notification::Notifier;
use clinic_booking::state::AppState;
use clinic_booking::store::{BookingStore, JsonFileStore, MemoryStore, SqliteStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let store: Arc<dyn BookingStore> = match &config.store {
        StoreBackend::Sqlite { path } => {
            tracing::info!("using SQLite booking store ({path})");
            Arc::new(SqliteStore::open(path)?)
        }
        StoreBackend::File { path } => {
            tracing::info!("using JSON file booking store ({path})");
            Arc::new(JsonFileStore::new(path))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory booking store, bookings are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let state = Arc::new(AppState {
        store,
        notifier: Notifier::from_config(&config),
        admin_token: config.admin_token.clone(),
        store_timeout: config.store_timeout,
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
