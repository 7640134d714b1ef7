use std::sync::Arc;

use anyhow::Context;
use school_directory_api::{
    app,
    auth::{IdentityProvider, SupabaseClient},
    config::AppConfig,
    database::{DatabaseManager, MemoryStore, PgStore},
    AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SUPABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env();
    tracing::info!("Starting school directory API in {:?} mode", config.environment);

    let identity: Arc<dyn IdentityProvider> = Arc::new(
        SupabaseClient::new(config.supabase.clone()).context("failed to build identity provider client")?,
    );
    if config.supabase.url.is_empty() && config.supabase.jwt_secret.is_none() {
        tracing::warn!("Neither SUPABASE_URL nor SUPABASE_JWT_SECRET is set; every token will be rejected");
    }

    let state = match &config.database.url {
        Some(_) => {
            let pool = DatabaseManager::connect(&config.database).await?;
            if config.database.run_migrations {
                DatabaseManager::run_migrations(&pool).await?;
            }
            let store = Arc::new(PgStore::new(pool, config.pagination.max_page_size));
            AppState::new(config.clone(), store, identity)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using the in-memory store (data is lost on exit)");
            AppState::new(config.clone(), Arc::new(MemoryStore::new()), identity)
        }
    };

    let bind_addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("School directory API listening on http://{}", bind_addr);
    axum::serve(listener, app(state)).await.context("server error")?;
    Ok(())
}
