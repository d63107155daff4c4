use std::sync::Arc;

use anyhow::Result;
use derive_getters::Getters;
use dotenvy::dotenv;
use storefront::accounts::Accounts;
use storefront::auth::MemoryTokens;
use storefront::catalog::Catalog;
use storefront::http::{router, AppState};
use storefront::store::database::DatabaseStore;
use storefront::OrderEngine;
use tracing::info;

#[derive(Debug, Getters)]
struct ServerConfig {
    database_url: String,
    bind_addr: String,
}

impl ServerConfig {
    fn from_env() -> Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let bind_addr =
            std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        Ok(Self {
            database_url,
            bind_addr,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file, if there is one.
    let _ = dotenv();
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from_env()?;

    let store = DatabaseStore::connect(config.database_url()).await?;
    store.init_schema().await?;

    let state = AppState {
        engine: Arc::new(OrderEngine::new(store.clone())),
        accounts: Arc::new(Accounts::new(store.clone())),
        catalog: Arc::new(Catalog::new(store)),
        tokens: Arc::new(MemoryTokens::new()),
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "storefront listening");
    axum::serve(listener, app).await?;

    Ok(())
}
