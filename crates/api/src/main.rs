use std::sync::Arc;

use anyhow::{Context, Result};

use cokins_api::config::ApiConfig;
use cokins_api::store::{InMemoryMovementStore, MovementStore};

#[tokio::main]
async fn main() -> Result<()> {
    cokins_observability::init();

    let config = ApiConfig::from_env();

    let store = InMemoryMovementStore::new();
    if let Some(path) = &config.seed_file {
        let loaded = store
            .seed_from_file(path)
            .with_context(|| format!("failed to seed stock movements from {}", path.display()))?;
        tracing::info!(count = loaded, path = %path.display(), "seeded stock movements");
    }

    let store: Arc<dyn MovementStore> = Arc::new(store);
    let app = cokins_api::app::build_app(store);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
