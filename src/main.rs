use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photowall::config::Config;
use photowall::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "photowall=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting photowall...");

    // Load configuration
    let config = Config::load()?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState::from_config(config)?;
    tracing::info!("Photo store ready: {}", state.store.storage_type());

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
