use clinic_db::Stores;
use clinic_server::config::{AppConfig, StoreBackend};
use clinic_server::{app, cors_layer, AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let stores = match config.backend {
        StoreBackend::Postgres => {
            Stores::connect(&config.relational_db, &config.document_db).await?
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory stores; data is lost on shutdown");
            Stores::in_memory()
        }
    };

    let state = AppState::new(stores.clone(), &config)?;
    let app = app(state, cors_layer(&config.cors_origins)?);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Clinic server running on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    stores.close().await;
    tracing::info!("✓ Stores closed, bye");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
