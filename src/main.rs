use std::sync::Arc;

use anyhow::Context;
use msgstore::{
    db::{create_pool, redact_database_url, run_migrations},
    directory::HttpDirectoryClient,
    message::{InMemoryMessageRepository, MessageRepository, MessageService, PgMessageRepository},
    routes::create_router,
    state::{AppState, Config, StorageBackend},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,msgstore=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Arc::new(Config::from_env()?);

    let repository: Arc<dyn MessageRepository> = match config.storage_backend {
        StorageBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is not set")?;

            let url_for_logging = redact_database_url(database_url);

            tracing::info!("Connecting to database at {}...", url_for_logging);
            let db = create_pool(database_url, config.database_max_connections)
                .await
                .with_context(|| format!("failed to connect to database at {}", url_for_logging))?;

            tracing::info!("Running migrations...");
            run_migrations(&db).await?;

            Arc::new(PgMessageRepository::new(db))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory message storage; messages are lost on restart");
            Arc::new(InMemoryMessageRepository::new())
        }
    };

    tracing::info!("Resolving users and groups via {}", config.user_service_url);
    let directory = Arc::new(HttpDirectoryClient::new(config.user_service_url.clone()));

    let state = AppState {
        config: config.clone(),
        message_service: MessageService::new(repository, directory),
    };

    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {:?}", e);
        std::future::pending::<()>().await;
    }
}
