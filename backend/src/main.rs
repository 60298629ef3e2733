use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use fitplan_backend::coach::{PlanResolver, PlanSource};
use fitplan_backend::storage::StorageStatus;
use fitplan_backend::{api, config, db};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .json()
        .init();

    info!("Starting fitness plan backend");
    info!("Configuration loaded");

    // Resolve storage for this run
    let storage = Arc::new(db::bootstrap(&config).await?);
    match storage.status() {
        StorageStatus::Ready => info!("Persistence enabled"),
        StorageStatus::Unreachable => warn!("Database configured but unreachable, will retry on demand"),
        StorageStatus::Unconfigured => warn!("POSTGRES_URL is not set, plans will not be saved"),
    }

    let source = PlanSource::from_config(&config)?;
    if config.mock_mode() {
        warn!("OPENAI_API_KEY is not set, serving mock plans");
    }

    let resolver = Arc::new(PlanResolver::new(source, storage, config.persistence_policy));
    let shutdown = CancellationToken::new();

    let routes = api::service(resolver, shutdown.clone(), &config.allowed_origins);

    // Start server
    let addr = ([0, 0, 0, 0], config.port);
    let (bound, server) = warp::serve(routes).bind_with_graceful_shutdown(addr, {
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
            shutdown.cancel();
        }
    });
    info!("Server listening on {}", bound);

    server.await;

    Ok(())
}
