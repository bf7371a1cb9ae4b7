//! Main entry point for the song queue server.
//!
//! This binary serves the queue API over HTTP using the Axum web framework.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use songq::config::Args;
use songq::resolve::{BilibiliResolver, LinkResolver};
use songq::server::{AppState, create_router};
use songq::store::{MemoryStore, SledStore, Store};
use songq::{Coordinator, Registry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("songq={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("Starting song queue server...");
    let config = args.coordinator_config();
    let store: Arc<dyn Store> = match &args.store_path {
        Some(path) => Arc::new(SledStore::open(path)?),
        None => {
            warn!("STORE_PATH not set, queues are kept in memory only");
            Arc::new(MemoryStore::new())
        }
    };
    let registry = Arc::new(Registry::new(config.log_capacity));
    let coordinator = Arc::new(Coordinator::new(registry, store, config));
    let sweeper = Coordinator::spawn_sweeper(Arc::clone(&coordinator), args.sweep_interval());

    let resolver: Option<Arc<dyn LinkResolver>> = if args.resolve_links {
        match BilibiliResolver::new(args.resolve_timeout()) {
            Ok(resolver) => Some(Arc::new(resolver) as Arc<dyn LinkResolver>),
            Err(e) => {
                warn!("Link resolution disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let app = create_router(AppState::new(coordinator, resolver));

    info!("Server listening on http://{}", args.listen);
    info!("Available endpoints:");
    info!("  GET  /health                         - Health check");
    info!("  GET  /api/songListInfo?roomId=&lastHash= - Current queue");
    info!("  POST /api/songOperation?roomId=      - Move, insert or delete a song");
    info!("  POST /api/advance?roomId=            - Mark the next song as sung");
    info!("  POST /api/shuffle?roomId=            - Shuffle waiting songs");

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
