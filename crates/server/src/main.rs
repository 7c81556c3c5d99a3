//! Yatube server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use fred::prelude::*;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use yatube_api::{AppState, HtmlRenderer};
use yatube_common::{
    CacheStore, Config, LocalStorage, MemoryCacheStore, RedisCacheStore,
    config::{CacheBackend, CacheConfig},
};
use yatube_core::{FragmentCache, Paginator};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Build the fragment cache store selected by configuration.
async fn cache_store(config: &CacheConfig) -> Result<Arc<dyn CacheStore>, Box<dyn std::error::Error>> {
    match (config.backend, config.redis_url.as_deref()) {
        (CacheBackend::Redis, Some(url)) => {
            info!("Connecting to Redis...");
            let fred_config = fred::types::config::Config::from_url(url)?;
            let client = fred::clients::Client::new(fred_config, None, None, None);
            client.connect();
            client.wait_for_connect().await?;
            info!("Connected to Redis fragment cache");
            Ok(Arc::new(RedisCacheStore::new(
                Arc::new(client),
                config.prefix.clone(),
            )))
        }
        (CacheBackend::Redis, None) => {
            warn!("cache.backend is redis but cache.redis_url is unset, using memory cache");
            Ok(Arc::new(MemoryCacheStore::new()))
        }
        (CacheBackend::Memory, _) => Ok(Arc::new(MemoryCacheStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "yatube=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting yatube server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = yatube_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    yatube_db::migrate(&db).await?;
    info!("Migrations completed");
    let db = Arc::new(db);

    let store = cache_store(&config.cache).await?;
    let fragment_cache = FragmentCache::new(store, Duration::from_secs(config.cache.index_ttl_secs));

    let storage = Arc::new(LocalStorage::new(
        config.media.root.clone(),
        config.media.url.clone(),
    ));
    let renderer = Arc::new(HtmlRenderer::new(&config.media.url));

    let state = AppState::new(
        db,
        storage,
        fragment_cache,
        renderer,
        Paginator::new(config.feed.posts_per_page),
    );
    let app = yatube_api::app(state, &config.media.root, &config.media.url);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {} ({})", addr, config.server.url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
