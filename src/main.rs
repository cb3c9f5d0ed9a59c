mod config;
mod db;
mod errors;
mod models;
mod routes;
mod services;

use axum::{routing::{get, post}, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db::{create_pool, run_migrations, CatalogStore, PgCatalogStore};
use crate::services::{
    channel_import::ChannelImporter,
    m3u_parser::M3UParser,
    normalize::Normalizer,
    playlist_reader::PlaylistReader,
    redis::RedisService,
    scheduler::{start_sync_task, SchedulerConfig},
    sync_cache::SystemClock,
    synchronizer::{CatalogSynchronizer, SyncPolicy},
    tmdb::TmdbClient,
};
use sqlx::PgPool;

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub pool: PgPool,
    pub redis: Option<RedisService>,
    pub synchronizer: Arc<CatalogSynchronizer>,
    pub importer: ChannelImporter,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tv_catalog_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting TV Catalog Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app_env);

    // Initialize PostgreSQL connection pool
    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    // Redis is optional: without it, sync exclusion is per process
    let redis = match &config.redis_url {
        Some(url) => match RedisService::new(url).await {
            Ok(redis) => {
                tracing::info!("Redis connected, cross-replica sync lock enabled");
                Some(redis)
            }
            Err(e) => {
                tracing::warn!("Redis unavailable ({}), sync lock is per process", e);
                None
            }
        },
        None => None,
    };

    let store: Arc<dyn CatalogStore> = Arc::new(PgCatalogStore::new(pool.clone()));
    let shutdown = CancellationToken::new();

    // Remote catalog + synchronizer
    if config.tmdb_api_token.is_empty() {
        tracing::warn!("TMDB_API_TOKEN is not set, catalog requests will be rejected");
    }
    let source = Arc::new(TmdbClient::from_config(&config)?);
    let synchronizer = Arc::new(CatalogSynchronizer::new(
        source,
        Arc::clone(&store),
        Arc::new(SystemClock),
        Normalizer::new(&config.tmdb_image_base_url),
        SyncPolicy::from_config(&config),
        shutdown.child_token(),
    ));
    tracing::info!(
        "Catalog synchronizer ready ({} genres, detail limit {}, concurrency {})",
        config.sync_genres.len(),
        config.series_detail_limit,
        config.detail_concurrency
    );

    // Playlist import
    let importer = ChannelImporter::new(
        PlaylistReader::new(config.playlist_encodings.clone()),
        M3UParser::with_group_marker(config.playlist_group_marker.clone()),
        Arc::clone(&store),
    );

    // Start sync scheduler (runs in background)
    let scheduler = tokio::spawn(start_sync_task(
        Arc::clone(&synchronizer),
        SchedulerConfig {
            interval_secs: config.sync_interval_secs,
        },
        shutdown.clone(),
    ));

    // Build application state
    let state = Arc::new(AppState {
        config,
        pool,
        redis,
        synchronizer,
        importer,
        start_time: Instant::now(),
    });

    // Build router
    let app = Router::new()
        // Health endpoints
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/ready", get(routes::health::ready))
        .route("/live", get(routes::health::live))
        // Catalog sync
        .route("/api/sync", post(routes::sync::trigger_sync))
        .route("/api/sync/force", post(routes::sync::force_sync))
        // Playlist channels
        .route("/api/channels/import", post(routes::channels::import_channels))
        .route("/api/channels/logos", post(routes::channels::refresh_logos))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await?;

    shutdown.cancel();
    scheduler.await?;

    tracing::info!("Server stopped");

    Ok(())
}

/// Resolve on Ctrl+C and cancel background work
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return shutdown.cancelled().await;
    }
    tracing::info!("Shutdown signal received");
    shutdown.cancel();
}
