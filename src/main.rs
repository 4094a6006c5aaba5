use std::net::SocketAddr;
use std::sync::Arc;

use bridge_relay::config::Config;
use bridge_relay::core::connect_cache::ConnectCache;
use bridge_relay::core::dispatch::Dispatch;
use bridge_relay::core::expired_cache::{ExpiredCache, TransferredCache};
use bridge_relay::core::registry::Registry;
use bridge_relay::http::limiter::ConnectionLimiter;
use bridge_relay::metrics::Metrics;
use bridge_relay::state::AppState;
use bridge_relay::store::memory::InMemoryStore;
use bridge_relay::webhook::WebhookSink;
use bridge_relay::DEFAULT_CONNECT_CACHE_SWEEP_INTERVAL;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let config = Arc::new(Config::from_env());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config.log_level.clone()))
        .init();

    let registry = Arc::new(Registry::new());

    let store = Arc::new(InMemoryStore::new());
    store.spawn_sweeper();

    let expired = Arc::new(ExpiredCache::new(100_000, config.expired_cache_ttl));
    let transferred = Arc::new(TransferredCache::new(100_000, config.transferred_cache_ttl));

    let connect_cache = Arc::new(ConnectCache::new(config.connect_cache_size, config.connect_cache_ttl));
    connect_cache.spawn_sweeper(DEFAULT_CONNECT_CACHE_SWEEP_INTERVAL);

    let webhooks = Arc::new(WebhookSink::new(
        config.webhook_url.clone(),
        config.copy_url.clone(),
        config.analytics_url.clone(),
    ));
    let metrics = Arc::new(Metrics::new());

    let dispatch = Arc::new(Dispatch::new(
        registry,
        store,
        expired,
        transferred,
        connect_cache,
        webhooks,
        metrics.clone(),
        config.clone(),
    ));

    let connection_limiter = Arc::new(ConnectionLimiter::new(config.per_ip_connection_limit));

    let state = AppState {
        dispatch,
        config: config.clone(),
        metrics,
        connection_limiter,
    };

    let router = bridge_relay::build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind");
    info!(addr = %config.bind_addr, "bridge-relay listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");
    info!("bridge-relay shut down gracefully");
}

/// Waits for SIGTERM or Ctrl-C (SIGINT) and returns to trigger graceful
/// shutdown, mirroring `services/server/src/main.rs::shutdown_signal`.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl+C, shutting down"); },
        _ = terminate => { info!("received SIGTERM, shutting down"); },
    }
}
