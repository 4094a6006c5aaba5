//! Shared integration-test harness: spins up the real router on an ephemeral
//! TCP port and drives it with `reqwest`, the same style as the teacher's
//! `services/server/tests/sse_events.rs` (bind, spawn `axum::serve`, then
//! talk to it as a real HTTP client) rather than `tower::ServiceExt::oneshot`
//! — the SSE surface needs a real streaming connection to read frames off as
//! they arrive.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

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

pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_owned(),
        log_level: "info".to_owned(),
        heartbeat_interval: Duration::from_millis(100),
        connect_cache_size: 1000,
        connect_cache_ttl: Duration::from_secs(3600),
        disconnect_events_ttl_secs: 3600,
        disconnect_event_max_size: 1024,
        max_ttl_secs: 300,
        max_body_bytes: 1_048_576,
        per_ip_connection_limit: 50,
        expired_cache_capacity: 10_000,
        expired_cache_ttl: Duration::from_secs(60),
        transferred_cache_capacity: 10_000,
        transferred_cache_ttl: Duration::from_secs(60),
        webhook_url: None,
        copy_url: None,
        analytics_url: None,
    }
}

/// Spawn a full instance of the bridge with a fresh in-memory store and
/// registry, letting the caller tweak config defaults (e.g. shrink
/// `heartbeat_interval` or `disconnect_event_max_size`) before boot.
pub async fn spawn_app(configure: impl FnOnce(&mut Config)) -> TestApp {
    let mut config = test_config();
    configure(&mut config);
    let config = Arc::new(config);

    let registry = Arc::new(Registry::new());
    let store = Arc::new(InMemoryStore::new());
    store.spawn_sweeper();
    let expired = Arc::new(ExpiredCache::new(
        config.expired_cache_capacity,
        config.expired_cache_ttl,
    ));
    let transferred = Arc::new(TransferredCache::new(
        config.transferred_cache_capacity,
        config.transferred_cache_ttl,
    ));
    let connect_cache = Arc::new(ConnectCache::new(
        config.connect_cache_size,
        config.connect_cache_ttl,
    ));
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
        config,
        metrics,
        connection_limiter,
    };

    let router = bridge_relay::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr,
        client: reqwest::Client::new(),
    }
}

/// Read SSE chunks off `response` until `predicate` matches the accumulated
/// text or `timeout` elapses, returning what was collected either way.
pub async fn collect_sse_until(
    response: &mut reqwest::Response,
    timeout: Duration,
    mut predicate: impl FnMut(&str) -> bool,
) -> String {
    let mut collected = String::new();
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, response.chunk()).await {
            Ok(Ok(Some(chunk))) => {
                collected.push_str(&String::from_utf8_lossy(&chunk));
                if predicate(&collected) {
                    break;
                }
            }
            Ok(Ok(None)) | Ok(Err(_)) | Err(_) => break,
        }
    }
    collected
}
