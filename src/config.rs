//! Startup configuration, read once from the environment the way the
//! teacher's `main.rs` reads `DATABASE_URL`/`BIND_ADDR`/`LOG_LEVEL`: required
//! values use `.expect(...)`, everything else falls back to a documented
//! default via `unwrap_or_else`. Spec §6's "Configuration inputs to the
//! core" plus the ambient transport/webhook settings SPEC_FULL.md adds.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub log_level: String,
    pub heartbeat_interval: Duration,
    pub connect_cache_size: usize,
    pub connect_cache_ttl: Duration,
    pub disconnect_events_ttl_secs: u32,
    pub disconnect_event_max_size: usize,
    pub max_ttl_secs: u32,
    pub max_body_bytes: usize,
    pub per_ip_connection_limit: usize,
    pub expired_cache_capacity: usize,
    pub expired_cache_ttl: Duration,
    pub transferred_cache_capacity: usize,
    pub transferred_cache_ttl: Duration,
    pub webhook_url: Option<String>,
    pub copy_url: Option<String>,
    pub analytics_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned()),
            heartbeat_interval: Duration::from_secs(env_u64("HEARTBEAT_INTERVAL_SECS", 10)),
            connect_cache_size: env_usize("CONNECT_CACHE_SIZE", 10_000),
            connect_cache_ttl: Duration::from_secs(env_u64("CONNECT_CACHE_TTL_SECS", 86_400)),
            disconnect_events_ttl_secs: env_u32("DISCONNECT_EVENTS_TTL_SECS", 3_600),
            disconnect_event_max_size: env_usize("DISCONNECT_EVENT_MAX_SIZE", 1_024),
            max_ttl_secs: env_u32("MAX_TTL_SECS", 300),
            max_body_bytes: env_usize("MAX_BODY_BYTES", 1_048_576),
            per_ip_connection_limit: env_usize("PER_IP_CONNECTION_LIMIT", 50),
            expired_cache_capacity: env_usize("EXPIRED_CACHE_CAPACITY", 100_000),
            expired_cache_ttl: Duration::from_secs(env_u64("EXPIRED_CACHE_TTL_SECS", 120)),
            transferred_cache_capacity: env_usize("TRANSFERRED_CACHE_CAPACITY", 100_000),
            transferred_cache_ttl: Duration::from_secs(env_u64("TRANSFERRED_CACHE_TTL_SECS", 300)),
            webhook_url: env::var("WEBHOOK_URL").ok(),
            copy_url: env::var("COPY_URL").ok(),
            analytics_url: env::var("ANALYTICS_URL").ok(),
        }
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
