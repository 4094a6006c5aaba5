pub mod config;
pub mod core;
pub mod error;
pub mod http;
pub mod metrics;
pub mod state;
pub mod store;
pub mod webhook;

pub use state::AppState;

use axum::routing::get;
use axum::Router;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Assembles the full router, the same shape as the teacher's
/// `build_router(state)` in `services/server/src/lib.rs`: one `Router::new()`
/// chain of `.route(...)` calls, layered, then `.with_state(state)`.
///
/// The bridge never authenticates producers or subscribers (spec §1
/// Non-goals), so CORS is wide open rather than tied to a known origin list
/// — there's no allowlist to build it from.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/bridge/events", get(http::events::subscribe))
        .route("/bridge/message", axum::routing::post(http::message::publish))
        .route("/bridge/verify", get(http::verify::verify))
        .route("/healthz", get(http::healthz))
        .route("/readyz", get(http::readyz))
        .route("/metrics", get(http::metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub const DEFAULT_CONNECT_CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
