pub mod events;
pub mod limiter;
pub mod message;
pub mod verify;

use axum::extract::State;
use axum::response::IntoResponse;

use crate::state::AppState;

/// `GET /healthz` — always 200; the process is up. Same contract as the
/// teacher's `services/server/src/lib.rs::health::healthz`.
pub async fn healthz() -> impl IntoResponse {
    "ok"
}

/// `GET /readyz` — always 200 once the router is serving; the bridge has no
/// external dependency (database, upstream) to wait on before it's ready.
pub async fn readyz() -> impl IntoResponse {
    "ok"
}

/// `GET /metrics` — plain-text counters, see [`crate::metrics::Metrics`].
pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    state.metrics.render()
}
