//! Shared application state handed to every axum handler, the same shape
//! the teacher's `AppState` takes in `services/server/src/state.rs`: a
//! `Clone` struct of `Arc`-wrapped shared pieces, constructed once at
//! startup and cloned cheaply per request.

use std::sync::Arc;

use crate::config::Config;
use crate::core::dispatch::Dispatch;
use crate::http::limiter::ConnectionLimiter;
use crate::metrics::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub dispatch: Arc<Dispatch>,
    pub config: Arc<Config>,
    pub metrics: Arc<Metrics>,
    pub connection_limiter: Arc<ConnectionLimiter>,
}
