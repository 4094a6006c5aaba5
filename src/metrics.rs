//! In-process counters exposed as plain `key value` lines at `GET /metrics`.
//!
//! The teacher never ships a metrics-format client library (no `prometheus`
//! crate anywhere in its dependency tree) — its own `/healthz`/`/readyz` in
//! `services/forwarder/src/status_http.rs` are hand-formatted plain-text
//! responses. This follows the same texture rather than pulling in a new
//! dependency the corpus never reaches for.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

#[derive(Default)]
pub struct Metrics {
    bad_requests: AtomicU64,
    dropped_messages: AtomicU64,
    messages_published: AtomicU64,
    unique_transfers: AtomicU64,
    active_subscriptions: AtomicI64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_bad_requests(&self) {
        self.bad_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_dropped_messages(&self, by: u64) {
        self.dropped_messages.fetch_add(by, Ordering::Relaxed);
    }

    pub fn inc_messages_published(&self) {
        self.messages_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_unique_transfers(&self) {
        self.unique_transfers.fetch_add(1, Ordering::Relaxed);
    }

    pub fn subscription_opened(&self) {
        self.active_subscriptions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn subscription_closed(&self) {
        self.active_subscriptions.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn render(&self) -> String {
        format!(
            "bridge_bad_requests_total {}\n\
             bridge_dropped_messages_total {}\n\
             bridge_messages_published_total {}\n\
             bridge_unique_transfers_total {}\n\
             bridge_active_subscriptions {}\n",
            self.bad_requests.load(Ordering::Relaxed),
            self.dropped_messages.load(Ordering::Relaxed),
            self.messages_published.load(Ordering::Relaxed),
            self.unique_transfers.load(Ordering::Relaxed),
            self.active_subscriptions.load(Ordering::Relaxed),
        )
    }
}
