//! The pluggable persistent message store interface (spec §4.1/§6).
//!
//! The core only depends on this trait; which backend is wired up (in-memory,
//! SQL, Redis-compatible pub/sub) is an external concern. This module also
//! ships the in-memory reference implementation, which spec §2 calls out as
//! part of the core's own implementation budget.

pub mod memory;

use std::future::Future;
use std::pin::Pin;

use bridge_protocol::SseMessage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Durable, TTL-bounded log keyed by recipient `client_id`.
///
/// Modeled the way `rt-updater`'s `Checker`/`WorkflowState` traits hand-roll
/// object-safe async methods (no `async-trait` dependency in this stack):
/// each method returns a boxed, pinned future instead of being declared
/// `async fn`.
pub trait MessageStore: Send + Sync {
    /// Persist `message` for up to `ttl_secs` seconds.
    fn add<'a>(
        &'a self,
        message: SseMessage,
        ttl_secs: u32,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>>;

    /// Return unexpired messages addressed to any id in `client_ids` with
    /// `event_id > since_event_id`, ascending by `event_id`.
    fn get_messages<'a>(
        &'a self,
        client_ids: &'a [String],
        since_event_id: i64,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SseMessage>, StoreError>> + Send + 'a>>;
}
