//! Concurrency-safe many-to-many index from `client_id` to the set of
//! [`Session`]s subscribed to it.
//!
//! Two-level locking, per spec §4.1: a coarse lock around the outer map
//! (short critical sections only — find/insert/delete the per-id bucket) and
//! a finer lock on each per-id bucket. The per-id lock is never held while
//! acquiring the outer lock, so the two can't deadlock against each other.
//!
//! `std::sync::RwLock` rather than `tokio::sync::RwLock`: every critical
//! section here is synchronous (no `.await` while holding either lock), which
//! is what lets [`Session`]'s `Drop` impl detach synchronously when the
//! subscribing HTTP connection ends (see `core::session`).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::core::session::Session;

type Bucket = RwLock<Vec<Arc<Session>>>;

pub struct Registry {
    buckets: RwLock<HashMap<String, Arc<Bucket>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(HashMap::new()),
        }
    }

    fn bucket_for(&self, client_id: &str) -> Arc<Bucket> {
        {
            let map = self.buckets.read().expect("registry lock poisoned");
            if let Some(bucket) = map.get(client_id) {
                return bucket.clone();
            }
        }
        let mut map = self.buckets.write().expect("registry lock poisoned");
        map.entry(client_id.to_owned())
            .or_insert_with(|| Arc::new(RwLock::new(Vec::new())))
            .clone()
    }

    /// Attach `session` under every id in `session.client_ids()`.
    pub fn attach(&self, session: &Arc<Session>) {
        for client_id in session.client_ids() {
            let bucket = self.bucket_for(client_id);
            let mut sessions = bucket.write().expect("bucket lock poisoned");
            sessions.push(session.clone());
        }
        debug!(session_id = %session.id(), ids = ?session.client_ids(), "attached session");
    }

    /// Detach `session` from every id it was attached under, pruning buckets
    /// that become empty.
    pub fn detach(&self, session: &Session) {
        for client_id in session.client_ids() {
            let bucket = match self.buckets.read().expect("registry lock poisoned").get(client_id)
            {
                Some(bucket) => bucket.clone(),
                None => continue,
            };
            let now_empty = {
                let mut sessions = bucket.write().expect("bucket lock poisoned");
                sessions.retain(|s| s.id() != session.id());
                sessions.is_empty()
            };
            if now_empty {
                let mut map = self.buckets.write().expect("registry lock poisoned");
                if let Some(bucket) = map.get(client_id) {
                    if bucket.read().expect("bucket lock poisoned").is_empty() {
                        map.remove(client_id);
                    }
                }
            }
        }
        debug!(session_id = %session.id(), "detached session");
    }

    /// Snapshot the sessions subscribed to `to`, then enqueue outside the
    /// lock. Never blocks a producer on a slow subscriber.
    pub fn fanout(&self, to: &str, msg: &bridge_protocol::SseMessage) -> FanoutStats {
        let snapshot: Vec<Arc<Session>> = {
            let map = self.buckets.read().expect("registry lock poisoned");
            match map.get(to) {
                Some(bucket) => bucket.read().expect("bucket lock poisoned").clone(),
                None => return FanoutStats::default(),
            }
        };

        let mut stats = FanoutStats::default();
        for session in &snapshot {
            if session.try_enqueue(msg.clone()) {
                stats.delivered += 1;
            } else {
                stats.dropped += 1;
            }
        }
        stats
    }

    #[cfg(test)]
    pub fn subscriber_count(&self, client_id: &str) -> usize {
        let map = self.buckets.read().expect("registry lock poisoned");
        map.get(client_id)
            .map(|b| b.read().expect("bucket lock poisoned").len())
            .unwrap_or(0)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FanoutStats {
    pub delivered: u32,
    pub dropped: u32,
}
