//! Bounded LRU+TTL record of which `(client_id, ip, origin, user_agent)`
//! tuple subscribed, consulted by the Verify path (spec §4.5/§4.6).
//!
//! No LRU crate appears anywhere in the teacher's dependency stack, so this
//! is hand-rolled the way the teacher hand-rolls its other caches
//! (`StreamCounts`, `EventBus` in `services/receiver/src/cache.rs`): a plain
//! `HashMap` for lookup plus a `VecDeque` recording recency order, guarded by
//! one `RwLock`. `Add` is not hot enough to need O(1) unlink, so the recency
//! list is scanned linearly on write; `Verify` never touches it (reads do not
//! promote, per spec).

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectKey {
    pub client_id: String,
    pub ip: String,
    pub origin: String,
    pub user_agent: String,
}

impl ConnectKey {
    pub fn new(
        client_id: impl Into<String>,
        ip: impl Into<String>,
        origin: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            ip: ip.into(),
            origin: origin.into(),
            user_agent: user_agent.into(),
        }
    }
}

struct Inner {
    expires_at: HashMap<ConnectKey, Instant>,
    recency: VecDeque<ConnectKey>,
}

pub struct ConnectCache {
    inner: RwLock<Inner>,
    capacity: usize,
    ttl: Duration,
}

impl ConnectCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: RwLock::new(Inner {
                expires_at: HashMap::new(),
                recency: VecDeque::new(),
            }),
            capacity,
            ttl,
        }
    }

    /// Insert or refresh `key`, moving it to the front of the recency list.
    /// Evicts the least-recently-used entry if this push exceeds capacity.
    pub fn add(&self, key: ConnectKey) {
        let mut inner = self.inner.write().expect("connect cache lock poisoned");
        let is_new = !inner.expires_at.contains_key(&key);
        inner.expires_at.insert(key.clone(), Instant::now() + self.ttl);

        if !is_new {
            inner.recency.retain(|k| k != &key);
        }
        inner.recency.push_front(key);

        if inner.recency.len() > self.capacity {
            if let Some(evicted) = inner.recency.pop_back() {
                inner.expires_at.remove(&evicted);
            }
        }
    }

    /// Lookup only — a hit does not promote the entry (spec §4.6: "read does
    /// not promote, so eviction order is driven by writes").
    pub fn verify(&self, key: &ConnectKey) -> bool {
        let inner = self.inner.read().expect("connect cache lock poisoned");
        matches!(inner.expires_at.get(key), Some(expires_at) if Instant::now() <= *expires_at)
    }

    /// Walk from the LRU tail removing expired entries, stopping at the
    /// first non-expired one (spec §4.6 / §9: correct under uniform TTL with
    /// `Add` always refreshing, so insertion order tracks expiration order).
    pub fn sweep(&self) {
        let mut inner = self.inner.write().expect("connect cache lock poisoned");
        let now = Instant::now();
        let mut removed = 0usize;
        while let Some(oldest) = inner.recency.back() {
            match inner.expires_at.get(oldest) {
                Some(expires_at) if now > *expires_at => {
                    let key = inner.recency.pop_back().expect("checked by back()");
                    inner.expires_at.remove(&key);
                    removed += 1;
                }
                _ => break,
            }
        }
        if removed > 0 {
            tracing::debug!(removed, "swept expired connect cache entries");
        }
    }

    pub fn spawn_sweeper(self: &std::sync::Arc<Self>, interval: Duration) {
        let cache = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                cache.sweep();
            }
        });
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.read().unwrap().recency.len()
    }
}
