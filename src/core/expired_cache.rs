//! Bounded, time-decaying sets used for two unrelated but structurally
//! identical jobs (spec §4.7): `ExpiredCache<i64>` marks event-ids already
//! delivered to at least one subscriber so replay can skip them, and
//! `TransferredCache` (`BoundedSet<u64>`) marks message hashes already seen
//! for the unique-transfer observability counter. Neither needs precision —
//! both are "eventually consistent" per spec, so a single coarse mutex over
//! a `HashSet` + insertion-ordered `VecDeque` is enough; no sharding like the
//! Registry's two-level scheme.

use std::collections::{HashSet, VecDeque};
use std::hash::Hash;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Inner<T> {
    set: HashSet<T>,
    order: VecDeque<(T, Instant)>,
}

pub struct BoundedSet<T> {
    inner: Mutex<Inner<T>>,
    capacity: usize,
    ttl: Duration,
}

impl<T: Eq + Hash + Copy> BoundedSet<T> {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                set: HashSet::new(),
                order: VecDeque::new(),
            }),
            capacity,
            ttl,
        }
    }

    /// Mark `key` as seen. Returns `true` if this is the first time (useful
    /// for "unique" counters), `false` if already present.
    pub fn mark(&self, key: T) -> bool {
        let mut inner = self.inner.lock().expect("bounded set lock poisoned");
        self.evict_expired(&mut inner);

        if inner.set.contains(&key) {
            return false;
        }
        inner.set.insert(key);
        inner.order.push_back((key, Instant::now()));
        if inner.order.len() > self.capacity {
            if let Some((oldest, _)) = inner.order.pop_front() {
                inner.set.remove(&oldest);
            }
        }
        true
    }

    pub fn contains(&self, key: T) -> bool {
        let mut inner = self.inner.lock().expect("bounded set lock poisoned");
        self.evict_expired(&mut inner);
        inner.set.contains(&key)
    }

    fn evict_expired(&self, inner: &mut Inner<T>) {
        let now = Instant::now();
        while let Some((key, marked_at)) = inner.order.front().copied() {
            if now.duration_since(marked_at) <= self.ttl {
                break;
            }
            inner.order.pop_front();
            inner.set.remove(&key);
        }
    }
}

pub type ExpiredCache = BoundedSet<i64>;
pub type TransferredCache = BoundedSet<u64>;
