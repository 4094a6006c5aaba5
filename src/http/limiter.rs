//! Per-IP concurrent-connection cap for `/bridge/events` (spec §5: "number
//! of sessions is bounded externally by the connection limiter... enforced
//! by middleware, not the core"). Plain `Mutex<HashMap<...>>` counters, the
//! same shape as the teacher's `active_forwarders: Arc<RwLock<HashMap<String, ()>>>`
//! in `services/server/src/state.rs` — just counting instead of presence.
//!
//! A generic tower middleware can't release the slot at the right time for
//! a streaming response (the handler returns its `Response` long before the
//! SSE body finishes), so the guard is acquired by the `/bridge/events`
//! handler directly and moved into the writer task; it releases on `Drop`
//! when that task ends, same moment the session detaches from the Registry.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

pub struct ConnectionLimiter {
    counts: Mutex<HashMap<IpAddr, usize>>,
    limit: usize,
}

impl ConnectionLimiter {
    pub fn new(limit: usize) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            limit,
        }
    }

    /// Returns `None` if `ip` is already at the configured limit.
    pub fn try_acquire(self: &Arc<Self>, ip: IpAddr) -> Option<ConnectionGuard> {
        let mut counts = self.counts.lock().expect("limiter lock poisoned");
        let count = counts.entry(ip).or_insert(0);
        if *count >= self.limit {
            return None;
        }
        *count += 1;
        Some(ConnectionGuard {
            limiter: self.clone(),
            ip,
        })
    }

    fn release(&self, ip: IpAddr) {
        let mut counts = self.counts.lock().expect("limiter lock poisoned");
        if let Some(count) = counts.get_mut(&ip) {
            *count -= 1;
            if *count == 0 {
                counts.remove(&ip);
            }
        }
    }

    #[cfg(test)]
    fn current(&self, ip: IpAddr) -> usize {
        *self.counts.lock().unwrap().get(&ip).unwrap_or(&0)
    }
}

pub struct ConnectionGuard {
    limiter: Arc<ConnectionLimiter>,
    ip: IpAddr,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.limiter.release(self.ip);
    }
}
