//! Process-wide monotonic event-id generator.
//!
//! Seeded from a wall-clock microsecond reading at boot so ids trend upward
//! across restarts (not a correctness requirement — only strict monotonicity
//! within a process is, per spec §5).

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub struct EventIdGenerator {
    next: AtomicI64,
}

impl EventIdGenerator {
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        Self {
            next: AtomicI64::new(seed),
        }
    }

    /// Allocate the next id. Strictly greater than every id returned before it.
    pub fn next(&self) -> i64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for EventIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
