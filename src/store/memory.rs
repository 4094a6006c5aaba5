//! In-memory reference implementation of [`MessageStore`].
//!
//! Single-process only — restarts and multi-instance deployments need a real
//! backend (SQL, Redis-compatible pub/sub); spec §1 explicitly keeps those
//! out of the core. A background sweeper prunes expired entries every
//! [`SWEEP_INTERVAL`], the same periodic-task shape the teacher uses for its
//! per-stream bookkeeping (e.g. `session_reaper`-style loops elsewhere in the
//! stack); expiry is also checked opportunistically on every read so a late
//! sweep never causes a stale delivery.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use bridge_protocol::SseMessage;
use tracing::debug;

use super::{MessageStore, StoreError};

const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

struct StoredMessage {
    event_id: i64,
    to: String,
    payload: Vec<u8>,
    expires_at: Instant,
}

impl StoredMessage {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    fn to_sse_message(&self) -> SseMessage {
        SseMessage::new(self.event_id, self.to.clone(), self.payload.clone())
    }
}

pub struct InMemoryStore {
    by_recipient: RwLock<HashMap<String, Vec<StoredMessage>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            by_recipient: RwLock::new(HashMap::new()),
        }
    }

    /// Spawn the background TTL sweeper. Call once per process.
    pub fn spawn_sweeper(self: &std::sync::Arc<Self>) {
        let store = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                store.sweep();
            }
        });
    }

    fn sweep(&self) {
        let now = Instant::now();
        let mut map = self.by_recipient.write().expect("store lock poisoned");
        let mut removed = 0usize;
        map.retain(|_, messages| {
            let before = messages.len();
            messages.retain(|m| !m.is_expired(now));
            removed += before - messages.len();
            !messages.is_empty()
        });
        if removed > 0 {
            debug!(removed, "swept expired messages from in-memory store");
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageStore for InMemoryStore {
    fn add<'a>(
        &'a self,
        message: SseMessage,
        ttl_secs: u32,
    ) -> Pin<Box<dyn Future<Output = Result<(), StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let entry = StoredMessage {
                event_id: message.event_id,
                to: message.to.clone(),
                payload: message.payload,
                expires_at: Instant::now() + Duration::from_secs(u64::from(ttl_secs)),
            };
            let mut map = self.by_recipient.write().expect("store lock poisoned");
            map.entry(message.to).or_default().push(entry);
            Ok(())
        })
    }

    fn get_messages<'a>(
        &'a self,
        client_ids: &'a [String],
        since_event_id: i64,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<SseMessage>, StoreError>> + Send + 'a>> {
        Box::pin(async move {
            let now = Instant::now();
            let map = self.by_recipient.read().expect("store lock poisoned");
            let mut out: Vec<SseMessage> = Vec::new();
            for client_id in client_ids {
                if let Some(messages) = map.get(client_id) {
                    out.extend(
                        messages
                            .iter()
                            .filter(|m| m.event_id > since_event_id && !m.is_expired(now))
                            .map(StoredMessage::to_sse_message),
                    );
                }
            }
            out.sort_by_key(|m| m.event_id);
            Ok(out)
        })
    }
}
