//! One active SSE subscription: a bounded outbound queue, a close flag, and
//! the replay routine run at startup (spec §4.2).
//!
//! The HTTP-writing loop that turns `out_queue` items into wire bytes lives in
//! `http::events` — this module only owns the state machine and the
//! store-backed replay, the same split the teacher keeps between
//! `services/receiver/src/session.rs` (protocol state machine) and
//! `services/server/src/http/sse.rs` (the axum-facing stream).

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Mutex;

use bridge_protocol::SseMessage;
use tokio::sync::mpsc;
use tracing::warn;
use uuid::Uuid;

use crate::core::expired_cache::ExpiredCache;
use crate::store::MessageStore;

/// `out_queue` capacity, fixed per spec §3/§5: a slow subscriber must not
/// back-pressure producers sharing its id.
pub const OUT_QUEUE_CAPACITY: usize = 10;

pub struct Session {
    id: String,
    client_ids: Vec<String>,
    tx: mpsc::Sender<SseMessage>,
    rx: Mutex<Option<mpsc::Receiver<SseMessage>>>,
    last_event_id: AtomicI64,
    closed: AtomicBool,
    started: AtomicBool,
    dropped_count: AtomicU64,
}

impl Session {
    pub fn new(client_ids: Vec<String>, last_event_id: i64) -> std::sync::Arc<Self> {
        let (tx, rx) = mpsc::channel(OUT_QUEUE_CAPACITY);
        std::sync::Arc::new(Self {
            id: Uuid::new_v4().to_string(),
            client_ids,
            tx,
            rx: Mutex::new(Some(rx)),
            last_event_id: AtomicI64::new(last_event_id),
            closed: AtomicBool::new(false),
            started: AtomicBool::new(false),
            dropped_count: AtomicU64::new(0),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn client_ids(&self) -> &[String] {
        &self.client_ids
    }

    pub fn last_event_id(&self) -> i64 {
        self.last_event_id.load(Ordering::Relaxed)
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// `New -> Running`, exactly once. Returns the receiver half of
    /// `out_queue` the first time; `None` on any later call.
    pub fn take_receiver(&self) -> Option<mpsc::Receiver<SseMessage>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return None;
        }
        self.rx.lock().expect("session lock poisoned").take()
    }

    /// `Running -> Closed`. Idempotent: only the first caller's signal
    /// matters, repeats are a no-op rather than a programming error, since
    /// both the writer loop and a best-effort detach path may call it.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Non-blocking enqueue. Drops the newest message (this one) on a full
    /// queue or a closed session rather than blocking the producer — spec
    /// §4.2 "Live enqueue".
    pub fn try_enqueue(&self, msg: SseMessage) -> bool {
        if self.is_closed() {
            return false;
        }
        let event_id = msg.event_id;
        match self.tx.try_send(msg) {
            Ok(()) => {
                self.last_event_id.fetch_max(event_id, Ordering::Relaxed);
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped_count.fetch_add(1, Ordering::Relaxed);
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Startup replay: push every unexpired, not-already-delivered message
    /// addressed to this session's ids onto `out_queue`, ascending by
    /// `event_id`. Unlike `try_enqueue`, replay blocks on the queue rather
    /// than dropping — a reconnect is explicitly asking to catch up, so
    /// losing replay messages to a momentarily full queue defeats the point.
    /// Best-effort: a store error is logged and replay simply stops early,
    /// per spec §4.2 ("log and continue with live delivery only").
    pub async fn replay(&self, store: &dyn MessageStore, expired: &ExpiredCache) {
        let since = self.last_event_id.load(Ordering::Relaxed);
        let messages = match store.get_messages(&self.client_ids, since).await {
            Ok(messages) => messages,
            Err(err) => {
                warn!(session_id = %self.id, error = %err, "replay: store read failed, continuing live-only");
                return;
            }
        };

        for msg in messages {
            if self.is_closed() {
                break;
            }
            if expired.contains(msg.event_id) {
                continue;
            }
            let event_id = msg.event_id;
            if self.tx.send(msg).await.is_err() {
                break;
            }
            self.last_event_id.fetch_max(event_id, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::InMemoryStore;

    #[test]
    fn try_enqueue_drops_newest_when_queue_is_full() {
        let session = Session::new(vec!["aaaa".to_owned()], 0);
        for i in 0..OUT_QUEUE_CAPACITY {
            assert!(session.try_enqueue(SseMessage::new(i as i64, "aaaa", vec![])));
        }
        assert!(!session.try_enqueue(SseMessage::new(99, "aaaa", vec![])));
        assert_eq!(session.dropped_count(), 1);
    }

    #[test]
    fn try_enqueue_on_closed_session_is_rejected() {
        let session = Session::new(vec!["aaaa".to_owned()], 0);
        session.close();
        assert!(!session.try_enqueue(SseMessage::new(1, "aaaa", vec![])));
    }

    #[test]
    fn take_receiver_is_available_exactly_once() {
        let session = Session::new(vec!["aaaa".to_owned()], 0);
        assert!(session.take_receiver().is_some());
        assert!(session.take_receiver().is_none());
    }

    #[tokio::test]
    async fn replay_delivers_unexpired_messages_ascending_and_advances_cursor() {
        let store = InMemoryStore::new();
        store
            .add(SseMessage::new(2, "aaaa", b"b".to_vec()), 60)
            .await
            .unwrap();
        store
            .add(SseMessage::new(1, "aaaa", b"a".to_vec()), 60)
            .await
            .unwrap();

        let session = Session::new(vec!["aaaa".to_owned()], 0);
        let mut rx = session.take_receiver().unwrap();
        let expired = ExpiredCache::new(1000, std::time::Duration::from_secs(60));

        session.replay(&store, &expired).await;

        let first = rx.try_recv().unwrap();
        let second = rx.try_recv().unwrap();
        assert_eq!(first.event_id, 1);
        assert_eq!(second.event_id, 2);
        assert_eq!(session.last_event_id(), 2);
    }

    #[tokio::test]
    async fn replay_skips_messages_already_in_expired_cache() {
        let store = InMemoryStore::new();
        store
            .add(SseMessage::new(1, "aaaa", b"a".to_vec()), 60)
            .await
            .unwrap();
        store
            .add(SseMessage::new(2, "aaaa", b"b".to_vec()), 60)
            .await
            .unwrap();

        let session = Session::new(vec!["aaaa".to_owned()], 0);
        let mut rx = session.take_receiver().unwrap();
        let expired = ExpiredCache::new(1000, std::time::Duration::from_secs(60));
        expired.mark(1);

        session.replay(&store, &expired).await;

        let only = rx.try_recv().unwrap();
        assert_eq!(only.event_id, 2);
        assert!(rx.try_recv().is_err());
    }
}
