//! `GET /bridge/events` — the long-lived SSE subscription (spec §4.4, §6).
//!
//! Mirrors the shape of the teacher's `dashboard_sse` in
//! `services/server/src/http/sse.rs` (spawn a background feed, wrap a
//! channel in a stream, return it as the response body) but can't reuse
//! `axum::response::sse::{Event, Sse}` directly: spec §6 pins the wire bytes
//! exactly (`\r\n` line endings, a literal `id:` line, two distinct
//! heartbeat encodings), which axum's `Event` builder doesn't expose. The
//! frames are built by hand instead and streamed as raw `Bytes`.

use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::error::{bad_request, ApiError};
use crate::state::AppState;

const OUTBOX_CAPACITY: usize = 16;

#[derive(Debug, Deserialize)]
pub struct SubscribeParams {
    pub client_id: Option<String>,
    pub last_event_id: Option<String>,
    pub heartbeat: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HeartbeatStyle {
    Legacy,
    Message,
}

impl HeartbeatStyle {
    fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("legacy") => HeartbeatStyle::Legacy,
            _ => HeartbeatStyle::Message,
        }
    }

    fn frame(self) -> Bytes {
        match self {
            HeartbeatStyle::Legacy => Bytes::from_static(b"event: heartbeat\n\n"),
            HeartbeatStyle::Message => {
                Bytes::from_static(b"event: message\r\ndata: heartbeat\r\n\r\n")
            }
        }
    }
}

fn message_frame(event_id: i64, payload: &[u8]) -> Bytes {
    let data = String::from_utf8_lossy(payload);
    Bytes::from(format!("event: message\r\nid: {event_id}\r\ndata: {data}\r\n\r\n"))
}

pub async fn subscribe(
    State(state): State<AppState>,
    Query(params): Query<SubscribeParams>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<Response, ApiError> {
    let raw_ids = params.client_id.ok_or_else(|| {
        state.metrics.inc_bad_requests();
        bad_request("missing client_id")
    })?;
    let client_ids: Vec<String> = raw_ids
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect();
    if client_ids.is_empty() {
        state.metrics.inc_bad_requests();
        return Err(bad_request("missing client_id"));
    }

    let last_event_id_raw = headers
        .get("last-event-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or(params.last_event_id);
    let last_event_id = match last_event_id_raw {
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
            state.metrics.inc_bad_requests();
            bad_request("malformed last_event_id")
        })?,
        None => 0,
    };

    let heartbeat = HeartbeatStyle::from_param(params.heartbeat.as_deref());

    let guard = state
        .connection_limiter
        .try_acquire(addr.ip())
        .ok_or_else(|| ApiError::BadRequest("too many connections from this address".to_owned()))?;

    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let session = state
        .dispatch
        .subscribe(client_ids, last_event_id, addr.ip().to_string(), origin, user_agent);
    let mut inbox = session
        .take_receiver()
        .expect("subscribe() always hands back a freshly created session");

    let (outbox_tx, outbox_rx) = tokio::sync::mpsc::channel::<Result<Bytes, Infallible>>(OUTBOX_CAPACITY);
    let dispatch = state.dispatch.clone();
    let store = dispatch.store().clone();
    let expired = dispatch.expired_cache().clone();
    let heartbeat_interval = state.config.heartbeat_interval;

    tokio::spawn(async move {
        let _guard = guard;
        // Force header flush on proxies that buffer until the first body byte.
        if outbox_tx.send(Ok(Bytes::from_static(b"\n"))).await.is_err() {
            dispatch.unsubscribe(&session);
            return;
        }

        session.replay(store.as_ref(), expired.as_ref()).await;

        let mut ticker = tokio::time::interval(heartbeat_interval);
        ticker.tick().await; // first tick fires immediately; consume it so heartbeats start one interval out

        loop {
            tokio::select! {
                biased;
                () = outbox_tx.closed() => break,
                maybe_msg = inbox.recv() => {
                    match maybe_msg {
                        Some(msg) => {
                            if outbox_tx.send(Ok(message_frame(msg.event_id, &msg.payload))).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ticker.tick() => {
                    if outbox_tx.send(Ok(heartbeat.frame())).await.is_err() {
                        break;
                    }
                }
            }
        }

        debug!(session_id = %session.id(), "subscriber writer loop exiting");
        dispatch.unsubscribe(&session);
    });

    let body = axum::body::Body::from_stream(ReceiverStream::new(outbox_rx));
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header("X-Accel-Buffering", "no")
        .body(body)
        .map_err(|err| ApiError::Internal(format!("failed to build sse response: {err}")))?;

    Ok(response.into_response())
}
