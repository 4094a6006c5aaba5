//! S4 — a small `topic=disconnect` envelope outlives its requested ttl,
//! surviving up to `DisconnectEventsTTL` (spec §8 S4, property 5).

mod common;

use std::time::Duration;

#[tokio::test]
async fn small_disconnect_envelope_survives_past_its_requested_ttl() {
    // ttl=1s requested, but disconnect_events_ttl_secs=5s should win for a
    // small enough body; ordinary messages at ttl=1s would be gone.
    let app = common::spawn_app(|config| {
        config.disconnect_events_ttl_secs = 5;
        config.disconnect_event_max_size = 4096;
    })
    .await;

    app.client
        .post(app.url("/bridge/message?client_id=bbbb&to=aaaa&ttl=1&topic=disconnect"))
        .body("bye")
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let mut sub = app
        .client
        .get(app.url("/bridge/events?client_id=aaaa&last_event_id=0"))
        .send()
        .await
        .unwrap();
    let collected = common::collect_sse_until(&mut sub, Duration::from_secs(2), |text| {
        text.contains("event: message")
    })
    .await;

    assert!(
        collected.contains("event: message"),
        "disconnect event should still be replayable after its nominal ttl elapsed, got:\n{collected}"
    );
}

#[tokio::test]
async fn ordinary_message_at_same_ttl_expires_on_schedule() {
    let app = common::spawn_app(|config| {
        config.disconnect_events_ttl_secs = 5;
        config.disconnect_event_max_size = 4096;
    })
    .await;

    app.client
        .post(app.url("/bridge/message?client_id=bbbb&to=aaaa&ttl=1"))
        .body("plain")
        .send()
        .await
        .unwrap()
        .error_for_status()
        .unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let mut sub = app
        .client
        .get(app.url("/bridge/events?client_id=aaaa&last_event_id=0"))
        .send()
        .await
        .unwrap();
    let collected = common::collect_sse_until(&mut sub, Duration::from_millis(500), |text| {
        text.contains("event: message")
    })
    .await;

    assert!(
        !collected.contains("event: message"),
        "plain message should have expired, got:\n{collected}"
    );
}
