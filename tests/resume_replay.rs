//! S2 — offline publishes are replayed in order to a subscriber that
//! reconnects with `Last-Event-ID` (spec §8 S2, property 3).

mod common;

use std::time::Duration;

#[tokio::test]
async fn reconnect_replays_only_events_after_last_event_id() {
    let app = common::spawn_app(|_| {}).await;

    let mut ids = Vec::new();
    for _ in 0..3 {
        let resp = app
            .client
            .post(app.url("/bridge/message?client_id=bbbb&to=aaaa&ttl=60"))
            .body("x")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // Event ids aren't in the publish response body (spec §6 ack is just
    // `{message, statusCode}`), so recover them from the live fan-out instead:
    // subscribe with last_event_id=0 before publishing again isn't possible
    // here since publishes already happened, so resubscribe from zero and
    // read the three replayed ids directly to learn E1..E3.
    let mut warm = app
        .client
        .get(app.url("/bridge/events?client_id=aaaa&last_event_id=0"))
        .send()
        .await
        .unwrap();
    let collected = common::collect_sse_until(&mut warm, Duration::from_secs(2), |text| {
        text.matches("event: message").count() >= 3
    })
    .await;
    drop(warm);

    for id_line in collected.lines().filter(|l| l.starts_with("id:")) {
        ids.push(id_line.trim_start_matches("id:").trim().parse::<i64>().unwrap());
    }
    assert_eq!(ids.len(), 3);
    assert!(ids[0] < ids[1] && ids[1] < ids[2]);

    let mut resumed = app
        .client
        .get(app.url(&format!(
            "/bridge/events?client_id=aaaa&last_event_id={}",
            ids[0]
        )))
        .send()
        .await
        .unwrap();
    let collected = common::collect_sse_until(&mut resumed, Duration::from_secs(2), |text| {
        text.matches("event: message").count() >= 2
    })
    .await;

    let resumed_ids: Vec<i64> = collected
        .lines()
        .filter(|l| l.starts_with("id:"))
        .map(|l| l.trim_start_matches("id:").trim().parse().unwrap())
        .collect();
    assert_eq!(resumed_ids, vec![ids[1], ids[2]]);
}

#[tokio::test]
async fn malformed_last_event_id_is_rejected() {
    let app = common::spawn_app(|_| {}).await;
    let resp = app
        .client
        .get(app.url("/bridge/events?client_id=aaaa&last_event_id=not-a-number"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}
