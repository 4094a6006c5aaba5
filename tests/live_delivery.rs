//! S1 — a subscriber connected before Publish receives the message live
//! (spec §8 S1, property 1).

mod common;

use std::time::Duration;

#[tokio::test]
async fn subscriber_receives_live_publish_as_one_sse_frame() {
    let app = common::spawn_app(|_| {}).await;

    let mut sub = app
        .client
        .get(app.url("/bridge/events?client_id=aaaa"))
        .send()
        .await
        .unwrap();
    assert_eq!(sub.status(), 200);

    // give the subscribe handshake a moment to attach before publishing
    tokio::time::sleep(Duration::from_millis(50)).await;

    let publish = app
        .client
        .post(app.url("/bridge/message?client_id=bbbb&to=aaaa&ttl=60"))
        .body("hello")
        .send()
        .await
        .unwrap();
    assert_eq!(publish.status(), 200);
    let ack: serde_json::Value = publish.json().await.unwrap();
    assert_eq!(ack["statusCode"], 200);

    let collected = common::collect_sse_until(&mut sub, Duration::from_secs(3), |text| {
        text.contains("event: message") && text.contains("\nid:")
    })
    .await;

    assert!(
        collected.contains("event: message"),
        "expected a message frame, got:\n{collected}"
    );
    let data_line = collected
        .lines()
        .find(|l| l.starts_with("data:"))
        .unwrap_or_else(|| panic!("no data: line in:\n{collected}"));
    let json_str = data_line.trim_start_matches("data:").trim();
    let envelope: serde_json::Value = serde_json::from_str(json_str).unwrap();
    assert_eq!(envelope["from"], "bbbb");
    assert_eq!(
        base64_decode(envelope["message"].as_str().unwrap()),
        b"hello"
    );

    let id_line = collected.lines().find(|l| l.starts_with("id:")).unwrap();
    let event_id: i64 = id_line.trim_start_matches("id:").trim().parse().unwrap();
    assert!(event_id > 0);
}

fn base64_decode(s: &str) -> Vec<u8> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.decode(s).unwrap()
}
