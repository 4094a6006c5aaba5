//! Fire-and-forget outbound side effects on Publish: webhook push, mirror
//! copy, analytics (spec §4.3 "Optional side effects"). None of these affect
//! the caller's response; failures are logged and swallowed, the same
//! contract the teacher's `control_api.rs` uses for its own best-effort
//! upstream HTTP calls (short `reqwest::Client` timeout, map errors to a
//! loggable string rather than propagating).

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

const SIDE_EFFECT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone)]
pub struct WebhookSink {
    client: reqwest::Client,
    webhook_url: Option<String>,
    copy_url: Option<String>,
    analytics_url: Option<String>,
}

impl WebhookSink {
    pub fn new(
        webhook_url: Option<String>,
        copy_url: Option<String>,
        analytics_url: Option<String>,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(SIDE_EFFECT_TIMEOUT)
            .build()
            .expect("reqwest client builds with a fixed timeout");
        Self {
            client,
            webhook_url,
            copy_url,
            analytics_url,
        }
    }

    /// Spawn detached fire-and-forget POSTs for every configured sink. Safe
    /// to call even with no sinks configured.
    pub fn notify(self: &Arc<Self>, topic: Option<String>, message_hash: String, body: Vec<u8>) {
        if let Some(url) = self.webhook_url.clone() {
            let sink = self.clone();
            let topic = topic.clone();
            let hash = message_hash.clone();
            tokio::spawn(async move {
                sink.post_fire_and_forget(
                    &url,
                    serde_json::json!({ "topic": topic, "message_hash": hash }),
                )
                .await;
            });
        }
        if let Some(url) = self.copy_url.clone() {
            let sink = self.clone();
            tokio::spawn(async move {
                sink.post_raw_fire_and_forget(&url, body).await;
            });
        }
        if let Some(url) = self.analytics_url.clone() {
            let sink = self.clone();
            tokio::spawn(async move {
                sink.post_fire_and_forget(
                    &url,
                    serde_json::json!({ "topic": topic, "message_hash": message_hash }),
                )
                .await;
            });
        }
    }

    async fn post_fire_and_forget(&self, url: &str, body: serde_json::Value) {
        if let Err(err) = self.client.post(url).json(&body).send().await {
            warn!(url, error = %err, "fire-and-forget POST failed");
        }
    }

    async fn post_raw_fire_and_forget(&self, url: &str, body: Vec<u8>) {
        if let Err(err) = self.client.post(url).body(body).send().await {
            warn!(url, error = %err, "fire-and-forget copy POST failed");
        }
    }
}
