// bridge-protocol: wire types shared between the relay core and its HTTP
// transport layer.
//
// The bridge never parses `payload`/`message` bytes beyond the optional
// `request_source` injection described in the dispatch facade; everything
// here is a thin, direct mirror of the wire contract, not a business-logic
// type.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The unit delivered to subscribers: one accepted `Publish`, fanned out to
/// every session subscribed to `to` and (independently) persisted to the
/// store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    /// Process-wide strictly increasing id, assigned at `Publish` time.
    pub event_id: i64,
    /// Recipient client_id.
    pub to: String,
    /// Opaque serialized envelope bytes (UTF-8 JSON in practice).
    pub payload: Vec<u8>,
}

impl SseMessage {
    pub fn new(event_id: i64, to: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            event_id,
            to: to.into(),
            payload,
        }
    }
}

/// The JSON envelope carried as `SseMessage::payload`.
///
/// `message` is the producer's opaque body, forwarded byte-for-byte as a
/// base64 string; the bridge never decodes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub from: String,
    pub message: String,
    pub trace_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_source: Option<String>,
}

/// Success body for `POST /bridge/message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishAck {
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

impl PublishAck {
    pub fn ok() -> Self {
        Self {
            message: "OK".to_owned(),
            status_code: 200,
        }
    }
}

/// Frozen error envelope for all non-2xx bridge responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpErrorEnvelope {
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

/// `GET /bridge/verify` response. Only the two-state contract from spec §4.5
/// is implemented; see SPEC_FULL.md's Open Question resolution for why the
/// richer `danger`/`warning` classification is left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyStatus {
    Ok,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub status: VerifyStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_ack_serializes_camel_case_status_code() {
        let json = serde_json::to_string(&PublishAck::ok()).unwrap();
        assert_eq!(json, r#"{"message":"OK","statusCode":200}"#);
    }

    #[test]
    fn verify_response_serializes_snake_case_status() {
        let json = serde_json::to_string(&VerifyResponse {
            status: VerifyStatus::Unknown,
        })
        .unwrap();
        assert_eq!(json, r#"{"status":"unknown"}"#);
    }

    #[test]
    fn envelope_omits_request_source_when_absent() {
        let env = Envelope {
            from: "aaaa".to_owned(),
            message: "aGVsbG8=".to_owned(),
            trace_id: Uuid::nil(),
            request_source: None,
        };
        let json = serde_json::to_string(&env).unwrap();
        assert!(!json.contains("request_source"));
    }
}
