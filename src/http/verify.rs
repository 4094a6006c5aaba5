//! `GET /bridge/verify` — the Verify path (spec §4.5).

use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::error::{bad_request, ApiError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub client_id: Option<String>,
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

pub async fn verify(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> Result<impl IntoResponse, ApiError> {
    let client_id = params.client_id.filter(|s| !s.is_empty()).ok_or_else(|| {
        state.metrics.inc_bad_requests();
        bad_request("missing client_id")
    })?;
    let url = params.url.filter(|s| !s.is_empty()).ok_or_else(|| {
        state.metrics.inc_bad_requests();
        bad_request("missing url")
    })?;
    // `type` defaults to "connect" and is accepted for forward compatibility
    // with the richer classification spec §9 documents as an optional
    // extension; this bridge only implements the two-state contract, so the
    // value itself doesn't change behavior today.
    let _kind = params.kind.unwrap_or_else(|| "connect".to_owned());

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let response = state
        .dispatch
        .verify(&client_id, &url, addr.ip().to_string(), user_agent);
    Ok(Json(response))
}
