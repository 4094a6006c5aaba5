//! `POST /bridge/message` — the Publish path (spec §4.3, §6). Query-string
//! parsing here; all validation and envelope construction is delegated to
//! [`crate::core::dispatch::Dispatch::publish`].

use axum::extract::{ConnectInfo, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Json};
use serde::Deserialize;
use std::net::SocketAddr;

use crate::core::dispatch::PublishRequest;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PublishParams {
    pub client_id: Option<String>,
    pub to: Option<String>,
    pub ttl: Option<String>,
    pub topic: Option<String>,
    pub trace_id: Option<String>,
    pub no_request_source: Option<bool>,
}

pub async fn publish(
    State(state): State<AppState>,
    Query(params): Query<PublishParams>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let origin = headers
        .get(header::ORIGIN)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let req = PublishRequest {
        client_id: params.client_id,
        to: params.to,
        ttl_raw: params.ttl,
        topic: params.topic,
        trace_id_raw: params.trace_id,
        no_request_source: params.no_request_source.unwrap_or(false),
        origin,
        ip: addr.ip().to_string(),
        user_agent,
        body: body.to_vec(),
    };

    let ack = state.dispatch.publish(req).await?;
    Ok(Json(ack))
}
