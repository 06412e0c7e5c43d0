//! Message relay endpoint
//!
//! The bot only speaks the HTTP interactions protocol, so channel messages
//! reach it through a relay that POSTs them to `/relay/messages`. Operator
//! posts in the announcement channel become announcements.
//!
//! Requests must carry the shared secret in `X-Relay-Token`. Without a
//! configured RELAY_TOKEN the endpoint does not exist.

use bytes::Bytes;
use chrono::Utc;
use http_body_util::Full;
use hyper::header::HeaderMap;
use hyper::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::server::{error_response, header_str, json_response, AppState};

pub const RELAY_TOKEN_HEADER: &str = "x-relay-token";

/// A channel message forwarded by the relay
#[derive(Debug, Deserialize)]
pub struct RelayMessage {
    pub channel_id: String,
    pub author_id: String,
    #[serde(default)]
    pub author_bot: bool,
    pub content: String,
}

/// POST /relay/messages
pub async fn handle_relay(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Response<Full<Bytes>> {
    let Some(expected) = state.args.relay_token.as_deref() else {
        return error_response(StatusCode::NOT_FOUND, "relay disabled");
    };

    if header_str(headers, RELAY_TOKEN_HEADER) != Some(expected) {
        warn!("Relay request with invalid token");
        return error_response(StatusCode::UNAUTHORIZED, "invalid relay token");
    }

    let message: RelayMessage = match serde_json::from_slice(body) {
        Ok(message) => message,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &format!("Invalid message: {}", e)),
    };

    let result = state
        .dispatcher
        .broadcaster()
        .ingest_channel_message(
            &message.channel_id,
            &message.author_id,
            message.author_bot,
            &message.content,
            Utc::now(),
        )
        .await;

    match result {
        Ok(Some(announcement)) => {
            info!(announcement_id = %announcement.id, "Announcement created from relayed message");
            json_response(
                StatusCode::CREATED,
                &json!({
                    "created": true,
                    "announcement_id": announcement.id,
                }),
            )
        }
        Ok(None) => json_response(StatusCode::ACCEPTED, &json!({ "created": false })),
        Err(e) => {
            if !e.is_user_facing() {
                warn!("Relay ingest failed: {}", e);
            }
            error_response(e.status_code(), &e.to_string())
        }
    }
}
