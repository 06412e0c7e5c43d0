//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling.

use bytes::Bytes;
use ed25519_dalek::VerifyingKey;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use super::interactions::{
    message_response, pong, verify_signature, Interaction, APPLICATION_COMMAND, PING,
    SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
use crate::commands::reply::error_embed;
use crate::commands::{Dispatcher, Reply};
use crate::config::Args;
use crate::routes;
use crate::types::CofferError;

/// Largest request body accepted
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub dispatcher: Arc<Dispatcher>,
    /// Interaction signature key; `None` only in dev mode without PUBLIC_KEY
    pub verifying_key: Option<VerifyingKey>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, dispatcher: Arc<Dispatcher>, verifying_key: Option<VerifyingKey>) -> Self {
        Self {
            args,
            dispatcher,
            verifying_key,
            started_at: Instant::now(),
        }
    }
}

/// Accept connections until the listener fails
pub async fn run(state: Arc<AppState>) -> Result<(), CofferError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Coffer listening on {}", state.args.listen);

    if state.verifying_key.is_none() {
        warn!("No PUBLIC_KEY configured - interaction signatures are NOT verified");
    }
    if state.args.relay_token.is_none() {
        debug!("RELAY_TOKEN not set, /relay/messages disabled");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    let declared_len = req
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    if declared_len > MAX_BODY_BYTES as u64 {
        return Ok(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large",
        ));
    }

    let (parts, body) = req.into_parts();
    let body = match read_body(body).await {
        Ok(body) => body,
        Err(response) => return Ok(response),
    };

    Ok(route(state, &parts.method, &path, &parts.headers, body).await)
}

/// Collect a request body, refusing more than `MAX_BODY_BYTES` whatever
/// the framing
async fn read_body<B>(body: B) -> Result<Bytes, Response<Full<Bytes>>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => Err(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large",
        )),
        Err(e) => {
            debug!("Failed to read request body: {}", e);
            Err(error_response(
                StatusCode::BAD_REQUEST,
                "Failed to read request body",
            ))
        }
    }
}

/// Route a fully-read request
pub async fn route(
    state: Arc<AppState>,
    method: &Method,
    path: &str,
    headers: &HeaderMap,
    body: Bytes,
) -> Response<Full<Bytes>> {
    match (method, path) {
        (&Method::GET, "/health") | (&Method::GET, "/healthz") => routes::health_check(&state),
        (&Method::POST, "/interactions") => handle_interaction(&state, headers, &body).await,
        (&Method::POST, "/relay/messages") => routes::handle_relay(&state, headers, &body).await,
        _ => not_found_response(path),
    }
}

async fn handle_interaction(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Response<Full<Bytes>> {
    if let Some(key) = &state.verifying_key {
        let signature = header_str(headers, SIGNATURE_HEADER);
        let timestamp = header_str(headers, TIMESTAMP_HEADER);
        let verified = match (signature, timestamp) {
            (Some(signature), Some(timestamp)) => verify_signature(key, signature, timestamp, body),
            _ => Err(CofferError::Unauthorized("missing signature headers".into())),
        };
        if let Err(e) = verified {
            warn!("Rejected interaction: {}", e);
            return error_response(StatusCode::UNAUTHORIZED, "invalid request signature");
        }
    }

    let interaction: Interaction = match serde_json::from_slice(body) {
        Ok(interaction) => interaction,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, &format!("Invalid interaction: {}", e)),
    };

    match interaction.kind {
        PING => json_response(StatusCode::OK, &pong()),
        APPLICATION_COMMAND => {
            let reply = match interaction.into_invocation() {
                Ok(invocation) => state.dispatcher.dispatch(&invocation).await,
                Err(e) => Reply::ephemeral(error_embed("Invalid Command", e.to_string())),
            };
            json_response(StatusCode::OK, &message_response(&reply))
        }
        other => error_response(
            StatusCode::BAD_REQUEST,
            &format!("Unsupported interaction type {}", other),
        ),
    }
}

pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// JSON response with the given status
pub(crate) fn json_response(status: StatusCode, body: &serde_json::Value) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

pub(crate) fn error_response(status: StatusCode, message: &str) -> Response<Full<Bytes>> {
    json_response(
        status,
        &serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": message,
        }),
    )
}

fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({
            "error": "Not Found",
            "path": path,
        }),
    )
}
