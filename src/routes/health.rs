//! Health check endpoint
//!
//! `/health` and `/healthz` report liveness plus build info and the active
//! storage backend. Storage falling back to memory is visible here.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub git_commit: &'static str,
    pub build_timestamp: &'static str,
    /// Seconds since startup
    pub uptime: u64,
    /// "mongodb" or "memory"
    pub storage: &'static str,
    pub mode: &'static str,
    pub timestamp: String,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        status: "online",
        version: env!("CARGO_PKG_VERSION"),
        git_commit: env!("GIT_COMMIT_SHORT"),
        build_timestamp: env!("BUILD_TIMESTAMP"),
        uptime: state.started_at.elapsed().as_secs(),
        storage: state.dispatcher.economy().store_backend(),
        mode: if state.args.dev_mode {
            "development"
        } else {
            "production"
        },
        timestamp: chrono::Utc::now().to_rfc3339(),
    }
}

/// Liveness probe
pub fn health_check(state: &AppState) -> Response<Full<Bytes>> {
    let health = build_health_response(state);
    match serde_json::to_value(&health) {
        Ok(body) => crate::server::json_response(StatusCode::OK, &body),
        Err(e) => crate::server::error_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string()),
    }
}
