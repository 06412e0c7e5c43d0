//! HTTP server
//!
//! One listener serves the interactions endpoint, the message relay and the
//! health probe.

mod http;
pub mod interactions;

pub use http::{route, run, AppState};
pub(crate) use http::{error_response, header_str, json_response};
