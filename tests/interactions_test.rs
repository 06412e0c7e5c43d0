//! HTTP routing: signed interactions, relay, health

use bytes::Bytes;
use clap::Parser;
use ed25519_dalek::{Signer, SigningKey};
use http_body_util::BodyExt;
use hyper::header::{HeaderMap, HeaderValue};
use hyper::{Method, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;

use coffer::announcements::Broadcaster;
use coffer::commands::{CommandCooldowns, DispatchSettings, Dispatcher};
use coffer::config::Args;
use coffer::economy::{Economy, EconomyConfig};
use coffer::notify::WebhookFollowups;
use coffer::server::{route, AppState};
use coffer::store::{MemoryAnnouncementStore, MemoryProfileStore};

const OWNER: &str = "owner";
const CHANNEL: &str = "news";
const RELAY_TOKEN: &str = "relay-secret";

fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

fn state() -> Arc<AppState> {
    let args = Args::parse_from([
        "coffer",
        "--dev-mode",
        "--relay-token",
        RELAY_TOKEN,
        "--bot-owner-id",
        OWNER,
        "--announcement-channel-id",
        CHANNEL,
    ]);
    let economy = Arc::new(Economy::new(
        Arc::new(MemoryProfileStore::new()),
        EconomyConfig::default(),
    ));
    let broadcaster = Arc::new(Broadcaster::new(
        Arc::new(MemoryAnnouncementStore::new()),
        args.bot_owner_id.clone(),
        args.announcement_channel_id.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(
        economy,
        broadcaster,
        Arc::new(CommandCooldowns::new()),
        Arc::new(WebhookFollowups::new("http://127.0.0.1:9")),
        DispatchSettings::default(),
    ));
    Arc::new(AppState::new(
        args,
        dispatcher,
        Some(signing_key().verifying_key()),
    ))
}

fn signed_headers(body: &[u8]) -> HeaderMap {
    let timestamp = "1700000000";
    let mut message = timestamp.as_bytes().to_vec();
    message.extend_from_slice(body);
    let signature = signing_key().sign(&message);

    let mut headers = HeaderMap::new();
    headers.insert(
        "x-signature-ed25519",
        HeaderValue::from_str(&hex::encode(signature.to_bytes())).unwrap(),
    );
    headers.insert("x-signature-timestamp", HeaderValue::from_static(timestamp));
    headers
}

async fn send(
    state: &Arc<AppState>,
    method: Method,
    path: &str,
    headers: HeaderMap,
    body: Value,
) -> (StatusCode, Value) {
    let body = Bytes::from(body.to_string());
    let response = route(Arc::clone(state), &method, path, &headers, body).await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn interact(state: &Arc<AppState>, payload: Value) -> (StatusCode, Value) {
    let headers = signed_headers(payload.to_string().as_bytes());
    send(state, Method::POST, "/interactions", headers, payload).await
}

fn command(name: &str, user: &str) -> Value {
    json!({
        "type": 2,
        "guild_id": "guild-1",
        "member": { "user": { "id": user, "username": user } },
        "data": { "name": name }
    })
}

#[tokio::test]
async fn test_signed_ping_gets_pong() {
    let state = state();
    let (status, body) = interact(&state, json!({ "type": 1 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "type": 1 }));
}

#[tokio::test]
async fn test_bad_signature_rejected() {
    let state = state();
    let payload = json!({ "type": 1 });
    let mut headers = signed_headers(b"something else");
    headers.insert("x-signature-timestamp", HeaderValue::from_static("1700000000"));

    let (status, _) = send(&state, Method::POST, "/interactions", headers, payload).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &state,
        Method::POST,
        "/interactions",
        HeaderMap::new(),
        json!({ "type": 1 }),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_command_over_http() {
    let state = state();

    let (status, body) = interact(&state, command("register", "alice")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], 4);
    assert_eq!(body["data"]["embeds"][0]["title"], "🎉 Welcome to the Economy!");
    assert!(body["data"].get("flags").is_none());

    let (_, body) = interact(&state, command("register", "alice")).await;
    assert_eq!(body["data"]["embeds"][0]["title"], "❌ Already Registered");
    assert_eq!(body["data"]["flags"], 64);
}

#[tokio::test]
async fn test_direct_message_command_rejected() {
    let state = state();
    let payload = json!({
        "type": 2,
        "user": { "id": "alice", "username": "alice" },
        "data": { "name": "help" }
    });

    let (status, body) = interact(&state, payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["embeds"][0]["title"], "❌ Invalid Command");
    assert_eq!(body["data"]["flags"], 64);
}

#[tokio::test]
async fn test_relay_creates_announcement_from_operator_post() {
    let state = state();
    let mut headers = HeaderMap::new();
    headers.insert("x-relay-token", HeaderValue::from_static(RELAY_TOKEN));

    let post = json!({
        "channel_id": CHANNEL,
        "author_id": OWNER,
        "content": "Server maintenance at noon"
    });
    let (status, body) = send(&state, Method::POST, "/relay/messages", headers.clone(), post).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["created"], true);

    let chatter = json!({
        "channel_id": CHANNEL,
        "author_id": "someone",
        "content": "hi"
    });
    let (status, body) = send(&state, Method::POST, "/relay/messages", headers, chatter).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["created"], false);

    let recent = state.dispatcher.broadcaster().list_recent(10).await.unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].content, "Server maintenance at noon");
}

#[tokio::test]
async fn test_relay_requires_token() {
    let state = state();
    let post = json!({ "channel_id": CHANNEL, "author_id": OWNER, "content": "x" });
    let (status, _) = send(&state, Method::POST, "/relay/messages", HeaderMap::new(), post).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_reports_memory_storage() {
    let state = state();
    let (status, body) = send(&state, Method::GET, "/health", HeaderMap::new(), Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "online");
    assert_eq!(body["storage"], "memory");
    assert_eq!(body["mode"], "development");

    let (status, _) = send(&state, Method::GET, "/nope", HeaderMap::new(), Value::Null).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
