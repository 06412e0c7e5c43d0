//! Coffer - per-server economy bot
//!
//! Coffer answers chat platform slash commands delivered to an HTTP
//! interactions endpoint. Each member of a server keeps a wallet, an
//! inventory and an XP level scoped to that server.
//!
//! ## Pieces
//!
//! - **Economy**: registration, daily and work rewards, XP progression, leaderboards
//! - **Announcements**: operator broadcasts delivered once per user as follow-ups
//! - **Commands**: command table, access checks, per-command cooldowns, embed replies
//! - **Store**: MongoDB persistence with an in-memory fallback for dev mode
//! - **Server**: signed interactions endpoint, message relay, health probe

pub mod announcements;
pub mod commands;
pub mod config;
pub mod db;
pub mod economy;
pub mod notify;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{CofferError, Result};
