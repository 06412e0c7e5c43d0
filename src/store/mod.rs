//! Persistence contracts
//!
//! The engine talks to storage only through [`ProfileStore`] and
//! [`AnnouncementStore`], so the MongoDB backend can be swapped for the
//! in-memory one in dev mode and in tests.

mod memory;
mod mongo;

pub use memory::{MemoryAnnouncementStore, MemoryProfileStore};
pub use mongo::{MongoAnnouncementStore, MongoProfileStore};

use async_trait::async_trait;
use tracing::debug;

use crate::announcements::Announcement;
use crate::economy::{LeaderboardKind, Profile};
use crate::types::{CofferError, Result};

/// Read-apply-write attempts before giving up on a contended profile
pub const MAX_UPDATE_ATTEMPTS: usize = 5;

/// Storage for economy profiles keyed by (user, community)
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a profile
    async fn get(&self, user_id: &str, guild_id: &str) -> Result<Option<Profile>>;

    /// Insert a new profile; fails with `AlreadyRegistered` if the key exists
    async fn insert(&self, profile: Profile) -> Result<()>;

    /// Store `profile` if the stored revision still equals `profile.revision`.
    ///
    /// The stored copy gets `revision + 1`. Returns false when another
    /// writer got there first (or the profile vanished).
    async fn replace_if_current(&self, profile: &Profile) -> Result<bool>;

    /// Every profile of a community, ordered by `kind` descending
    async fn list_guild(&self, guild_id: &str, kind: LeaderboardKind) -> Result<Vec<Profile>>;

    /// Backend name for health reporting
    fn backend(&self) -> &'static str;
}

/// Storage for operator announcements
#[async_trait]
pub trait AnnouncementStore: Send + Sync {
    async fn insert(&self, announcement: Announcement) -> Result<()>;

    /// Atomically pick the newest active announcement `user_id` has not
    /// received and record the delivery. Returns the updated announcement.
    async fn claim_latest_undelivered(&self, user_id: &str) -> Result<Option<Announcement>>;

    /// Most recent announcements first, regardless of state
    async fn list_recent(&self, limit: usize) -> Result<Vec<Announcement>>;

    /// Announcements whose id starts with `prefix` (case-insensitive),
    /// at most `limit` of them
    async fn find_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<Announcement>>;

    /// Set the active flag. Returns false if no announcement has that id.
    async fn set_active(&self, id: &str, active: bool) -> Result<bool>;
}

/// Apply `apply` to a stored profile under optimistic concurrency.
///
/// The closure runs against a fresh read on every attempt, so checks it
/// performs (cooldowns, balances) are re-evaluated after a lost race.
/// Errors returned by the closure abort without writing.
pub async fn update_profile<F, T>(
    store: &dyn ProfileStore,
    user_id: &str,
    guild_id: &str,
    mut apply: F,
) -> Result<(Profile, T)>
where
    F: FnMut(&mut Profile) -> Result<T> + Send,
    T: Send,
{
    for attempt in 1..=MAX_UPDATE_ATTEMPTS {
        let mut profile = store
            .get(user_id, guild_id)
            .await?
            .ok_or(CofferError::NotRegistered)?;

        let outcome = apply(&mut profile)?;

        if store.replace_if_current(&profile).await? {
            profile.revision += 1;
            return Ok((profile, outcome));
        }

        debug!(
            user_id = %user_id,
            guild_id = %guild_id,
            attempt,
            "Profile changed underneath update, retrying"
        );
    }

    Err(CofferError::Conflict(format!(
        "profile {}/{} still contended after {} attempts",
        guild_id, user_id, MAX_UPDATE_ATTEMPTS
    )))
}
