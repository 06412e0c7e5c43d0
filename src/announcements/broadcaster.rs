//! Announcement lifecycle and delivery

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

use super::{short_id, Announcement};
use crate::store::AnnouncementStore;
use crate::types::{CofferError, Result};

/// Shortest id prefix accepted by the management commands
pub const MIN_PREFIX_LEN: usize = 4;

/// How many candidates a prefix lookup fetches when reporting ambiguity
const PREFIX_CANDIDATES: usize = 5;

/// Delivery figures for one announcement
#[derive(Debug, Clone)]
pub struct AnnouncementStats {
    pub announcement: Announcement,
    pub delivered_count: usize,
    pub age: chrono::Duration,
}

/// Creates, toggles and delivers announcements on behalf of the operator
pub struct Broadcaster {
    store: Arc<dyn AnnouncementStore>,
    operator_id: Option<String>,
    source_channel_id: Option<String>,
}

impl Broadcaster {
    pub fn new(
        store: Arc<dyn AnnouncementStore>,
        operator_id: Option<String>,
        source_channel_id: Option<String>,
    ) -> Self {
        Self {
            store,
            operator_id,
            source_channel_id,
        }
    }

    /// With no operator configured nobody is the operator
    pub fn is_operator(&self, user_id: &str) -> bool {
        self.operator_id.as_deref() == Some(user_id)
    }

    pub fn require_operator(&self, user_id: &str) -> Result<()> {
        if self.is_operator(user_id) {
            Ok(())
        } else {
            Err(CofferError::OperatorOnly)
        }
    }

    /// Store a new active announcement
    pub async fn create(&self, author_id: &str, content: &str, now: DateTime<Utc>) -> Result<Announcement> {
        self.require_operator(author_id)?;

        if content.trim().is_empty() {
            return Err(CofferError::BadRequest("Announcement message is empty".into()));
        }

        let announcement = Announcement::new(content, author_id, now);
        self.store.insert(announcement.clone()).await?;

        info!(
            announcement_id = %announcement.id,
            author_id = %author_id,
            "Announcement created"
        );
        Ok(announcement)
    }

    /// Claim the newest active announcement `user_id` has not seen yet.
    ///
    /// The claim is recorded before the caller shows it, so at most one
    /// delivery happens per user even when checks race.
    pub async fn deliver_next(&self, user_id: &str) -> Result<Option<Announcement>> {
        let claimed = self.store.claim_latest_undelivered(user_id).await?;
        if let Some(announcement) = &claimed {
            debug!(
                announcement_id = %announcement.id,
                user_id = %user_id,
                "Announcement claimed for delivery"
            );
        }
        Ok(claimed)
    }

    pub async fn list_recent(&self, limit: usize) -> Result<Vec<Announcement>> {
        self.store.list_recent(limit).await
    }

    /// Resolve an id prefix to exactly one announcement
    pub async fn resolve(&self, prefix: &str) -> Result<Announcement> {
        let prefix = prefix.trim();
        if prefix.chars().count() < MIN_PREFIX_LEN {
            return Err(CofferError::PrefixTooShort { min: MIN_PREFIX_LEN });
        }
        if !prefix.chars().all(|c| c.is_ascii_hexdigit() || c == '-') {
            return Err(CofferError::AnnouncementNotFound(prefix.to_string()));
        }

        let mut matches = self.store.find_by_prefix(prefix, PREFIX_CANDIDATES).await?;
        match matches.len() {
            0 => Err(CofferError::AnnouncementNotFound(prefix.to_string())),
            1 => Ok(matches.remove(0)),
            _ => Err(CofferError::AmbiguousPrefix {
                prefix: prefix.to_string(),
                matches: matches.iter().map(|a| short_id(&a.id).to_string()).collect(),
            }),
        }
    }

    pub async fn enable(&self, prefix: &str) -> Result<Announcement> {
        self.set_active(prefix, true).await
    }

    pub async fn disable(&self, prefix: &str) -> Result<Announcement> {
        self.set_active(prefix, false).await
    }

    async fn set_active(&self, prefix: &str, active: bool) -> Result<Announcement> {
        let mut announcement = self.resolve(prefix).await?;

        if announcement.is_active == active {
            return Err(CofferError::AlreadyInState(format!(
                "Announcement `{}` is already {}",
                announcement.short_id(),
                if active { "active" } else { "disabled" }
            )));
        }

        if !self.store.set_active(&announcement.id, active).await? {
            return Err(CofferError::AnnouncementNotFound(prefix.to_string()));
        }
        announcement.is_active = active;

        info!(
            announcement_id = %announcement.id,
            active,
            "Announcement state changed"
        );
        Ok(announcement)
    }

    pub async fn stats(&self, prefix: &str, now: DateTime<Utc>) -> Result<AnnouncementStats> {
        let announcement = self.resolve(prefix).await?;
        Ok(AnnouncementStats {
            delivered_count: announcement.delivered_count(),
            age: now - announcement.created_at,
            announcement,
        })
    }

    /// Turn an operator post in the source channel into an announcement.
    ///
    /// Posts from bots, from other channels, from anyone but the operator,
    /// or with blank content are ignored.
    pub async fn ingest_channel_message(
        &self,
        channel_id: &str,
        author_id: &str,
        author_is_bot: bool,
        content: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Announcement>> {
        if author_is_bot
            || self.source_channel_id.as_deref() != Some(channel_id)
            || !self.is_operator(author_id)
            || content.trim().is_empty()
        {
            debug!(channel_id = %channel_id, author_id = %author_id, "Ignoring relayed message");
            return Ok(None);
        }

        self.create(author_id, content, now).await.map(Some)
    }
}
