//! Operator announcements
//!
//! An announcement is created active, can be toggled between active and
//! disabled, and is shown to each user at most once. The delivered set
//! only ever grows; toggling never replays an announcement to someone who
//! already saw it.

mod broadcaster;

pub use broadcaster::{AnnouncementStats, Broadcaster, MIN_PREFIX_LEN};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the short id shown in listings
pub const SHORT_ID_LEN: usize = 8;

/// An operator-authored message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Announcement {
    /// Hyphenated v4 UUID
    pub id: String,
    pub content: String,
    pub author_id: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    pub delivered_to: Vec<String>,
}

impl Announcement {
    /// New active announcement with a fresh id
    pub fn new(content: impl Into<String>, author_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            author_id: author_id.into(),
            created_at: now,
            is_active: true,
            delivered_to: Vec::new(),
        }
    }

    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    pub fn was_delivered_to(&self, user_id: &str) -> bool {
        self.delivered_to.iter().any(|u| u == user_id)
    }

    pub fn delivered_count(&self) -> usize {
        self.delivered_to.len()
    }

    /// First `max_chars` characters of the content, with an ellipsis if cut
    pub fn preview(&self, max_chars: usize) -> String {
        let mut chars = self.content.chars();
        let head: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}...", head)
        } else {
            head
        }
    }
}

/// Leading characters of an announcement id
pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_announcement_is_active_and_undelivered() {
        let a = Announcement::new("Server maintenance at noon", "owner", Utc::now());
        assert!(a.is_active);
        assert!(a.delivered_to.is_empty());
        assert_eq!(a.id.len(), 36);
        assert_eq!(a.short_id().len(), SHORT_ID_LEN);
        assert!(a.id.starts_with(a.short_id()));
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let mut a = Announcement::new("short", "owner", Utc::now());
        assert_eq!(a.preview(50), "short");

        a.content = "é".repeat(60);
        let preview = a.preview(50);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 53);
    }

    #[test]
    fn test_short_id_of_short_string() {
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("0123456789"), "01234567");
    }
}
