//! Announcement document schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::announcements::Announcement;
use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for announcements
pub const ANNOUNCEMENT_COLLECTION: &str = "announcements";

/// Announcement document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct AnnouncementDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Hyphenated UUID, the public identifier
    pub announcement_id: String,
    pub content: String,
    pub author_id: String,
    pub created_at: DateTime,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Users who have been shown this announcement
    #[serde(default)]
    pub delivered_to: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl From<&Announcement> for AnnouncementDoc {
    fn from(a: &Announcement) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            announcement_id: a.id.clone(),
            content: a.content.clone(),
            author_id: a.author_id.clone(),
            created_at: DateTime::from_chrono(a.created_at),
            is_active: a.is_active,
            delivered_to: a.delivered_to.clone(),
        }
    }
}

impl From<AnnouncementDoc> for Announcement {
    fn from(doc: AnnouncementDoc) -> Self {
        Self {
            id: doc.announcement_id,
            content: doc.content,
            author_id: doc.author_id,
            created_at: doc.created_at.to_chrono(),
            is_active: doc.is_active,
            delivered_to: doc.delivered_to,
        }
    }
}

impl IntoIndexes for AnnouncementDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "announcement_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("announcement_id_unique".to_string())
                        .build(),
                ),
            ),
            // Delivery lookup: newest active first
            (
                doc! { "is_active": 1, "created_at": -1 },
                Some(
                    IndexOptions::builder()
                        .name("active_created_at".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "delivered_to": 1 },
                Some(IndexOptions::builder().name("delivered_to".to_string()).build()),
            ),
        ]
    }
}

impl MutMetadata for AnnouncementDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
