//! Profile document schema

use bson::{doc, oid::ObjectId, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;
use crate::economy::{InventoryItem, Profile};

/// Collection name for profiles
pub const PROFILE_COLLECTION: &str = "profiles";

/// One user's economy profile in one community
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProfileDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    pub user_id: String,
    pub guild_id: String,
    pub username: String,
    pub balance: i64,
    #[serde(default)]
    pub bank: i64,
    pub level: i64,
    pub xp: i64,
    pub total_xp: i64,
    #[serde(default)]
    pub commands_used: i64,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub last_daily: Option<DateTime>,
    #[serde(default)]
    pub last_work: Option<DateTime>,
    pub registered_at: DateTime,
    pub last_active: DateTime,

    /// Bumped on every write; updates are conditioned on it
    #[serde(default)]
    pub revision: i64,
}

impl From<&Profile> for ProfileDoc {
    fn from(profile: &Profile) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            user_id: profile.user_id.clone(),
            guild_id: profile.guild_id.clone(),
            username: profile.username.clone(),
            balance: profile.balance,
            bank: profile.bank,
            level: profile.level,
            xp: profile.xp,
            total_xp: profile.total_xp,
            commands_used: profile.commands_used,
            inventory: profile.inventory.clone(),
            last_daily: profile.last_daily.map(DateTime::from_chrono),
            last_work: profile.last_work.map(DateTime::from_chrono),
            registered_at: DateTime::from_chrono(profile.registered_at),
            last_active: DateTime::from_chrono(profile.last_active),
            revision: profile.revision,
        }
    }
}

impl From<ProfileDoc> for Profile {
    fn from(doc: ProfileDoc) -> Self {
        Self {
            user_id: doc.user_id,
            guild_id: doc.guild_id,
            username: doc.username,
            balance: doc.balance,
            bank: doc.bank,
            level: doc.level,
            xp: doc.xp,
            total_xp: doc.total_xp,
            commands_used: doc.commands_used,
            inventory: doc.inventory,
            last_daily: doc.last_daily.map(DateTime::to_chrono),
            last_work: doc.last_work.map(DateTime::to_chrono),
            registered_at: doc.registered_at.to_chrono(),
            last_active: doc.last_active.to_chrono(),
            revision: doc.revision,
        }
    }
}

impl IntoIndexes for ProfileDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // One profile per user per community
            (
                doc! { "user_id": 1, "guild_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("user_guild_unique".to_string())
                        .build(),
                ),
            ),
            // Leaderboard sorts
            (
                doc! { "guild_id": 1, "balance": -1 },
                Some(IndexOptions::builder().name("guild_balance".to_string()).build()),
            ),
            (
                doc! { "guild_id": 1, "total_xp": -1 },
                Some(IndexOptions::builder().name("guild_total_xp".to_string()).build()),
            ),
            (
                doc! { "guild_id": 1, "commands_used": -1 },
                Some(
                    IndexOptions::builder()
                        .name("guild_commands_used".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for ProfileDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::Rarity;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_document_preserves_profile() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let mut profile = Profile::new("u1", "g1", "alice", 1000, now);
        profile.last_daily = Some(now);
        profile.revision = 3;
        profile.inventory.push(InventoryItem {
            item_id: "lucky_coin".into(),
            name: "Lucky Coin".into(),
            quantity: 2,
            rarity: Rarity::Uncommon,
            value: 100,
        });

        let doc = ProfileDoc::from(&profile);
        assert!(doc.last_work.is_none());
        assert_eq!(Profile::from(doc), profile);
    }

    #[test]
    fn test_inventory_encodes_lowercase_rarity() {
        let profile = Profile::new("u1", "g1", "alice", 1000, Utc::now());
        let mut doc = ProfileDoc::from(&profile);
        doc.inventory.push(InventoryItem {
            item_id: "golden_wrench".into(),
            name: "Golden Wrench".into(),
            quantity: 1,
            rarity: Rarity::Rare,
            value: 250,
        });
        let encoded = bson::to_document(&doc).unwrap();
        let inventory = encoded.get_array("inventory").unwrap();
        let item = inventory[0].as_document().unwrap();
        assert_eq!(item.get_str("rarity").unwrap(), "rare");
    }
}
