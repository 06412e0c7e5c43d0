//! MongoDB-backed stores

use async_trait::async_trait;
use bson::{doc, Bson, DateTime};
use chrono::Utc;
use mongodb::options::FindOptions;

use super::{AnnouncementStore, ProfileStore};
use crate::announcements::Announcement;
use crate::db::schemas::{AnnouncementDoc, ProfileDoc, ANNOUNCEMENT_COLLECTION, PROFILE_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::economy::{LeaderboardKind, Profile};
use crate::types::{CofferError, Result};

fn opt_datetime(value: Option<chrono::DateTime<Utc>>) -> Bson {
    value
        .map(|dt| Bson::DateTime(DateTime::from_chrono(dt)))
        .unwrap_or(Bson::Null)
}

/// Escape everything but ASCII alphanumerics for a `$regex` literal
fn regex_literal(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 2);
    for c in input.chars() {
        if !c.is_ascii_alphanumeric() {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub struct MongoProfileStore {
    collection: MongoCollection<ProfileDoc>,
}

impl MongoProfileStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(PROFILE_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl ProfileStore for MongoProfileStore {
    async fn get(&self, user_id: &str, guild_id: &str) -> Result<Option<Profile>> {
        let found = self
            .collection
            .find_one(doc! { "user_id": user_id, "guild_id": guild_id })
            .await?;
        Ok(found.map(Profile::from))
    }

    async fn insert(&self, profile: Profile) -> Result<()> {
        match self.collection.insert_one(ProfileDoc::from(&profile)).await {
            Err(CofferError::Duplicate(_)) => Err(CofferError::AlreadyRegistered),
            other => other,
        }
    }

    async fn replace_if_current(&self, profile: &Profile) -> Result<bool> {
        let filter = doc! {
            "user_id": profile.user_id.as_str(),
            "guild_id": profile.guild_id.as_str(),
            "revision": profile.revision,
        };
        let update = doc! {
            "$set": {
                "username": profile.username.as_str(),
                "balance": profile.balance,
                "bank": profile.bank,
                "level": profile.level,
                "xp": profile.xp,
                "total_xp": profile.total_xp,
                "commands_used": profile.commands_used,
                "inventory": bson::to_bson(&profile.inventory)?,
                "last_daily": opt_datetime(profile.last_daily),
                "last_work": opt_datetime(profile.last_work),
                "last_active": DateTime::from_chrono(profile.last_active),
                "metadata.updated_at": DateTime::now(),
            },
            "$inc": { "revision": 1_i64 },
        };

        let result = self.collection.update_one(filter, update).await?;
        Ok(result.matched_count == 1)
    }

    async fn list_guild(&self, guild_id: &str, kind: LeaderboardKind) -> Result<Vec<Profile>> {
        let field = kind.sort_field();
        let options = FindOptions::builder()
            .sort(doc! { field: -1, "user_id": 1 })
            .build();
        let docs = self
            .collection
            .find_many(doc! { "guild_id": guild_id }, Some(options))
            .await?;
        Ok(docs.into_iter().map(Profile::from).collect())
    }

    fn backend(&self) -> &'static str {
        "mongodb"
    }
}

pub struct MongoAnnouncementStore {
    collection: MongoCollection<AnnouncementDoc>,
}

impl MongoAnnouncementStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(ANNOUNCEMENT_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl AnnouncementStore for MongoAnnouncementStore {
    async fn insert(&self, announcement: Announcement) -> Result<()> {
        self.collection
            .insert_one(AnnouncementDoc::from(&announcement))
            .await
    }

    async fn claim_latest_undelivered(&self, user_id: &str) -> Result<Option<Announcement>> {
        let claimed = self
            .collection
            .find_one_and_update(
                doc! { "is_active": true, "delivered_to": { "$ne": user_id } },
                doc! {
                    "$addToSet": { "delivered_to": user_id },
                    "$set": { "metadata.updated_at": DateTime::now() },
                },
                doc! { "created_at": -1 },
            )
            .await?;
        Ok(claimed.map(Announcement::from))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Announcement>> {
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();
        let docs = self.collection.find_many(doc! {}, Some(options)).await?;
        Ok(docs.into_iter().map(Announcement::from).collect())
    }

    async fn find_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<Announcement>> {
        let pattern = format!("^{}", regex_literal(prefix));
        let options = FindOptions::builder()
            .sort(doc! { "created_at": -1 })
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();
        let docs = self
            .collection
            .find_many(
                doc! { "announcement_id": { "$regex": pattern, "$options": "i" } },
                Some(options),
            )
            .await?;
        Ok(docs.into_iter().map(Announcement::from).collect())
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "announcement_id": id },
                doc! { "$set": { "is_active": active, "metadata.updated_at": DateTime::now() } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}
