//! In-memory stores for dev mode and tests

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;

use super::{AnnouncementStore, ProfileStore};
use crate::announcements::Announcement;
use crate::economy::leaderboard::rank_profiles;
use crate::economy::{LeaderboardKind, Profile};
use crate::types::{CofferError, Result};

/// Profiles held in a concurrent map keyed by (user, community)
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: DashMap<(String, String), Profile>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn key(user_id: &str, guild_id: &str) -> (String, String) {
    (user_id.to_string(), guild_id.to_string())
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, user_id: &str, guild_id: &str) -> Result<Option<Profile>> {
        Ok(self
            .profiles
            .get(&key(user_id, guild_id))
            .map(|p| p.value().clone()))
    }

    async fn insert(&self, profile: Profile) -> Result<()> {
        match self.profiles.entry(key(&profile.user_id, &profile.guild_id)) {
            Entry::Occupied(_) => Err(CofferError::AlreadyRegistered),
            Entry::Vacant(slot) => {
                slot.insert(profile);
                Ok(())
            }
        }
    }

    async fn replace_if_current(&self, profile: &Profile) -> Result<bool> {
        let Some(mut stored) = self
            .profiles
            .get_mut(&key(&profile.user_id, &profile.guild_id))
        else {
            return Ok(false);
        };

        if stored.revision != profile.revision {
            return Ok(false);
        }

        let mut next = profile.clone();
        next.revision += 1;
        *stored = next;
        Ok(true)
    }

    async fn list_guild(&self, guild_id: &str, kind: LeaderboardKind) -> Result<Vec<Profile>> {
        let members: Vec<Profile> = self
            .profiles
            .iter()
            .filter(|entry| entry.value().guild_id == guild_id)
            .map(|entry| entry.value().clone())
            .collect();

        // Order the same way the ranking does
        let order = rank_profiles(&members, kind);
        let mut sorted = Vec::with_capacity(members.len());
        for entry in order {
            if let Some(p) = members.iter().find(|p| p.user_id == entry.user_id) {
                sorted.push(p.clone());
            }
        }
        Ok(sorted)
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Announcements held in insertion order behind one lock, which makes
/// claim-and-record a single critical section
#[derive(Default)]
pub struct MemoryAnnouncementStore {
    announcements: Mutex<Vec<Announcement>>,
}

impl MemoryAnnouncementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AnnouncementStore for MemoryAnnouncementStore {
    async fn insert(&self, announcement: Announcement) -> Result<()> {
        let mut all = self.announcements.lock().await;
        if all.iter().any(|a| a.id == announcement.id) {
            return Err(CofferError::Duplicate(announcement.id));
        }
        all.push(announcement);
        Ok(())
    }

    async fn claim_latest_undelivered(&self, user_id: &str) -> Result<Option<Announcement>> {
        let mut all = self.announcements.lock().await;

        // Later insertion wins among equal timestamps
        let newest = all
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_active && !a.was_delivered_to(user_id))
            .max_by_key(|(i, a)| (a.created_at, *i))
            .map(|(i, _)| i);

        Ok(newest.map(|i| {
            let announcement = &mut all[i];
            announcement.delivered_to.push(user_id.to_string());
            announcement.clone()
        }))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Announcement>> {
        let all = self.announcements.lock().await;
        let mut recent: Vec<(usize, &Announcement)> = all.iter().enumerate().collect();
        recent.sort_by(|(ia, a), (ib, b)| b.created_at.cmp(&a.created_at).then(ib.cmp(ia)));
        Ok(recent
            .into_iter()
            .take(limit)
            .map(|(_, a)| a.clone())
            .collect())
    }

    async fn find_by_prefix(&self, prefix: &str, limit: usize) -> Result<Vec<Announcement>> {
        let needle = prefix.to_ascii_lowercase();
        let all = self.announcements.lock().await;
        Ok(all
            .iter()
            .filter(|a| a.id.to_ascii_lowercase().starts_with(&needle))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn set_active(&self, id: &str, active: bool) -> Result<bool> {
        let mut all = self.announcements.lock().await;
        match all.iter_mut().find(|a| a.id == id) {
            Some(announcement) => {
                announcement.is_active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::update_profile;
    use chrono::{Duration, Utc};
    use std::sync::Arc;

    fn profile(user_id: &str) -> Profile {
        Profile::new(user_id, "g1", user_id, 1000, Utc::now())
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_key() {
        let store = MemoryProfileStore::new();
        store.insert(profile("u1")).await.unwrap();
        let err = store.insert(profile("u1")).await.unwrap_err();
        assert!(matches!(err, CofferError::AlreadyRegistered));

        // Same user in another community is a separate profile
        let mut other = profile("u1");
        other.guild_id = "g2".into();
        store.insert(other).await.unwrap();
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_stale_revision_is_rejected() {
        let store = MemoryProfileStore::new();
        store.insert(profile("u1")).await.unwrap();

        let mut first = store.get("u1", "g1").await.unwrap().unwrap();
        let mut second = first.clone();

        first.balance += 10;
        assert!(store.replace_if_current(&first).await.unwrap());

        second.balance += 20;
        assert!(!store.replace_if_current(&second).await.unwrap());

        let stored = store.get("u1", "g1").await.unwrap().unwrap();
        assert_eq!(stored.balance, 1010);
        assert_eq!(stored.revision, 1);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let store = Arc::new(MemoryProfileStore::new());
        store.insert(profile("u1")).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                update_profile(store.as_ref(), "u1", "g1", |p| {
                    p.commands_used += 1;
                    Ok(())
                })
                .await
            }));
        }
        let mut succeeded = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }

        let stored = store.get("u1", "g1").await.unwrap().unwrap();
        assert_eq!(stored.commands_used, succeeded);
        assert_eq!(stored.revision, succeeded);
    }

    #[tokio::test]
    async fn test_update_missing_profile() {
        let store = MemoryProfileStore::new();
        let err = update_profile(&store, "ghost", "g1", |_| Ok(()))
            .await
            .unwrap_err();
        assert!(matches!(err, CofferError::NotRegistered));
    }

    #[tokio::test]
    async fn test_list_guild_scoped_and_sorted() {
        let store = MemoryProfileStore::new();
        for (id, balance) in [("a", 10), ("b", 30), ("c", 20)] {
            let mut p = profile(id);
            p.balance = balance;
            store.insert(p).await.unwrap();
        }
        let mut outsider = profile("z");
        outsider.guild_id = "g2".into();
        store.insert(outsider).await.unwrap();

        let listed = store.list_guild("g1", LeaderboardKind::Balance).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|p| p.user_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_claim_newest_first_and_once() {
        let store = MemoryAnnouncementStore::new();
        let now = Utc::now();
        let older = Announcement::new("older", "owner", now - Duration::minutes(5));
        let newer = Announcement::new("newer", "owner", now);
        store.insert(older).await.unwrap();
        store.insert(newer).await.unwrap();

        let first = store.claim_latest_undelivered("u1").await.unwrap().unwrap();
        assert_eq!(first.content, "newer");
        let second = store.claim_latest_undelivered("u1").await.unwrap().unwrap();
        assert_eq!(second.content, "older");
        assert!(store.claim_latest_undelivered("u1").await.unwrap().is_none());
    }
}
