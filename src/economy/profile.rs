//! Profile and inventory records
//!
//! One profile exists per (user, community). Profiles are created on
//! registration and never deleted by normal flow.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Item rarity, ordered from most common to rarest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Rarity::Common => "⚪",
            Rarity::Uncommon => "🟢",
            Rarity::Rare => "🔵",
            Rarity::Epic => "🟣",
            Rarity::Legendary => "🟡",
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "common" => Ok(Rarity::Common),
            "uncommon" => Ok(Rarity::Uncommon),
            "rare" => Ok(Rarity::Rare),
            "epic" => Ok(Rarity::Epic),
            "legendary" => Ok(Rarity::Legendary),
            other => Err(format!("unknown rarity: {}", other)),
        }
    }
}

/// A stack of identical items held in a profile's inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Stable key, unique within one inventory
    pub item_id: String,
    pub name: String,
    /// Always at least 1; empty stacks are removed
    pub quantity: i64,
    pub rarity: Rarity,
    /// Unit value in coins
    pub value: i64,
}

/// Economy profile for one user in one community
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: String,
    pub guild_id: String,
    pub username: String,

    /// Wallet balance
    pub balance: i64,
    /// Bank balance, kept separate from the wallet
    pub bank: i64,

    pub level: i64,
    /// XP towards the next level; reset on level-up
    pub xp: i64,
    /// Lifetime XP, never decreases
    pub total_xp: i64,

    pub commands_used: i64,
    pub inventory: Vec<InventoryItem>,

    pub last_daily: Option<DateTime<Utc>>,
    pub last_work: Option<DateTime<Utc>>,
    pub registered_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,

    /// Optimistic concurrency counter, bumped by every stored write
    pub revision: i64,
}

impl Profile {
    /// Create a freshly registered profile
    pub fn new(
        user_id: impl Into<String>,
        guild_id: impl Into<String>,
        username: impl Into<String>,
        starting_balance: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            guild_id: guild_id.into(),
            username: username.into(),
            balance: starting_balance.max(0),
            bank: 0,
            level: 1,
            xp: 0,
            total_xp: 0,
            commands_used: 0,
            inventory: Vec::new(),
            last_daily: None,
            last_work: None,
            registered_at: now,
            last_active: now,
            revision: 0,
        }
    }

    /// Wallet plus bank
    pub fn total_wealth(&self) -> i64 {
        self.balance.saturating_add(self.bank)
    }

    /// Credit coins to the wallet
    pub fn credit(&mut self, amount: i64) {
        self.balance = self.balance.saturating_add(amount.max(0));
    }

    /// Whole days since registration
    pub fn account_age_days(&self, now: DateTime<Utc>) -> i64 {
        now.signed_duration_since(self.registered_at).num_days().max(0)
    }

    /// Approximate hours spent using commands (30 seconds per command)
    pub fn grind_hours(&self) -> i64 {
        self.commands_used.saturating_mul(30) / 3600
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_profile_defaults() {
        let now = Utc::now();
        let profile = Profile::new("u1", "g1", "alice", 1000, now);
        assert_eq!(profile.balance, 1000);
        assert_eq!(profile.bank, 0);
        assert_eq!(profile.level, 1);
        assert_eq!(profile.xp, 0);
        assert_eq!(profile.total_xp, 0);
        assert!(profile.inventory.is_empty());
        assert!(profile.last_daily.is_none());
        assert_eq!(profile.registered_at, now);
    }

    #[test]
    fn test_rarity_ordering() {
        assert!(Rarity::Common < Rarity::Uncommon);
        assert!(Rarity::Epic < Rarity::Legendary);
        assert_eq!("RARE".parse::<Rarity>(), Ok(Rarity::Rare));
        assert!("mythic".parse::<Rarity>().is_err());
    }

    #[test]
    fn test_rarity_serializes_lowercase() {
        let json = serde_json::to_string(&Rarity::Legendary).unwrap();
        assert_eq!(json, "\"legendary\"");
    }

    #[test]
    fn test_activity_stats() {
        let now = Utc::now();
        let mut profile = Profile::new("u1", "g1", "alice", 0, now - Duration::days(3));
        profile.commands_used = 240;
        assert_eq!(profile.account_age_days(now), 3);
        assert_eq!(profile.grind_hours(), 2);
    }
}
