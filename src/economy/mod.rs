//! Economy engine
//!
//! Pure rules over an explicit [`Profile`] value plus an explicit
//! [`EconomyConfig`], and the [`Economy`] service that applies them
//! against a [`ProfileStore`](crate::store::ProfileStore).
//!
//! - **cooldown**: timestamp gating for daily/work
//! - **rewards**: randomized currency and item rewards
//! - **progression**: XP and the exponential level curve
//! - **inventory**: quantified item ledger
//! - **leaderboard**: per-community rankings

pub mod cooldown;
pub mod inventory;
pub mod leaderboard;
pub mod profile;
pub mod progression;
pub mod rewards;
pub mod service;

use std::time::Duration;

pub use leaderboard::{LeaderboardEntry, LeaderboardKind};
pub use profile::{InventoryItem, Profile, Rarity};
pub use progression::ProgressionConfig;
pub use rewards::{DailyConfig, RandRewards, RewardRng};
pub use service::{CommandXp, DailyClaim, Economy, WorkShift};

/// Default wallet balance for a freshly registered profile
pub const DEFAULT_STARTING_BALANCE: i64 = 1000;

/// Economy tuning, resolved once from configuration at startup
#[derive(Debug, Clone)]
pub struct EconomyConfig {
    pub starting_balance: i64,
    pub daily: DailyConfig,
    pub daily_cooldown: Duration,
    pub work_cooldown: Duration,
    pub progression: ProgressionConfig,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_balance: DEFAULT_STARTING_BALANCE,
            daily: DailyConfig::default(),
            daily_cooldown: Duration::from_millis(86_400_000),
            work_cooldown: Duration::from_millis(300_000),
            progression: ProgressionConfig::default(),
        }
    }
}

/// Slice one page out of an ordered result. Pages are 1-based.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    if per_page == 0 {
        return &[];
    }
    let start = page.saturating_sub(1).saturating_mul(per_page);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}

/// Number of pages needed to show `len` items (at least one).
pub fn total_pages(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 1;
    }
    len.div_ceil(per_page).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_second_page() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(paginate(&items, 2, 10), &items[10..20]);
        assert_eq!(paginate(&items, 3, 10), &items[20..25]);
        assert!(paginate(&items, 4, 10).is_empty());
    }

    #[test]
    fn test_page_zero_behaves_like_first_page() {
        let items = [1, 2, 3];
        assert_eq!(paginate(&items, 0, 2), &[1, 2]);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }
}
