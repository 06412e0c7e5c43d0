//! Randomized rewards for the daily claim and for work shifts
//!
//! All randomness is drawn through [`RewardRng`] so tests can script
//! exact draws or seed a deterministic generator.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::inventory::ItemDef;
use super::Rarity;

/// Source of reward randomness
pub trait RewardRng: Send {
    /// Uniform integer in `min..=max`
    fn between(&mut self, min: i64, max: i64) -> i64;
    /// Uniform index in `0..len`
    fn index(&mut self, len: usize) -> usize;
    /// Uniform float in `[0, 1)`
    fn roll(&mut self) -> f64;
}

/// [`RewardRng`] backed by any `rand` generator
pub struct RandRewards<R>(R);

impl RandRewards<StdRng> {
    pub fn from_entropy() -> Self {
        Self(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> RewardRng for RandRewards<R> {
    fn between(&mut self, min: i64, max: i64) -> i64 {
        if min >= max {
            return min;
        }
        self.0.gen_range(min..=max)
    }

    fn index(&mut self, len: usize) -> usize {
        if len <= 1 {
            return 0;
        }
        self.0.gen_range(0..len)
    }

    fn roll(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

// =============================================================================
// Daily reward
// =============================================================================

/// Daily reward range and per-level bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyConfig {
    pub base_min: i64,
    pub base_max: i64,
    pub level_bonus_per_level: i64,
}

impl Default for DailyConfig {
    fn default() -> Self {
        Self {
            base_min: 100,
            base_max: 500,
            level_bonus_per_level: 50,
        }
    }
}

/// Longest streak the heuristic will report
pub const MAX_STREAK_DAYS: i64 = 7;

/// Breakdown of one daily claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyReward {
    /// Amount drawn from the level-shifted range
    pub amount: i64,
    /// Shift applied to both ends of the range
    pub level_bonus: i64,
    pub streak_days: i64,
    pub streak_bonus: i64,
    /// Coins credited to the wallet
    pub total: i64,
}

/// Streak heuristic: a claim 24h-48h after the previous one counts as a
/// streak whose length is derived from the level, not from a counter.
pub fn streak_days(level: i64, last_daily: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    let Some(last) = last_daily else {
        return 1;
    };
    let since = now.signed_duration_since(last);
    if since >= ChronoDuration::hours(24) && since <= ChronoDuration::hours(48) {
        (level / 2 + 1).min(MAX_STREAK_DAYS)
    } else {
        1
    }
}

/// Draw a daily reward for a profile at `level`
pub fn daily_reward(
    rng: &mut dyn RewardRng,
    level: i64,
    last_daily: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &DailyConfig,
) -> DailyReward {
    let level_bonus = level.saturating_mul(config.level_bonus_per_level);
    let amount = rng.between(
        config.base_min.saturating_add(level_bonus),
        config.base_max.saturating_add(level_bonus),
    );

    let streak_days = streak_days(level, last_daily, now);
    let streak_bonus = if streak_days > 1 {
        (amount as f64 * 0.1 * (streak_days - 1) as f64).floor() as i64
    } else {
        0
    };

    DailyReward {
        amount,
        level_bonus,
        streak_days,
        streak_bonus,
        total: amount.saturating_add(streak_bonus).max(0),
    }
}

// =============================================================================
// Work reward
// =============================================================================

/// A job tier unlocked at `min_level`
#[derive(Debug, PartialEq, Eq)]
pub struct Job {
    pub name: &'static str,
    pub emoji: &'static str,
    pub min_level: i64,
    pub pay_min: i64,
    pub pay_max: i64,
}

/// Flavor text for a shift and its pay multiplier
#[derive(Debug, PartialEq)]
pub struct ShiftFlavor {
    pub text: &'static str,
    pub multiplier: f64,
}

pub static JOBS: [Job; 7] = [
    Job { name: "Street Sweeper", emoji: "🧹", min_level: 1, pay_min: 50, pay_max: 150 },
    Job { name: "Food Delivery", emoji: "🍕", min_level: 3, pay_min: 75, pay_max: 200 },
    Job { name: "Construction Worker", emoji: "🔨", min_level: 5, pay_min: 100, pay_max: 250 },
    Job { name: "Office Worker", emoji: "💼", min_level: 8, pay_min: 150, pay_max: 300 },
    Job { name: "Software Developer", emoji: "💻", min_level: 12, pay_min: 200, pay_max: 400 },
    Job { name: "Business Owner", emoji: "👔", min_level: 20, pay_min: 300, pay_max: 600 },
    Job { name: "Investment Banker", emoji: "💰", min_level: 30, pay_min: 500, pay_max: 1000 },
];

pub static SHIFT_FLAVORS: [ShiftFlavor; 6] = [
    ShiftFlavor { text: "You worked hard and earned", multiplier: 1.0 },
    ShiftFlavor { text: "You impressed your boss and earned", multiplier: 1.2 },
    ShiftFlavor { text: "You had a productive day and earned", multiplier: 1.1 },
    ShiftFlavor { text: "You completed all tasks and earned", multiplier: 1.0 },
    ShiftFlavor { text: "You went above and beyond and earned", multiplier: 1.3 },
    ShiftFlavor { text: "You had a regular workday and earned", multiplier: 1.0 },
];

pub static BONUS_ITEMS: [ItemDef; 3] = [
    ItemDef { item_id: "energy_drink", name: "Energy Drink", rarity: Rarity::Common, value: 25 },
    ItemDef { item_id: "lucky_coin", name: "Lucky Coin", rarity: Rarity::Uncommon, value: 100 },
    ItemDef { item_id: "golden_wrench", name: "Golden Wrench", rarity: Rarity::Rare, value: 250 },
];

/// Chance that a shift also yields a bonus item
pub const BONUS_ITEM_CHANCE: f64 = 0.15;

/// Breakdown of one work shift
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkReward {
    pub job: &'static Job,
    pub base_pay: i64,
    pub level_multiplier: f64,
    pub flavor: &'static ShiftFlavor,
    /// Coins credited to the wallet
    pub total: i64,
    pub bonus_item: Option<&'static ItemDef>,
}

/// Jobs available at `level`, in table order
pub fn eligible_jobs(level: i64) -> Vec<&'static Job> {
    JOBS.iter().filter(|job| level >= job.min_level).collect()
}

/// The next job that `level` has not unlocked yet
pub fn next_job_unlock(level: i64) -> Option<&'static Job> {
    JOBS.iter().find(|job| job.min_level > level)
}

/// `1 + level * 5%`
pub fn level_multiplier(level: i64) -> f64 {
    1.0 + level as f64 * 0.05
}

/// Draw a work reward for a profile at `level`
pub fn work_reward(rng: &mut dyn RewardRng, level: i64) -> WorkReward {
    let jobs = eligible_jobs(level);
    let job = if jobs.is_empty() {
        &JOBS[0]
    } else {
        jobs[rng.index(jobs.len()).min(jobs.len() - 1)]
    };

    let base_pay = rng.between(job.pay_min, job.pay_max);
    let level_multiplier = level_multiplier(level);
    let leveled = (base_pay as f64 * level_multiplier).floor();

    let flavor = &SHIFT_FLAVORS[rng.index(SHIFT_FLAVORS.len()).min(SHIFT_FLAVORS.len() - 1)];
    let total = ((leveled * flavor.multiplier).floor() as i64).max(0);

    let bonus_item = if rng.roll() < BONUS_ITEM_CHANCE {
        Some(&BONUS_ITEMS[rng.index(BONUS_ITEMS.len()).min(BONUS_ITEMS.len() - 1)])
    } else {
        None
    };

    WorkReward {
        job,
        base_pay,
        level_multiplier,
        flavor,
        total,
        bonus_item,
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::RewardRng;
    use std::collections::VecDeque;

    /// Replays scripted draws; falls back to the low end once exhausted
    #[derive(Default)]
    pub struct ScriptedRng {
        pub betweens: VecDeque<i64>,
        pub indexes: VecDeque<usize>,
        pub rolls: VecDeque<f64>,
    }

    impl RewardRng for ScriptedRng {
        fn between(&mut self, min: i64, max: i64) -> i64 {
            self.betweens.pop_front().unwrap_or(min).clamp(min, max.max(min))
        }

        fn index(&mut self, len: usize) -> usize {
            self.indexes.pop_front().unwrap_or(0).min(len.saturating_sub(1))
        }

        fn roll(&mut self) -> f64 {
            self.rolls.pop_front().unwrap_or(0.99)
        }
    }
}
