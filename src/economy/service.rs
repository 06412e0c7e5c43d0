//! Economy service
//!
//! Applies the pure rules to stored profiles. Every mutation goes through
//! [`update_profile`], so gate checks (cooldowns) are evaluated against
//! the same read that the write is conditioned on.

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::cooldown::{is_on_cooldown_at, remaining_at};
use super::inventory::add_item;
use super::leaderboard::rank_profiles;
use super::progression::add_xp;
use super::rewards::{daily_reward, work_reward, DailyReward, WorkReward};
use super::{EconomyConfig, LeaderboardEntry, LeaderboardKind, Profile, RandRewards, RewardRng};
use crate::store::{update_profile, ProfileStore};
use crate::types::{CofferError, Result};

/// Outcome of a successful daily claim
#[derive(Debug, Clone)]
pub struct DailyClaim {
    pub reward: DailyReward,
    /// Profile as stored after the claim
    pub profile: Profile,
}

/// Outcome of a successful work shift
#[derive(Debug, Clone)]
pub struct WorkShift {
    pub reward: WorkReward,
    pub profile: Profile,
}

/// XP granted for running a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandXp {
    pub xp_granted: i64,
    pub leveled_up: bool,
    pub level: i64,
}

pub struct Economy {
    profiles: Arc<dyn ProfileStore>,
    config: EconomyConfig,
    rng: Mutex<Box<dyn RewardRng>>,
}

impl Economy {
    /// Service drawing rewards from an entropy-seeded generator
    pub fn new(profiles: Arc<dyn ProfileStore>, config: EconomyConfig) -> Self {
        Self::with_rng(profiles, config, Box::new(RandRewards::from_entropy()))
    }

    pub fn with_rng(
        profiles: Arc<dyn ProfileStore>,
        config: EconomyConfig,
        rng: Box<dyn RewardRng>,
    ) -> Self {
        Self {
            profiles,
            config,
            rng: Mutex::new(rng),
        }
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    pub fn store_backend(&self) -> &'static str {
        self.profiles.backend()
    }

    fn draw<T>(&self, f: impl FnOnce(&mut dyn RewardRng) -> T) -> Result<T> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| CofferError::Internal("reward generator lock poisoned".into()))?;
        Ok(f(rng.as_mut()))
    }

    pub async fn lookup(&self, user_id: &str, guild_id: &str) -> Result<Option<Profile>> {
        self.profiles.get(user_id, guild_id).await
    }

    pub async fn is_registered(&self, user_id: &str, guild_id: &str) -> Result<bool> {
        Ok(self.lookup(user_id, guild_id).await?.is_some())
    }

    /// The caller's own profile
    pub async fn profile(&self, user_id: &str, guild_id: &str) -> Result<Profile> {
        self.lookup(user_id, guild_id)
            .await?
            .ok_or(CofferError::NotRegistered)
    }

    /// Create a profile with the starting balance
    pub async fn register(
        &self,
        user_id: &str,
        guild_id: &str,
        username: &str,
        now: DateTime<Utc>,
    ) -> Result<Profile> {
        let profile = Profile::new(
            user_id,
            guild_id,
            username,
            self.config.starting_balance,
            now,
        );

        self.profiles.insert(profile.clone()).await?;

        info!(user_id = %user_id, guild_id = %guild_id, "Profile registered");
        Ok(profile)
    }

    /// Claim the daily reward if the daily cooldown has elapsed
    pub async fn claim_daily(
        &self,
        user_id: &str,
        guild_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DailyClaim> {
        let config = &self.config;
        let (profile, reward) = update_profile(self.profiles.as_ref(), user_id, guild_id, |p| {
            if is_on_cooldown_at(p.last_daily, config.daily_cooldown, now) {
                return Err(CofferError::Cooldown {
                    action: "daily",
                    remaining: remaining_at(p.last_daily, config.daily_cooldown, now),
                });
            }

            let (level, last_daily) = (p.level, p.last_daily);
            let reward =
                self.draw(|rng| daily_reward(rng, level, last_daily, now, &config.daily))?;

            p.credit(reward.total);
            p.last_daily = Some(now);
            p.last_active = now;
            Ok(reward)
        })
        .await?;

        info!(
            user_id = %user_id,
            guild_id = %guild_id,
            total = reward.total,
            streak_days = reward.streak_days,
            "Daily reward claimed"
        );
        Ok(DailyClaim { reward, profile })
    }

    /// Work a shift if the work cooldown has elapsed
    pub async fn work(&self, user_id: &str, guild_id: &str, now: DateTime<Utc>) -> Result<WorkShift> {
        let config = &self.config;
        let (profile, reward) = update_profile(self.profiles.as_ref(), user_id, guild_id, |p| {
            if is_on_cooldown_at(p.last_work, config.work_cooldown, now) {
                return Err(CofferError::Cooldown {
                    action: "work",
                    remaining: remaining_at(p.last_work, config.work_cooldown, now),
                });
            }

            let level = p.level;
            let reward = self.draw(|rng| work_reward(rng, level))?;

            p.credit(reward.total);
            if let Some(item) = reward.bonus_item {
                add_item(p, item, 1);
            }
            p.last_work = Some(now);
            p.last_active = now;
            Ok(reward)
        })
        .await?;

        info!(
            user_id = %user_id,
            guild_id = %guild_id,
            job = reward.job.name,
            total = reward.total,
            bonus_item = reward.bonus_item.map(|i| i.item_id),
            "Work shift completed"
        );
        Ok(WorkShift { reward, profile })
    }

    /// Grant per-command XP and count the command.
    ///
    /// Returns `None` when the caller has no profile.
    pub async fn record_command(
        &self,
        user_id: &str,
        guild_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<CommandXp>> {
        let progression = &self.config.progression;
        let xp_granted = progression.xp_per_command;

        let result = update_profile(self.profiles.as_ref(), user_id, guild_id, |p| {
            p.commands_used = p.commands_used.saturating_add(1);
            Ok(add_xp(p, xp_granted, progression, now))
        })
        .await;

        match result {
            Ok((profile, leveled_up)) => {
                if leveled_up {
                    info!(user_id = %user_id, guild_id = %guild_id, level = profile.level, "Level up");
                }
                Ok(Some(CommandXp {
                    xp_granted,
                    leveled_up,
                    level: profile.level,
                }))
            }
            Err(CofferError::NotRegistered) => {
                debug!(user_id = %user_id, "No profile, skipping command XP");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Every profile of a community, ranked by `kind`
    pub async fn leaderboard(
        &self,
        guild_id: &str,
        kind: LeaderboardKind,
    ) -> Result<Vec<LeaderboardEntry>> {
        let profiles = self.profiles.list_guild(guild_id, kind).await?;
        Ok(rank_profiles(&profiles, kind))
    }
}
