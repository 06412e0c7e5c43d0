//! Configuration for coffer
//!
//! CLI arguments with environment variable fallbacks, using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::commands::DispatchSettings;
use crate::economy::{DailyConfig, EconomyConfig, ProgressionConfig};

/// Coffer - per-server economy bot behind an HTTP interactions endpoint
#[derive(Parser, Debug, Clone)]
#[command(name = "coffer")]
#[command(about = "Economy bot serving chat platform interactions over HTTP")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "coffer")]
    pub mongodb_db: String,

    /// Development mode: fall back to in-memory storage when MongoDB is unreachable
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Application id, used for follow-up webhooks (required in production)
    #[arg(long, env = "APPLICATION_ID")]
    pub application_id: Option<String>,

    /// Hex-encoded ed25519 public key for interaction signatures (required in production)
    #[arg(long, env = "PUBLIC_KEY")]
    pub public_key: Option<String>,

    /// Chat platform REST API base URL
    #[arg(long, env = "API_BASE", default_value = "https://discord.com/api/v10")]
    pub api_base: String,

    /// User id allowed to run operator commands
    #[arg(long, env = "BOT_OWNER_ID")]
    pub bot_owner_id: Option<String>,

    /// Channel whose operator posts become announcements
    #[arg(long, env = "ANNOUNCEMENT_CHANNEL_ID")]
    pub announcement_channel_id: Option<String>,

    /// Shared secret for the message relay endpoint (relay disabled when unset)
    #[arg(long, env = "RELAY_TOKEN")]
    pub relay_token: Option<String>,

    /// Lower end of the daily reward range
    #[arg(long, env = "DAILY_REWARD_MIN", default_value = "100")]
    pub daily_reward_min: i64,

    /// Upper end of the daily reward range
    #[arg(long, env = "DAILY_REWARD_MAX", default_value = "500")]
    pub daily_reward_max: i64,

    /// Daily reward range shift per level
    #[arg(long, env = "DAILY_LEVEL_BONUS", default_value = "50")]
    pub daily_level_bonus: i64,

    /// Daily claim cooldown in milliseconds
    #[arg(long, env = "DAILY_COOLDOWN", default_value = "86400000")]
    pub daily_cooldown_ms: u64,

    /// Work cooldown in milliseconds
    #[arg(long, env = "WORK_COOLDOWN", default_value = "300000")]
    pub work_cooldown_ms: u64,

    /// XP granted per successful command
    #[arg(long, env = "XP_PER_COMMAND", default_value = "5")]
    pub xp_per_command: i64,

    /// XP needed to leave level 1
    #[arg(long, env = "BASE_XP_REQUIRED", default_value = "100")]
    pub base_xp_required: i64,

    /// Growth factor of the XP curve per level
    #[arg(long, env = "XP_MULTIPLIER", default_value = "1.5")]
    pub xp_multiplier: f64,

    /// Wallet balance of a new profile
    #[arg(long, env = "STARTING_BALANCE", default_value = "1000")]
    pub starting_balance: i64,

    /// Delay before the post-command announcement check, in milliseconds
    #[arg(long, env = "ANNOUNCEMENT_DELAY_MS", default_value = "1000")]
    pub announcement_delay_ms: u64,

    /// Interval of the command cooldown sweep, in seconds
    #[arg(long, env = "COOLDOWN_SWEEP_SECS", default_value = "60")]
    pub cooldown_sweep_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            if self.public_key.is_none() {
                return Err("PUBLIC_KEY is required in production mode".to_string());
            }
            if self.application_id.is_none() {
                return Err("APPLICATION_ID is required in production mode".to_string());
            }
        }

        if self.daily_reward_min < 0 || self.daily_reward_min > self.daily_reward_max {
            return Err(
                "DAILY_REWARD_MIN must be non-negative and not exceed DAILY_REWARD_MAX".to_string(),
            );
        }

        if self.base_xp_required <= 0 {
            return Err("BASE_XP_REQUIRED must be positive".to_string());
        }

        if !(self.xp_multiplier.is_finite() && self.xp_multiplier >= 1.0) {
            return Err("XP_MULTIPLIER must be a finite number of at least 1.0".to_string());
        }

        if self.xp_per_command < 0 || self.starting_balance < 0 || self.daily_level_bonus < 0 {
            return Err(
                "XP_PER_COMMAND, STARTING_BALANCE and DAILY_LEVEL_BONUS must be non-negative"
                    .to_string(),
            );
        }

        if self.cooldown_sweep_secs == 0 {
            return Err("COOLDOWN_SWEEP_SECS must be at least 1".to_string());
        }

        Ok(())
    }

    /// Economy tuning handed to the engine
    pub fn economy_config(&self) -> EconomyConfig {
        EconomyConfig {
            starting_balance: self.starting_balance,
            daily: DailyConfig {
                base_min: self.daily_reward_min,
                base_max: self.daily_reward_max,
                level_bonus_per_level: self.daily_level_bonus,
            },
            daily_cooldown: Duration::from_millis(self.daily_cooldown_ms),
            work_cooldown: Duration::from_millis(self.work_cooldown_ms),
            progression: ProgressionConfig {
                base_xp: self.base_xp_required,
                multiplier: self.xp_multiplier,
                xp_per_command: self.xp_per_command,
            },
        }
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            announcement_delay: Duration::from_millis(self.announcement_delay_ms),
        }
    }

    pub fn cooldown_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.cooldown_sweep_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["coffer", "--public-key", "00", "--application-id", "1"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_match_economy_defaults() {
        let args = parse(&[]);
        assert!(args.validate().is_ok());

        let config = args.economy_config();
        let defaults = EconomyConfig::default();
        assert_eq!(config.starting_balance, defaults.starting_balance);
        assert_eq!(config.daily, defaults.daily);
        assert_eq!(config.daily_cooldown, Duration::from_secs(86_400));
        assert_eq!(config.work_cooldown, Duration::from_secs(300));
        assert_eq!(config.progression.base_xp, 100);
        assert_eq!(config.progression.xp_per_command, 5);
        assert_eq!(args.dispatch_settings().announcement_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_inverted_reward_range_rejected() {
        let args = parse(&["--daily-reward-min", "600", "--daily-reward-max", "500"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_production_requires_public_key() {
        let mut args = parse(&[]);
        args.public_key = None;
        assert!(args.validate().is_err());
        args.dev_mode = true;
        assert!(args.validate().is_ok());
    }
}
