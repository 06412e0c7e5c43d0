//! Command dispatch
//!
//! Order of checks for every invocation: registration precondition,
//! per-command cooldown, handler. A successful command by a registered
//! caller then earns XP and schedules the announcement check.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::reply::{colors, error_embed, format_duration, success_embed, Embed, Reply};
use super::{find_command, Access, CommandCooldowns, Invocation};
use crate::announcements::{Announcement, Broadcaster};
use crate::economy::Economy;
use crate::notify::{FollowupSender, FollowupTarget};
use crate::types::{CofferError, Result};

/// Dispatcher tuning
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Wait before checking for undelivered announcements
    pub announcement_delay: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            announcement_delay: Duration::from_millis(1000),
        }
    }
}

pub struct Dispatcher {
    pub(super) economy: Arc<Economy>,
    pub(super) broadcaster: Arc<Broadcaster>,
    pub(super) cooldowns: Arc<CommandCooldowns>,
    followups: Arc<dyn FollowupSender>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        economy: Arc<Economy>,
        broadcaster: Arc<Broadcaster>,
        cooldowns: Arc<CommandCooldowns>,
        followups: Arc<dyn FollowupSender>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            economy,
            broadcaster,
            cooldowns,
            followups,
            settings,
        }
    }

    pub fn economy(&self) -> &Economy {
        &self.economy
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// Run an invocation and render the reply, errors included
    pub async fn dispatch(&self, inv: &Invocation) -> Reply {
        let now = Utc::now();
        let started = Instant::now();

        match self.execute(inv, now).await {
            Ok(mut reply) => {
                if let Some(level_up) = self.after_command(inv, now).await {
                    reply.push(level_up);
                }
                info!(
                    command = %inv.command,
                    user_id = %inv.user_id,
                    guild_id = %inv.guild_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Command completed"
                );
                reply
            }
            Err(err) => self.render_error(inv, &err),
        }
    }

    /// Check preconditions and run the handler
    pub async fn execute(&self, inv: &Invocation, now: DateTime<Utc>) -> Result<Reply> {
        let spec = find_command(&inv.command)
            .ok_or_else(|| CofferError::BadRequest(format!("Unknown command `{}`", inv.command)))?;

        match spec.access {
            Access::Anyone => {}
            Access::Registered => {
                if !self.economy.is_registered(&inv.user_id, &inv.guild_id).await? {
                    return Err(CofferError::NotRegistered);
                }
            }
            Access::Unregistered => {
                if self.economy.is_registered(&inv.user_id, &inv.guild_id).await? {
                    return Err(CofferError::AlreadyRegistered);
                }
            }
            Access::Operator => self.broadcaster.require_operator(&inv.user_id)?,
        }

        if let Some(window) = spec.cooldown {
            self.cooldowns
                .check_and_record(spec.name, &inv.user_id, window, Instant::now())
                .map_err(|remaining| CofferError::CommandCooldown {
                    command: spec.name.to_string(),
                    remaining,
                })?;
        }

        match spec.name {
            "register" => self.register(inv, now).await,
            "balance" => self.balance(inv).await,
            "daily" => self.daily(inv, now).await,
            "work" => self.work(inv, now).await,
            "inventory" => self.inventory(inv).await,
            "leaderboard" => self.leaderboard(inv).await,
            "profile" => self.profile(inv, now).await,
            "help" => self.help(inv),
            "announce" => self.announce(inv, now).await,
            "manage-announcements" => self.manage_announcements(inv, now).await,
            other => Err(CofferError::BadRequest(format!("Unknown command `{}`", other))),
        }
    }

    /// Post-command hook: command XP, level-up notice, announcement check
    async fn after_command(&self, inv: &Invocation, now: DateTime<Utc>) -> Option<Embed> {
        if inv.command == "register" {
            return None;
        }

        let granted = match self
            .economy
            .record_command(&inv.user_id, &inv.guild_id, now)
            .await
        {
            Ok(Some(granted)) => granted,
            Ok(None) => return None,
            Err(e) => {
                warn!(command = %inv.command, user_id = %inv.user_id, error = %e, "Failed to record command XP");
                return None;
            }
        };

        self.spawn_announcement_check(inv);

        granted.leveled_up.then(|| {
            success_embed(
                "Level Up!",
                format!(
                    "🎉 Congratulations! You've reached **Level {}**!\n+{} XP gained from using commands.",
                    granted.level, granted.xp_granted
                ),
            )
        })
    }

    fn spawn_announcement_check(&self, inv: &Invocation) {
        let Some(target) = inv.followup.clone() else {
            debug!(user_id = %inv.user_id, "No follow-up target, skipping announcement check");
            return;
        };

        let broadcaster = Arc::clone(&self.broadcaster);
        let followups = Arc::clone(&self.followups);
        let delay = self.settings.announcement_delay;
        let user_id = inv.user_id.clone();

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if let Err(e) =
                deliver_announcement(&broadcaster, followups.as_ref(), &target, &user_id).await
            {
                warn!(user_id = %user_id, error = %e, "Announcement delivery failed");
            }
        });
    }

    /// Turn an error into the reply the caller sees
    pub fn render_error(&self, inv: &Invocation, err: &CofferError) -> Reply {
        if !err.is_user_facing() {
            error!(
                command = %inv.command,
                user_id = %inv.user_id,
                guild_id = %inv.guild_id,
                error = %err,
                "Command failed"
            );
            return Reply::ephemeral(error_embed(
                "Command Error",
                "There was an error while executing this command! Please try again later.",
            ));
        }

        debug!(command = %inv.command, user_id = %inv.user_id, rejection = %err, "Command rejected");

        let embed = match err {
            CofferError::NotRegistered => error_embed(
                "Registration Required",
                "You need to register an account first! Use `/register` to get started.",
            ),
            CofferError::AlreadyRegistered => error_embed(
                "Already Registered",
                "You already have an account! Use `/profile` to view your information.",
            ),
            CofferError::TargetNotFound(name) => error_embed(
                "User Not Found",
                format!("{} doesn't have a registered account.", name),
            ),
            CofferError::Cooldown { action: "daily", remaining } => error_embed(
                "Daily Cooldown",
                format!(
                    "You've already claimed your daily reward! Come back in {}.",
                    format_duration(*remaining)
                ),
            ),
            CofferError::Cooldown { action: "work", remaining } => error_embed(
                "Work Cooldown",
                format!(
                    "You're too tired to work right now! Rest for {}.",
                    format_duration(*remaining)
                ),
            ),
            CofferError::Cooldown { action, remaining } => error_embed(
                "Cooldown",
                format!("`{}` is available again in {}.", action, format_duration(*remaining)),
            ),
            CofferError::CommandCooldown { command, remaining } => error_embed(
                "Command Cooldown",
                format!(
                    "Please wait {:.1} more second(s) before reusing the `{}` command.",
                    remaining.as_secs_f64(),
                    command
                ),
            ),
            CofferError::OperatorOnly => {
                error_embed("Access Denied", "Only the bot owner can use this command.")
            }
            CofferError::AnnouncementNotFound(prefix) => error_embed(
                "Announcement Not Found",
                format!("No announcement found with ID starting with \"{}\"", prefix),
            ),
            CofferError::AmbiguousPrefix { prefix, matches } => error_embed(
                "Ambiguous ID",
                format!(
                    "\"{}\" matches several announcements: {}\nUse a longer prefix.",
                    prefix,
                    matches
                        .iter()
                        .map(|id| format!("`{}`", id))
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ),
            CofferError::PrefixTooShort { min } => error_embed(
                "ID Too Short",
                format!("Use at least {} characters of the announcement ID.", min),
            ),
            CofferError::AlreadyInState(message) => error_embed("No Change", message.clone()),
            other => error_embed("Invalid Command", other.to_string()),
        };
        Reply::ephemeral(embed)
    }
}

/// Claim the caller's next announcement and send it as a follow-up.
///
/// Returns whether anything was delivered. The claim is recorded before
/// sending, so a failed send is not retried.
pub async fn deliver_announcement(
    broadcaster: &Broadcaster,
    followups: &dyn FollowupSender,
    target: &FollowupTarget,
    user_id: &str,
) -> Result<bool> {
    let Some(announcement) = broadcaster.deliver_next(user_id).await? else {
        return Ok(false);
    };

    followups
        .send(target, &Reply::ephemeral(announcement_embed(&announcement)))
        .await?;

    info!(
        announcement_id = %announcement.id,
        user_id = %user_id,
        "Announcement delivered"
    );
    Ok(true)
}

pub fn announcement_embed(announcement: &Announcement) -> Embed {
    Embed::new("📢 Bot Announcement", colors::ANNOUNCEMENT)
        .description(announcement.content.clone())
        .timestamp(announcement.created_at)
        .footer("This is an automated announcement from the bot owner.")
}
