//! General command handlers: register, profile, leaderboard, help

use chrono::{DateTime, Utc};

use super::reply::{
    colors, format_currency, format_duration, format_number, medal, progress_bar, Embed, Reply,
};
use super::{commands_in, Category, Dispatcher, Invocation};
use crate::economy::cooldown::remaining_at;
use crate::economy::inventory::top_by_value;
use crate::economy::leaderboard::rank_of;
use crate::economy::progression::xp_required;
use crate::economy::{paginate, LeaderboardKind};
use crate::types::{CofferError, Result};

/// Leaderboard entries per page
const USERS_PER_PAGE: usize = 10;

/// Assumed seconds per command for the "grind" figures
const SECONDS_PER_COMMAND: i64 = 30;

impl Dispatcher {
    pub(super) async fn register(&self, inv: &Invocation, now: DateTime<Utc>) -> Result<Reply> {
        let profile = self
            .economy
            .register(&inv.user_id, &inv.guild_id, &inv.username, now)
            .await?;

        let description = format!(
            "**Congratulations, {}!** Your account has been successfully created.\n\n\
             **Starting Package:**\n{}\n⭐ Level {}\n\n\
             **Get Started:**\n\
             • Use `/daily` to claim your daily reward\n\
             • Use `/work` to earn money\n\
             • Use `/profile` to view your stats\n\
             • Use `/help` to see all available commands\n\n\
             **Tips:**\n\
             • Commands give you XP to level up\n\
             • Higher levels unlock better rewards\n\
             • Check leaderboards to compete with others!",
            inv.username,
            format_currency(profile.balance),
            profile.level
        );

        let embed = Embed::new("🎉 Welcome to the Economy!", colors::SUCCESS)
            .description(description)
            .footer("Welcome to the community!")
            .timestamp(now);
        Ok(Reply::public(embed))
    }

    pub(super) async fn profile(&self, inv: &Invocation, now: DateTime<Utc>) -> Result<Reply> {
        let (target, profile) = self.target_profile(inv).await?;
        let own = target.id == inv.user_id;
        let config = self.economy.config();
        let required = xp_required(profile.level, &config.progression);

        let mut embed = Embed::new(
            if own {
                "Your Profile".to_string()
            } else {
                format!("{}'s Profile", target.username)
            },
            colors::INFO,
        )
        .field(
            "💰 Economy Stats",
            format!(
                "**Wallet:** {}\n**Bank:** {}\n**Total Wealth:** {}",
                format_currency(profile.balance),
                format_currency(profile.bank),
                format_currency(profile.total_wealth())
            ),
            true,
        )
        .field(
            "⭐ Level & Experience",
            format!(
                "**Level:** {}\n**XP:** {}/{}\n**Total XP:** {}\n{}",
                profile.level,
                format_number(profile.xp),
                format_number(required),
                format_number(profile.total_xp),
                progress_bar(profile.xp, required, 10)
            ),
            true,
        )
        .field(
            "📊 Activity Stats",
            format!(
                "**Commands Used:** {}\n**Grind Hours:** {}h\n**Account Age:** {} days",
                format_number(profile.commands_used),
                format_number(profile.grind_hours()),
                profile.account_age_days(now)
            ),
            true,
        )
        .footer(if own {
            format!("Registered on {}", profile.registered_at.format("%a %b %d %Y"))
        } else {
            format!("Requested by {}", inv.username)
        })
        .timestamp(now);

        if !profile.inventory.is_empty() {
            let mut preview = top_by_value(&profile.inventory, 3)
                .iter()
                .map(|item| format!("**{}** ×{} *({})*", item.name, item.quantity, item.rarity))
                .collect::<Vec<_>>()
                .join("\n");
            if profile.inventory.len() > 3 {
                preview.push_str(&format!("\n*+{} more items*", profile.inventory.len() - 3));
            }
            embed = embed.field("🎒 Inventory Preview", preview, false);
        }

        if own {
            let availability = |last, window| {
                let left = remaining_at(last, window, now);
                if left.is_zero() {
                    "✅ Available".to_string()
                } else {
                    format_duration(left)
                }
            };
            embed = embed.field(
                "⏰ Command Cooldowns",
                format!(
                    "**Daily:** {}\n**Work:** {}",
                    availability(profile.last_daily, config.daily_cooldown),
                    availability(profile.last_work, config.work_cooldown)
                ),
                false,
            );
        }

        Ok(Reply::public(embed))
    }

    pub(super) async fn leaderboard(&self, inv: &Invocation) -> Result<Reply> {
        let kind: LeaderboardKind = inv
            .string("type")
            .unwrap_or("balance")
            .parse()
            .map_err(CofferError::BadRequest)?;
        let page = inv.page();

        let entries = self.economy.leaderboard(&inv.guild_id, kind).await?;
        let Some(leader) = entries.first() else {
            return Ok(Reply::public(Embed::new("❌ No Data", colors::ERROR).description(
                "No users found for this leaderboard.",
            )));
        };

        let (title, emoji) = match kind {
            LeaderboardKind::Balance => ("💰 Richest Users", "💰"),
            LeaderboardKind::Level => ("⭐ Highest Levels", "⭐"),
            LeaderboardKind::Commands => ("⚡ Most Active Users", "⚡"),
        };
        let show = |value: i64| match kind {
            LeaderboardKind::Balance => format_currency(value),
            LeaderboardKind::Level => format!("Level {}", value),
            LeaderboardKind::Commands => format!(
                "{} commands ({}h grind)",
                format_number(value),
                value.saturating_mul(SECONDS_PER_COMMAND) / 3600
            ),
        };

        let slice = paginate(&entries, page, USERS_PER_PAGE);
        let offset = (page - 1) * USERS_PER_PAGE;

        let description = if slice.is_empty() {
            format!("No users on page {}.", page)
        } else {
            slice
                .iter()
                .map(|entry| format!("{} <@{}>\n{} {}", medal(entry.rank), entry.user_id, emoji, show(entry.value)))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let footer = if slice.is_empty() {
            format!("Use /leaderboard type:{} page:1 to start from the top", kind)
        } else {
            format!(
                "Showing ranks {}-{} | Use /leaderboard type:{} page:{} for next page",
                offset + 1,
                offset + slice.len(),
                kind,
                page + 1
            )
        };

        let mut embed = Embed::new(format!("{} - Page {}", title, page), colors::GOLD)
            .description(description)
            .footer(footer)
            .timestamp(Utc::now());

        if let Some(own) = rank_of(&entries, &inv.user_id) {
            if !slice.iter().any(|e| e.user_id == inv.user_id) {
                embed = embed.field(
                    "📍 Your Ranking",
                    format!("**Rank {}:** {}", own.rank, show(own.value)),
                    false,
                );
            }
        }

        embed = embed.field(
            "📊 Server Stats",
            format!(
                "**Total Registered Users:** {}\n**Server Leader:** <@{}> with {}",
                format_number(entries.len() as i64),
                leader.user_id,
                show(leader.value)
            ),
            false,
        );

        Ok(Reply::public(embed))
    }

    pub(super) fn help(&self, inv: &Invocation) -> Result<Reply> {
        let Some(raw) = inv.string("category") else {
            return Ok(Reply::public(overview_embed()));
        };
        let category: Category = raw.parse().map_err(CofferError::BadRequest)?;

        let (title, color, blurb) = match category {
            Category::Economy => (
                "💰 Economy Commands",
                colors::SUCCESS,
                "Commands for earning and managing your virtual currency.",
            ),
            Category::General => (
                "📊 General Commands",
                colors::INFO,
                "Profile management, leaderboards, and informational commands.",
            ),
            Category::Admin => (
                "⚙️ Admin Commands",
                colors::ADMIN,
                "Announcement tools (Bot Owner Only).",
            ),
        };

        let mut embed = Embed::new(title, color).description(blurb);
        for spec in commands_in(category) {
            embed = embed.field(spec.usage, spec.description, false);
        }
        let footer = match category {
            Category::Economy => "Economy commands require registration with /register",
            Category::General => "Most commands require registration first",
            Category::Admin => "Admin commands are restricted to the bot owner only",
        };

        Ok(Reply::ephemeral(embed.footer(footer)))
    }
}

fn overview_embed() -> Embed {
    Embed::new("🤖 Economy Bot - Help", colors::INFO)
        .description(
            "Welcome! This bot runs a per-server economy with leveling, items and leaderboards.\n\n\
             **🚀 Getting Started:**\nUse `/register` to create your account.",
        )
        .field(
            "💰 Economy Commands",
            "Earning and managing your currency.\nUse `/help category:economy` for details.",
            false,
        )
        .field(
            "📊 General Commands",
            "Profiles, leaderboards and information.\nUse `/help category:general` for details.",
            false,
        )
        .field(
            "⚙️ Admin Commands",
            "Announcement tools (Owner only).\nUse `/help category:admin` for details.",
            false,
        )
        .field(
            "💡 Pro Tips",
            "• Commands give you XP to level up and unlock better rewards\n\
             • Higher levels mean better daily rewards and work payouts\n\
             • Check leaderboards to see how you rank against others\n\
             • Look out for announcement messages with bot updates!",
            false,
        )
        .timestamp(Utc::now())
}
