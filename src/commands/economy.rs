//! Economy command handlers: balance, daily, work, inventory

use chrono::{DateTime, Utc};

use super::reply::{colors, format_currency, format_number, Embed, Reply};
use super::{Dispatcher, Invocation, UserRef};
use crate::economy::inventory::{rarity_breakdown, sorted_for_display, total_value};
use crate::economy::rewards::next_job_unlock;
use crate::economy::{paginate, total_pages, Profile};
use crate::types::{CofferError, Result};

/// Inventory stacks shown per page
const ITEMS_PER_PAGE: usize = 10;

impl Dispatcher {
    /// Profile of the `user` option, or of the caller
    pub(super) async fn target_profile(&self, inv: &Invocation) -> Result<(UserRef, Profile)> {
        let target = inv.target();
        let profile = self
            .economy
            .lookup(&target.id, &inv.guild_id)
            .await?
            .ok_or_else(|| {
                if target.id == inv.user_id {
                    CofferError::NotRegistered
                } else {
                    CofferError::TargetNotFound(target.username.clone())
                }
            })?;
        Ok((target, profile))
    }

    pub(super) async fn balance(&self, inv: &Invocation) -> Result<Reply> {
        let (target, profile) = self.target_profile(inv).await?;
        let own = target.id == inv.user_id;

        let embed = Embed::new(
            if own {
                "Your Balance".to_string()
            } else {
                format!("{}'s Balance", target.username)
            },
            colors::INFO,
        )
        .field("💰 Wallet", format_currency(profile.balance), true)
        .field("🏦 Bank", format_currency(profile.bank), true)
        .field("💎 Total Wealth", format_currency(profile.total_wealth()), true)
        .field(
            "📊 Economy Stats",
            format!(
                "**Level:** {}\n**Commands Used:** {}",
                profile.level,
                format_number(profile.commands_used)
            ),
            false,
        )
        .footer(if own {
            "Use /work or /daily to earn more coins!".to_string()
        } else {
            format!("Requested by {}", inv.username)
        })
        .timestamp(Utc::now());

        Ok(Reply::public(embed))
    }

    pub(super) async fn daily(&self, inv: &Invocation, now: DateTime<Utc>) -> Result<Reply> {
        let claim = self
            .economy
            .claim_daily(&inv.user_id, &inv.guild_id, now)
            .await?;
        let reward = claim.reward;

        let mut lines = vec![format!("{} **Base Reward**", format_currency(reward.amount))];
        if reward.level_bonus > 0 {
            lines.push(format!(
                "(includes {} **Level Bonus** for level {})",
                format_currency(reward.level_bonus),
                claim.profile.level
            ));
        }
        if reward.streak_bonus > 0 {
            lines.push(format!(
                "+{} **Streak Bonus** ({} days)",
                format_currency(reward.streak_bonus),
                reward.streak_days
            ));
        }
        lines.push(String::new());
        lines.push(format!("**Total Earned:** {}", format_currency(reward.total)));
        lines.push(format!("**New Balance:** {}", format_currency(claim.profile.balance)));

        let mut embed = Embed::new("🎁 Daily Reward Claimed!", colors::SUCCESS)
            .description(lines.join("\n"))
            .footer("Come back tomorrow for another reward!")
            .timestamp(now);

        if reward.streak_days > 1 {
            embed = embed.field(
                "🔥 Daily Streak",
                format!(
                    "{} consecutive days!\nKeep it up for bigger bonuses!",
                    reward.streak_days
                ),
                false,
            );
        }

        Ok(Reply::public(embed))
    }

    pub(super) async fn work(&self, inv: &Invocation, now: DateTime<Utc>) -> Result<Reply> {
        let shift = self.economy.work(&inv.user_id, &inv.guild_id, now).await?;
        let reward = shift.reward;

        let mut description = format!(
            "**Job:** {}\n{} {}!",
            reward.job.name,
            reward.flavor.text,
            format_currency(reward.total)
        );
        if reward.flavor.multiplier > 1.0 {
            description.push_str(&format!(
                "\n*({}% bonus)*",
                ((reward.flavor.multiplier - 1.0) * 100.0).round() as i64
            ));
        }
        description.push_str(&format!(
            "\n\n**New Balance:** {}",
            format_currency(shift.profile.balance)
        ));

        let mut embed = Embed::new(format!("{} Work Complete!", reward.job.emoji), colors::SUCCESS)
            .description(description)
            .field(
                "📊 Work Stats",
                format!(
                    "**Level:** {}\n**Level Bonus:** +{}%",
                    shift.profile.level,
                    ((reward.level_multiplier - 1.0) * 100.0).round() as i64
                ),
                true,
            )
            .footer("Keep working to level up and unlock better jobs!")
            .timestamp(now);

        if let Some(item) = reward.bonus_item {
            embed = embed.field(
                "🎁 Bonus Item Found!",
                format!(
                    "You found a **{}** *({})*\nValue: {}",
                    item.name,
                    item.rarity,
                    format_currency(item.value)
                ),
                false,
            );
        }

        if let Some(next) = next_job_unlock(shift.profile.level) {
            embed = embed.field(
                "🔓 Next Job Unlock",
                format!("**{}** {}\nRequires Level {}", next.name, next.emoji, next.min_level),
                true,
            );
        }

        Ok(Reply::public(embed))
    }

    pub(super) async fn inventory(&self, inv: &Invocation) -> Result<Reply> {
        let (target, profile) = self.target_profile(inv).await?;
        let own = target.id == inv.user_id;
        let title = if own {
            "Your Inventory".to_string()
        } else {
            format!("{}'s Inventory", target.username)
        };

        if profile.inventory.is_empty() {
            let embed = Embed::new(title, colors::MUTED)
                .description("🎒 This inventory is empty!\n\nItems can be found while working.");
            return Ok(Reply::public(embed));
        }

        let page = inv.page();
        let sorted = sorted_for_display(&profile.inventory);
        let pages = total_pages(sorted.len(), ITEMS_PER_PAGE);
        let items = paginate(&sorted, page, ITEMS_PER_PAGE);

        let description = if items.is_empty() {
            format!("No items on page {}.", page)
        } else {
            items
                .iter()
                .map(|item| {
                    format!(
                        "{} **{}** ×{}\n*{}* • {}",
                        item.rarity.emoji(),
                        item.name,
                        item.quantity,
                        item.rarity,
                        format_currency(item.value.saturating_mul(item.quantity))
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let breakdown = rarity_breakdown(&profile.inventory)
            .iter()
            .rev()
            .map(|(rarity, count)| format!("{} {} {}", rarity.emoji(), count, rarity))
            .collect::<Vec<_>>()
            .join("\n");

        let mut embed = Embed::new(format!("🎒 {}", title), colors::INVENTORY)
            .description(description)
            .field("📊 Rarity Breakdown", breakdown, true)
            .footer(format!(
                "Page {}/{} | {} unique items | Total value: {}",
                page,
                pages,
                profile.inventory.len(),
                format_currency(total_value(&profile.inventory))
            ));

        if pages > 1 && page < pages {
            let user_arg = if own {
                String::new()
            } else {
                format!(" user:{}", target.username)
            };
            embed = embed.field(
                "📖 Navigation",
                format!("Use `/inventory{} page:{}` for next page", user_arg, page + 1),
                false,
            );
        }

        Ok(Reply::public(embed))
    }
}
