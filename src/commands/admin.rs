//! Operator command handlers: announce, manage-announcements

use chrono::{DateTime, Utc};

use super::reply::{colors, error_embed, success_embed, Embed, Reply};
use super::{Dispatcher, Invocation};
use crate::types::{CofferError, Result};

/// Announcements shown by `manage-announcements list`
const LIST_LIMIT: usize = 10;

/// Content characters shown per listed announcement
const PREVIEW_CHARS: usize = 50;

impl Dispatcher {
    pub(super) async fn announce(&self, inv: &Invocation, now: DateTime<Utc>) -> Result<Reply> {
        let message = inv
            .string("message")
            .ok_or_else(|| CofferError::BadRequest("The `message` option is required".into()))?;

        if inv.boolean("preview").unwrap_or(false) {
            let embed = Embed::new("📢 Bot Announcement (PREVIEW)", colors::ANNOUNCEMENT)
                .description(message)
                .footer("This is a preview - use announce without preview:true to send it")
                .timestamp(now);
            return Ok(Reply::ephemeral(embed));
        }

        let announcement = self.broadcaster.create(&inv.user_id, message, now).await?;

        let embed = success_embed(
            "Announcement Created",
            format!(
                "Your announcement `{}` has been created successfully!\n\n**Preview:**\n{}\n\n\
                 It will be automatically delivered to users when they use commands.",
                announcement.short_id(),
                announcement.content
            ),
        )
        .field(
            "📊 Delivery Info",
            "Each user sees it once, as a follow-up to their next command.",
            false,
        );
        Ok(Reply::ephemeral(embed))
    }

    pub(super) async fn manage_announcements(
        &self,
        inv: &Invocation,
        now: DateTime<Utc>,
    ) -> Result<Reply> {
        let id = || {
            inv.string("id")
                .ok_or_else(|| CofferError::BadRequest("The `id` option is required".into()))
        };

        match inv.subcommand.as_deref() {
            Some("list") => self.list_announcements().await,
            Some("enable") => {
                let announcement = self.broadcaster.enable(id()?).await?;
                Ok(Reply::ephemeral(success_embed(
                    "Announcement Enabled",
                    format!(
                        "Announcement `{}` has been enabled and will be delivered to users who haven't seen it.",
                        announcement.short_id()
                    ),
                )))
            }
            Some("disable") => {
                let announcement = self.broadcaster.disable(id()?).await?;
                Ok(Reply::ephemeral(success_embed(
                    "Announcement Disabled",
                    format!(
                        "Announcement `{}` has been disabled and will no longer be delivered to users.",
                        announcement.short_id()
                    ),
                )))
            }
            Some("stats") => {
                let stats = self.broadcaster.stats(id()?, now).await?;
                let a = &stats.announcement;
                let embed = Embed::new("📊 Announcement Statistics", colors::INFO)
                    .description(format!("**Full ID:** `{}`", a.id))
                    .field("📢 Content", a.content.clone(), false)
                    .field(
                        "📊 Delivery Stats",
                        format!(
                            "**Status:** {}\n**Created:** {}\n**Age:** {} days\n**Delivered to:** {} users",
                            status_badge(a.is_active),
                            a.created_at.format("%a %b %d %Y"),
                            stats.age.num_days(),
                            stats.delivered_count
                        ),
                        false,
                    )
                    .timestamp(now);
                Ok(Reply::ephemeral(embed))
            }
            Some(other) => Err(CofferError::BadRequest(format!(
                "Unknown subcommand `{}`",
                other
            ))),
            None => Err(CofferError::BadRequest(
                "Choose one of list, enable, disable or stats".into(),
            )),
        }
    }

    async fn list_announcements(&self) -> Result<Reply> {
        let announcements = self.broadcaster.list_recent(LIST_LIMIT).await?;
        if announcements.is_empty() {
            return Ok(Reply::ephemeral(error_embed(
                "No Announcements",
                "There are no announcements in the database.",
            )));
        }

        let description = announcements
            .iter()
            .map(|a| {
                format!(
                    "**ID:** `{}`\n**Status:** {}\n**Created:** {}\n**Delivered to:** {} users\n**Preview:** {}",
                    a.short_id(),
                    status_badge(a.is_active),
                    a.created_at.format("%a %b %d %Y"),
                    a.delivered_count(),
                    a.preview(PREVIEW_CHARS)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let embed = Embed::new("📢 Announcement Management", colors::INFO)
            .description(description)
            .footer(format!("Showing up to {} most recent announcements", LIST_LIMIT))
            .timestamp(Utc::now());
        Ok(Reply::ephemeral(embed))
    }
}

fn status_badge(active: bool) -> &'static str {
    if active {
        "🟢 Active"
    } else {
        "🔴 Disabled"
    }
}
