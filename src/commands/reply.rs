//! Reply rendering
//!
//! Replies are lists of embeds in the chat platform's wire shape. Only
//! title, description, fields, colour, footer and timestamp are used.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::time::Duration;

/// Message flag marking a reply visible only to the caller
pub const EPHEMERAL_FLAG: u64 = 1 << 6;

pub mod colors {
    pub const SUCCESS: u32 = 0x00ff00;
    pub const ERROR: u32 = 0xff0000;
    pub const INFO: u32 = 0x0099ff;
    pub const GOLD: u32 = 0xffd700;
    pub const INVENTORY: u32 = 0x9b59b6;
    pub const MUTED: u32 = 0x999999;
    pub const ANNOUNCEMENT: u32 = 0xffaa00;
    pub const ADMIN: u32 = 0xff6600;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    /// RFC 3339
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl Embed {
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            description: None,
            color,
            fields: Vec::new(),
            footer: None,
            timestamp: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at.to_rfc3339());
        self
    }

    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

pub fn error_embed(title: &str, description: impl Into<String>) -> Embed {
    Embed::new(format!("❌ {}", title), colors::ERROR).description(description)
}

pub fn success_embed(title: &str, description: impl Into<String>) -> Embed {
    Embed::new(format!("✅ {}", title), colors::SUCCESS).description(description)
}

pub fn info_embed(title: &str, description: impl Into<String>) -> Embed {
    Embed::new(format!("ℹ️ {}", title), colors::INFO).description(description)
}

/// One reply to an interaction
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub embeds: Vec<Embed>,
    pub ephemeral: bool,
}

impl Reply {
    pub fn public(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ephemeral: false,
        }
    }

    pub fn ephemeral(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ephemeral: true,
        }
    }

    pub fn push(&mut self, embed: Embed) {
        self.embeds.push(embed);
    }

    pub fn first(&self) -> Option<&Embed> {
        self.embeds.first()
    }

    /// The `data` object of a message response or follow-up
    pub fn to_message_data(&self) -> Value {
        let mut data = json!({ "embeds": self.embeds });
        if self.ephemeral {
            data["flags"] = json!(EPHEMERAL_FLAG);
        }
        data
    }
}

/// Group digits in threes: `1234567` becomes `1,234,567`
pub fn format_number(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_currency(amount: i64) -> String {
    format!("💰 {} coins", format_number(amount))
}

/// Coarse human duration: `1d 2h 3m`, `2h 3m 4s`, `3m 4s` or `4s`
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if days > 0 {
        format!("{}d {}h {}m", days, hours % 24, minutes % 60)
    } else if hours > 0 {
        format!("{}h {}m {}s", hours, minutes % 60, seconds % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}

/// `[█████░░░░░] 50%`
pub fn progress_bar(current: i64, max: i64, length: usize) -> String {
    let ratio = if max <= 0 {
        1.0
    } else {
        (current.max(0) as f64 / max as f64).min(1.0)
    };
    let filled = ((ratio * length as f64).floor() as usize).min(length);
    format!(
        "[{}{}] {}%",
        "█".repeat(filled),
        "░".repeat(length - filled),
        (ratio * 100.0).floor() as i64
    )
}

/// Leaderboard rank marker
pub fn medal(rank: usize) -> String {
    match rank {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("**{}.**", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_groups() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(-4200), "-4,200");
        assert_eq!(format_currency(1500), "💰 1,500 coins");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(299)), "4m 59s");
        assert_eq!(format_duration(Duration::from_secs(3 * 3600 + 61)), "3h 1m 1s");
        assert_eq!(format_duration(Duration::from_secs(86_399)), "23h 59m 59s");
        assert_eq!(format_duration(Duration::from_secs(90_000)), "1d 1h 0m");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(50, 100, 10), "[█████░░░░░] 50%");
        assert_eq!(progress_bar(0, 100, 10), "[░░░░░░░░░░] 0%");
        assert_eq!(progress_bar(500, 100, 10), "[██████████] 100%");
    }

    #[test]
    fn test_ephemeral_flag_in_message_data() {
        let reply = Reply::ephemeral(error_embed("Nope", "not allowed"));
        let data = reply.to_message_data();
        assert_eq!(data["flags"], 64);
        assert_eq!(data["embeds"][0]["title"], "❌ Nope");
        assert_eq!(data["embeds"][0]["color"], 0xff0000);

        let public = Reply::public(info_embed("Hi", "there")).to_message_data();
        assert!(public.get("flags").is_none());
        assert!(public["embeds"][0].get("fields").is_none());
    }
}
