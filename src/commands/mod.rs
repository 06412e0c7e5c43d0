//! Command table and dispatch
//!
//! Inbound interactions are parsed into an [`Invocation`] by the server and
//! handed to the [`Dispatcher`], which enforces the per-command
//! preconditions from [`COMMANDS`] before running the handler.

mod admin;
pub mod cooldowns;
mod dispatch;
mod economy;
mod general;
pub mod reply;

pub use cooldowns::{spawn_sweep_task, CommandCooldowns};
pub use dispatch::{DispatchSettings, Dispatcher};
pub use reply::{Embed, EmbedField, Reply};

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::notify::FollowupTarget;

/// Help grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Economy,
    General,
    Admin,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::General => "general",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "economy" => Ok(Self::Economy),
            "general" => Ok(Self::General),
            "admin" => Ok(Self::Admin),
            other => Err(format!("unknown help category: {}", other)),
        }
    }
}

/// Who may run a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Anyone,
    /// Only callers without a profile
    Unregistered,
    Registered,
    Operator,
}

#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub access: Access,
    pub cooldown: Option<Duration>,
}

pub static COMMANDS: [CommandSpec; 10] = [
    CommandSpec {
        name: "register",
        usage: "/register",
        description: "Create your economy account to start earning and leveling up!",
        category: Category::General,
        access: Access::Unregistered,
        cooldown: None,
    },
    CommandSpec {
        name: "balance",
        usage: "/balance [user]",
        description: "Check your current balance and wealth stats. Optionally view another user's balance.",
        category: Category::Economy,
        access: Access::Registered,
        cooldown: None,
    },
    CommandSpec {
        name: "daily",
        usage: "/daily",
        description: "Claim your daily reward! Higher levels get bigger bonuses. (24 hour cooldown)",
        category: Category::Economy,
        access: Access::Registered,
        cooldown: None,
    },
    CommandSpec {
        name: "work",
        usage: "/work",
        description: "Work various jobs to earn money. Better jobs unlock as you level up! (5 minute cooldown)",
        category: Category::Economy,
        access: Access::Registered,
        cooldown: Some(Duration::from_secs(5)),
    },
    CommandSpec {
        name: "inventory",
        usage: "/inventory [user] [page]",
        description: "View your collected items and their values. Some items can be found while working!",
        category: Category::Economy,
        access: Access::Registered,
        cooldown: Some(Duration::from_secs(3)),
    },
    CommandSpec {
        name: "leaderboard",
        usage: "/leaderboard <type> [page]",
        description: "View server rankings by balance, level or commands used.",
        category: Category::General,
        access: Access::Registered,
        cooldown: Some(Duration::from_secs(3)),
    },
    CommandSpec {
        name: "profile",
        usage: "/profile [user]",
        description: "View level, XP, wealth and activity stats.",
        category: Category::General,
        access: Access::Registered,
        cooldown: None,
    },
    CommandSpec {
        name: "help",
        usage: "/help [category]",
        description: "Display help. Use the category option for command details.",
        category: Category::General,
        access: Access::Anyone,
        cooldown: Some(Duration::from_secs(3)),
    },
    CommandSpec {
        name: "announce",
        usage: "/announce <message> [preview]",
        description: "Create a bot announcement delivered to users when they use commands.",
        category: Category::Admin,
        access: Access::Operator,
        cooldown: None,
    },
    CommandSpec {
        name: "manage-announcements",
        usage: "/manage-announcements <list|enable|disable|stats> [id]",
        description: "List announcements, toggle their status or view delivery statistics.",
        category: Category::Admin,
        access: Access::Operator,
        cooldown: None,
    },
];

pub fn find_command(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

pub fn commands_in(category: Category) -> impl Iterator<Item = &'static CommandSpec> {
    COMMANDS.iter().filter(move |spec| spec.category == category)
}

/// A user referenced by a command option
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    User(UserRef),
}

/// One command invocation, independent of the transport it arrived on
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: String,
    pub subcommand: Option<String>,
    pub user_id: String,
    pub username: String,
    pub guild_id: String,
    pub options: HashMap<String, OptionValue>,
    /// Where deferred messages for this invocation go
    pub followup: Option<FollowupTarget>,
}

impl Invocation {
    pub fn new(
        command: impl Into<String>,
        user_id: impl Into<String>,
        username: impl Into<String>,
        guild_id: impl Into<String>,
    ) -> Self {
        Self {
            command: command.into(),
            subcommand: None,
            user_id: user_id.into(),
            username: username.into(),
            guild_id: guild_id.into(),
            options: HashMap::new(),
            followup: None,
        }
    }

    pub fn with_subcommand(mut self, name: impl Into<String>) -> Self {
        self.subcommand = Some(name.into());
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    pub fn with_followup(mut self, target: FollowupTarget) -> Self {
        self.followup = Some(target);
        self
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.options.get(name) {
            Some(OptionValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.options.get(name) {
            Some(OptionValue::Integer(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.options.get(name) {
            Some(OptionValue::Boolean(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn user(&self, name: &str) -> Option<&UserRef> {
        match self.options.get(name) {
            Some(OptionValue::User(u)) => Some(u),
            _ => None,
        }
    }

    /// The `user` option, or the caller
    pub fn target(&self) -> UserRef {
        self.user("user").cloned().unwrap_or_else(|| UserRef {
            id: self.user_id.clone(),
            username: self.username.clone(),
        })
    }

    /// The `page` option clamped to 1..=100
    pub fn page(&self) -> usize {
        self.integer("page").unwrap_or(1).clamp(1, 100) as usize
    }
}
