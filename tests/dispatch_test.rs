//! Command dispatch against in-memory storage

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use coffer::announcements::Broadcaster;
use coffer::commands::{
    CommandCooldowns, DispatchSettings, Dispatcher, Invocation, OptionValue, Reply,
};
use coffer::economy::{DailyConfig, Economy, EconomyConfig};
use coffer::notify::{FollowupSender, FollowupTarget};
use coffer::store::{MemoryAnnouncementStore, MemoryProfileStore};

const GUILD: &str = "guild-1";
const OWNER: &str = "owner";

/// Captures follow-ups instead of posting them
struct RecordingFollowups {
    tx: mpsc::UnboundedSender<(FollowupTarget, Reply)>,
}

#[async_trait]
impl FollowupSender for RecordingFollowups {
    async fn send(&self, target: &FollowupTarget, reply: &Reply) -> coffer::Result<()> {
        let _ = self.tx.send((target.clone(), reply.clone()));
        Ok(())
    }
}

fn dispatcher() -> (Dispatcher, mpsc::UnboundedReceiver<(FollowupTarget, Reply)>) {
    let config = EconomyConfig {
        daily: DailyConfig {
            level_bonus_per_level: 0,
            ..DailyConfig::default()
        },
        ..EconomyConfig::default()
    };
    let economy = Arc::new(Economy::new(Arc::new(MemoryProfileStore::new()), config));
    let broadcaster = Arc::new(Broadcaster::new(
        Arc::new(MemoryAnnouncementStore::new()),
        Some(OWNER.to_string()),
        None,
    ));
    let (tx, rx) = mpsc::unbounded_channel();
    let dispatcher = Dispatcher::new(
        economy,
        broadcaster,
        Arc::new(CommandCooldowns::new()),
        Arc::new(RecordingFollowups { tx }),
        DispatchSettings {
            announcement_delay: Duration::ZERO,
        },
    );
    (dispatcher, rx)
}

fn invoke(command: &str, user: &str) -> Invocation {
    Invocation::new(command, user, format!("{}-name", user), GUILD)
}

fn followup(token: &str) -> FollowupTarget {
    FollowupTarget {
        application_id: "app".to_string(),
        token: token.to_string(),
    }
}

fn title(reply: &Reply) -> &str {
    reply.first().map(|e| e.title.as_str()).unwrap_or_default()
}

#[tokio::test]
async fn test_register_then_daily_then_cooldown() {
    let (d, _rx) = dispatcher();

    let reply = d.dispatch(&invoke("register", "alice")).await;
    assert_eq!(title(&reply), "🎉 Welcome to the Economy!");
    assert!(!reply.ephemeral);

    let reply = d.dispatch(&invoke("register", "alice")).await;
    assert_eq!(title(&reply), "❌ Already Registered");
    assert!(reply.ephemeral);

    let reply = d.dispatch(&invoke("daily", "alice")).await;
    assert_eq!(title(&reply), "🎁 Daily Reward Claimed!");

    let profile = d.economy().profile("alice", GUILD).await.unwrap();
    assert!((1100..=1500).contains(&profile.balance), "balance {}", profile.balance);
    assert_eq!(profile.commands_used, 1);

    let reply = d.dispatch(&invoke("daily", "alice")).await;
    assert_eq!(title(&reply), "❌ Daily Cooldown");

    // Rejected commands leave the profile alone
    let after = d.economy().profile("alice", GUILD).await.unwrap();
    assert_eq!(after.balance, profile.balance);
    assert_eq!(after.commands_used, 1);
}

#[tokio::test]
async fn test_unregistered_caller_is_told_to_register() {
    let (d, _rx) = dispatcher();

    let reply = d.dispatch(&invoke("balance", "bob")).await;
    assert_eq!(title(&reply), "❌ Registration Required");
    assert!(reply.ephemeral);
    assert!(!d.economy().is_registered("bob", GUILD).await.unwrap());
}

#[tokio::test]
async fn test_balance_of_unregistered_target() {
    let (d, _rx) = dispatcher();
    d.dispatch(&invoke("register", "alice")).await;

    let inv = invoke("balance", "alice").with_option(
        "user",
        OptionValue::User(coffer::commands::UserRef {
            id: "ghost".to_string(),
            username: "Ghost".to_string(),
        }),
    );
    let reply = d.dispatch(&inv).await;
    assert_eq!(title(&reply), "❌ User Not Found");
}

#[tokio::test]
async fn test_command_cooldown_blocks_rapid_reuse() {
    let (d, _rx) = dispatcher();
    d.dispatch(&invoke("register", "alice")).await;

    let reply = d.dispatch(&invoke("work", "alice")).await;
    assert!(title(&reply).ends_with("Work Complete!"), "{}", title(&reply));

    let reply = d.dispatch(&invoke("work", "alice")).await;
    assert_eq!(title(&reply), "❌ Command Cooldown");
}

#[tokio::test]
async fn test_leaderboard_second_page_shows_caller_rank() {
    let (d, _rx) = dispatcher();
    for i in 0..12 {
        d.dispatch(&invoke("register", &format!("user-{:02}", i))).await;
    }

    let inv = invoke("leaderboard", "user-00").with_option("page", OptionValue::Integer(2));
    let reply = d.dispatch(&inv).await;
    let embed = reply.first().unwrap();

    assert_eq!(embed.title, "💰 Richest Users - Page 2");
    let description = embed.description.as_deref().unwrap();
    assert!(description.contains("<@user-10>"));
    assert!(description.contains("<@user-11>"));
    assert!(!description.contains("<@user-09>"));
    assert_eq!(
        embed.field_value("📍 Your Ranking"),
        Some("**Rank 1:** 💰 1,000 coins")
    );
    assert!(embed
        .field_value("📊 Server Stats")
        .unwrap()
        .contains("**Total Registered Users:** 12"));
}

#[tokio::test]
async fn test_leaderboard_page_past_the_end() {
    let (d, _rx) = dispatcher();
    d.dispatch(&invoke("register", "alice")).await;
    d.dispatch(&invoke("register", "bob")).await;

    let inv = invoke("leaderboard", "alice").with_option("page", OptionValue::Integer(3));
    let reply = d.dispatch(&inv).await;
    let embed = reply.first().unwrap();

    assert_eq!(embed.description.as_deref(), Some("No users on page 3."));
    let footer = &embed.footer.as_ref().unwrap().text;
    assert!(!footer.contains("Showing ranks"), "{}", footer);
    assert!(footer.contains("page:1"));
}

#[tokio::test]
async fn test_only_operator_announces() {
    let (d, _rx) = dispatcher();

    let inv = invoke("announce", "alice")
        .with_option("message", OptionValue::String("hello".to_string()));
    let reply = d.dispatch(&inv).await;
    assert_eq!(title(&reply), "❌ Access Denied");
    assert!(d.broadcaster().list_recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_announcement_preview_is_not_stored() {
    let (d, _rx) = dispatcher();

    let inv = invoke("announce", OWNER)
        .with_option("message", OptionValue::String("Maintenance tonight".to_string()))
        .with_option("preview", OptionValue::Boolean(true));
    let reply = d.dispatch(&inv).await;
    assert_eq!(title(&reply), "📢 Bot Announcement (PREVIEW)");
    assert!(reply.ephemeral);
    assert!(d.broadcaster().list_recent(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_announcement_delivered_once_as_followup() {
    let (d, mut rx) = dispatcher();

    let inv = invoke("announce", OWNER)
        .with_option("message", OptionValue::String("Double XP weekend!".to_string()));
    let reply = d.dispatch(&inv).await;
    assert_eq!(title(&reply), "✅ Announcement Created");

    d.dispatch(&invoke("register", "alice")).await;
    d.dispatch(&invoke("balance", "alice").with_followup(followup("tok-1")))
        .await;

    let (target, delivered) = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("announcement follow-up")
        .unwrap();
    assert_eq!(target, followup("tok-1"));
    assert!(delivered.ephemeral);
    assert_eq!(title(&delivered), "📢 Bot Announcement");
    assert_eq!(
        delivered.first().unwrap().description.as_deref(),
        Some("Double XP weekend!")
    );

    // Second command: nothing left to deliver
    d.dispatch(&invoke("profile", "alice").with_followup(followup("tok-2")))
        .await;
    let again = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(again.is_err(), "announcement delivered twice");

    let listed = d.broadcaster().list_recent(10).await.unwrap();
    assert_eq!(listed[0].delivered_count(), 1);
}

#[tokio::test]
async fn test_disabled_announcement_is_not_delivered() {
    let (d, mut rx) = dispatcher();

    d.dispatch(
        &invoke("announce", OWNER).with_option("message", OptionValue::String("old news".into())),
    )
    .await;
    let id = d.broadcaster().list_recent(1).await.unwrap()[0].id.clone();

    let disable = invoke("manage-announcements", OWNER)
        .with_subcommand("disable")
        .with_option("id", OptionValue::String(id[..8].to_string()));
    let reply = d.dispatch(&disable).await;
    assert_eq!(title(&reply), "✅ Announcement Disabled");

    let reply = d.dispatch(&disable).await;
    assert_eq!(title(&reply), "❌ No Change");

    d.dispatch(&invoke("register", "alice")).await;
    d.dispatch(&invoke("balance", "alice").with_followup(followup("tok")))
        .await;
    let delivered = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
    assert!(delivered.is_err());
}

#[tokio::test]
async fn test_manage_announcements_short_prefix() {
    let (d, _rx) = dispatcher();

    let inv = invoke("manage-announcements", OWNER)
        .with_subcommand("stats")
        .with_option("id", OptionValue::String("ab".into()));
    let reply = d.dispatch(&inv).await;
    assert_eq!(title(&reply), "❌ ID Too Short");
}

#[test]
fn test_help_overview_is_public() {
    let (d, _rx) = dispatcher();
    let reply = tokio_test::block_on(d.dispatch(&invoke("help", "anyone")));
    assert_eq!(title(&reply), "🤖 Economy Bot - Help");
    assert!(!reply.ephemeral);
}
