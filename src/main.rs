//! Coffer - economy bot served over HTTP interactions

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coffer::{
    announcements::Broadcaster,
    commands::{spawn_sweep_task, CommandCooldowns, Dispatcher},
    config::Args,
    db::MongoClient,
    economy::Economy,
    notify::WebhookFollowups,
    server::{self, interactions::parse_public_key},
    store::{
        AnnouncementStore, MemoryAnnouncementStore, MemoryProfileStore, MongoAnnouncementStore,
        MongoProfileStore, ProfileStore,
    },
};

type Stores = (Arc<dyn ProfileStore>, Arc<dyn AnnouncementStore>);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("coffer={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Coffer - community economy bot");
    info!("======================================");
    info!("Version: {} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_COMMIT_SHORT"));
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {}", args.mongodb_uri);
    info!(
        "Operator: {}",
        args.bot_owner_id.as_deref().unwrap_or("(none, operator commands disabled)")
    );
    info!(
        "Announcement channel: {}",
        args.announcement_channel_id.as_deref().unwrap_or("(none)")
    );
    info!("======================================");

    let (profiles, announcements) = match connect_stores(&args).await {
        Ok(stores) => stores,
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB unavailable (dev mode, using in-memory storage): {}", e);
                (
                    Arc::new(MemoryProfileStore::new()) as Arc<dyn ProfileStore>,
                    Arc::new(MemoryAnnouncementStore::new()) as Arc<dyn AnnouncementStore>,
                )
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let verifying_key = match args.public_key.as_deref().map(parse_public_key).transpose() {
        Ok(key) => key,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let economy = Arc::new(Economy::new(profiles, args.economy_config()));
    let broadcaster = Arc::new(Broadcaster::new(
        announcements,
        args.bot_owner_id.clone(),
        args.announcement_channel_id.clone(),
    ));

    let cooldowns = Arc::new(CommandCooldowns::new());
    spawn_sweep_task(Arc::clone(&cooldowns), args.cooldown_sweep_interval());

    let followups = Arc::new(WebhookFollowups::new(&args.api_base));

    let dispatcher = Arc::new(Dispatcher::new(
        economy,
        broadcaster,
        cooldowns,
        followups,
        args.dispatch_settings(),
    ));

    let state = Arc::new(server::AppState::new(args, dispatcher, verifying_key));

    tokio::select! {
        result = server::run(state) => {
            if let Err(e) = result {
                error!("Server error: {:?}", e);
                std::process::exit(1);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping");
        }
    }

    Ok(())
}

async fn connect_stores(args: &Args) -> coffer::Result<Stores> {
    let client = MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await?;
    info!("MongoDB connected successfully");

    let profiles = MongoProfileStore::new(&client).await?;
    let announcements = MongoAnnouncementStore::new(&client).await?;
    Ok((Arc::new(profiles), Arc::new(announcements)))
}
