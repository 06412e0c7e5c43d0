//! Per-command invocation cooldowns
//!
//! Separate from the economy cooldowns on daily/work: these throttle how
//! often one user may run one command at all. Entries store the instant the
//! cooldown expires and are dropped by a periodic sweep.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct CommandCooldowns {
    expires: DashMap<(String, String), Instant>,
}

impl CommandCooldowns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an invocation of `command` by `user_id` at `now`.
    ///
    /// Returns the time left when the previous invocation's window is still
    /// open; the stored expiry is left untouched in that case.
    pub fn check_and_record(
        &self,
        command: &str,
        user_id: &str,
        window: Duration,
        now: Instant,
    ) -> Result<(), Duration> {
        match self.expires.entry((command.to_string(), user_id.to_string())) {
            Entry::Occupied(mut entry) => {
                let expires_at = *entry.get();
                if now < expires_at {
                    return Err(expires_at - now);
                }
                entry.insert(now + window);
                Ok(())
            }
            Entry::Vacant(entry) => {
                entry.insert(now + window);
                Ok(())
            }
        }
    }

    /// Drop expired entries, returning how many were removed
    pub fn sweep(&self, now: Instant) -> usize {
        let before = self.expires.len();
        self.expires.retain(|_, expires_at| *expires_at > now);
        before.saturating_sub(self.expires.len())
    }

    pub fn len(&self) -> usize {
        self.expires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expires.is_empty()
    }
}

/// Periodically sweep expired cooldowns
pub fn spawn_sweep_task(cooldowns: Arc<CommandCooldowns>, interval: Duration) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let removed = cooldowns.sweep(Instant::now());
            if removed > 0 {
                debug!("Command cooldown sweep: removed {} expired entries", removed);
            }
        }
    });
    info!("Command cooldown sweep task started ({}s)", interval.as_secs());
}
