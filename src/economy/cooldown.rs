//! Cooldown gate for timestamped actions
//!
//! An absent timestamp is never on cooldown. Otherwise the action is gated
//! while `now - last_used < window`.

use chrono::{DateTime, Utc};
use std::time::Duration;

fn window_millis(window: Duration) -> i64 {
    i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
}

/// Whether an action last used at `last_used` is still gated at `now`
pub fn is_on_cooldown_at(
    last_used: Option<DateTime<Utc>>,
    window: Duration,
    now: DateTime<Utc>,
) -> bool {
    match last_used {
        None => false,
        Some(last) => {
            let elapsed = now.signed_duration_since(last).num_milliseconds();
            elapsed < window_millis(window)
        }
    }
}

/// Time left before the action is allowed again at `now`
pub fn remaining_at(
    last_used: Option<DateTime<Utc>>,
    window: Duration,
    now: DateTime<Utc>,
) -> Duration {
    match last_used {
        None => Duration::ZERO,
        Some(last) => {
            let elapsed = now.signed_duration_since(last).num_milliseconds();
            let left = window_millis(window).saturating_sub(elapsed).max(0);
            Duration::from_millis(left as u64)
        }
    }
}

/// [`is_on_cooldown_at`] against the wall clock
pub fn is_on_cooldown(last_used: Option<DateTime<Utc>>, window: Duration) -> bool {
    is_on_cooldown_at(last_used, window, Utc::now())
}

/// [`remaining_at`] against the wall clock
pub fn remaining(last_used: Option<DateTime<Utc>>, window: Duration) -> Duration {
    remaining_at(last_used, window, Utc::now())
}
