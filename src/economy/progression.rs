//! Experience and levelling
//!
//! XP required for the next level grows exponentially:
//! `floor(base_xp * multiplier^(level - 1))`.

use chrono::{DateTime, Utc};

use super::Profile;

/// Level curve and per-command XP
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressionConfig {
    pub base_xp: i64,
    pub multiplier: f64,
    pub xp_per_command: i64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            base_xp: 100,
            multiplier: 1.5,
            xp_per_command: 5,
        }
    }
}

/// XP needed to advance past `level`
pub fn xp_required(level: i64, config: &ProgressionConfig) -> i64 {
    let exponent = i32::try_from(level.saturating_sub(1).max(0)).unwrap_or(i32::MAX);
    let required = (config.base_xp as f64 * config.multiplier.powi(exponent)).floor();
    // `as` saturates on overflow and maps NaN to 0
    required as i64
}

/// Grant XP to a profile. Returns true when a level-up occurred.
///
/// At most one level is gained per grant, even when `amount` crosses
/// several thresholds; the surplus stays in `xp` and counts towards the
/// following level on the next grant.
pub fn add_xp(
    profile: &mut Profile,
    amount: i64,
    config: &ProgressionConfig,
    now: DateTime<Utc>,
) -> bool {
    let amount = amount.max(0);
    profile.xp = profile.xp.saturating_add(amount);
    profile.total_xp = profile.total_xp.saturating_add(amount);
    profile.last_active = now;

    let required = xp_required(profile.level, config);
    if profile.xp >= required {
        profile.level += 1;
        profile.xp -= required;
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> Profile {
        Profile::new("u1", "g1", "alice", 1000, Utc::now())
    }

    #[test]
    fn test_xp_curve_defaults() {
        let config = ProgressionConfig::default();
        assert_eq!(xp_required(1, &config), 100);
        assert_eq!(xp_required(2, &config), 150);
        assert_eq!(xp_required(3, &config), 225);
        assert_eq!(xp_required(4, &config), 337);
        assert_eq!(xp_required(5, &config), 506);
    }

    #[test]
    fn test_xp_curve_formula_and_monotonic() {
        let config = ProgressionConfig::default();
        let mut previous = 0;
        for level in 1..=40 {
            let expected = (100.0 * 1.5f64.powi(level as i32 - 1)).floor() as i64;
            let required = xp_required(level, &config);
            assert_eq!(required, expected, "level {}", level);
            assert!(required > previous, "level {}", level);
            previous = required;
        }
    }

    #[test]
    fn test_grant_below_threshold() {
        let config = ProgressionConfig::default();
        let mut p = profile();
        assert!(!add_xp(&mut p, 40, &config, Utc::now()));
        assert_eq!(p.level, 1);
        assert_eq!(p.xp, 40);
        assert_eq!(p.total_xp, 40);
    }

    #[test]
    fn test_crossing_threshold_levels_once() {
        let config = ProgressionConfig::default();
        let mut p = profile();
        p.xp = 90;
        p.total_xp = 90;
        assert!(add_xp(&mut p, 15, &config, Utc::now()));
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, 90 + 15 - 100);
        assert_eq!(p.total_xp, 105);
    }

    #[test]
    fn test_double_threshold_grant_still_single_level() {
        let config = ProgressionConfig::default();
        let mut p = profile();
        // 100 for level 1 plus 150 for level 2 would be two levels
        assert!(add_xp(&mut p, 250, &config, Utc::now()));
        assert_eq!(p.level, 2);
        assert_eq!(p.xp, 150);
        assert_eq!(p.total_xp, 250);
    }

    #[test]
    fn test_negative_grant_is_ignored() {
        let config = ProgressionConfig::default();
        let mut p = profile();
        p.xp = 10;
        p.total_xp = 10;
        assert!(!add_xp(&mut p, -50, &config, Utc::now()));
        assert_eq!(p.xp, 10);
        assert_eq!(p.total_xp, 10);
    }

    #[test]
    fn test_grant_touches_last_active() {
        let config = ProgressionConfig::default();
        let mut p = profile();
        let later = p.last_active + chrono::Duration::minutes(5);
        add_xp(&mut p, 5, &config, later);
        assert_eq!(p.last_active, later);
    }
}
