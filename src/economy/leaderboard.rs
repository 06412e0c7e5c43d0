//! Per-community leaderboards
//!
//! Ranking is a total order by the metric, descending. Ties are broken by
//! user id ascending so that repeated queries always agree.

use std::fmt;
use std::str::FromStr;

use super::Profile;

/// Which metric a leaderboard ranks by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeaderboardKind {
    /// Wallet balance
    Balance,
    /// Ranked by lifetime XP, displayed as level
    Level,
    /// Commands used
    Commands,
}

impl LeaderboardKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardKind::Balance => "balance",
            LeaderboardKind::Level => "level",
            LeaderboardKind::Commands => "commands",
        }
    }

    /// Stored field the ranking sorts on
    pub fn sort_field(&self) -> &'static str {
        match self {
            LeaderboardKind::Balance => "balance",
            LeaderboardKind::Level => "total_xp",
            LeaderboardKind::Commands => "commands_used",
        }
    }

    fn sort_value(&self, profile: &Profile) -> i64 {
        match self {
            LeaderboardKind::Balance => profile.balance,
            LeaderboardKind::Level => profile.total_xp,
            LeaderboardKind::Commands => profile.commands_used,
        }
    }

    fn display_value(&self, profile: &Profile) -> i64 {
        match self {
            LeaderboardKind::Balance => profile.balance,
            LeaderboardKind::Level => profile.level,
            LeaderboardKind::Commands => profile.commands_used,
        }
    }
}

impl fmt::Display for LeaderboardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaderboardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "balance" => Ok(LeaderboardKind::Balance),
            "level" => Ok(LeaderboardKind::Level),
            "commands" => Ok(LeaderboardKind::Commands),
            other => Err(format!("unknown leaderboard type: {}", other)),
        }
    }
}

/// One ranked row, derived per query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub username: String,
    pub value: i64,
    /// 1-based
    pub rank: usize,
}

/// Rank every profile of a community by `kind`
pub fn rank_profiles(profiles: &[Profile], kind: LeaderboardKind) -> Vec<LeaderboardEntry> {
    let mut ordered: Vec<&Profile> = profiles.iter().collect();
    ordered.sort_by(|a, b| {
        kind.sort_value(b)
            .cmp(&kind.sort_value(a))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    ordered
        .into_iter()
        .enumerate()
        .map(|(i, p)| LeaderboardEntry {
            user_id: p.user_id.clone(),
            username: p.username.clone(),
            value: kind.display_value(p),
            rank: i + 1,
        })
        .collect()
}

/// Find a user's row in a ranked result
pub fn rank_of<'a>(entries: &'a [LeaderboardEntry], user_id: &str) -> Option<&'a LeaderboardEntry> {
    entries.iter().find(|e| e.user_id == user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::paginate;
    use chrono::Utc;

    fn profile(user_id: &str, balance: i64, total_xp: i64, level: i64) -> Profile {
        let mut p = Profile::new(user_id, "g1", user_id, balance, Utc::now());
        p.total_xp = total_xp;
        p.level = level;
        p
    }

    #[test]
    fn test_balance_order_non_increasing() {
        let profiles: Vec<Profile> = (0..25)
            .map(|i| profile(&format!("u{:02}", i), (i * 37 % 11) * 100, 0, 1))
            .collect();
        let ranked = rank_profiles(&profiles, LeaderboardKind::Balance);
        assert_eq!(ranked.len(), 25);
        for pair in ranked.windows(2) {
            assert!(pair[0].value >= pair[1].value);
        }
        for (i, entry) in ranked.iter().enumerate() {
            assert_eq!(entry.rank, i + 1);
        }
    }

    #[test]
    fn test_second_page_has_ranks_11_to_20() {
        let profiles: Vec<Profile> = (0..25)
            .map(|i| profile(&format!("u{:02}", i), 10_000 - i * 10, 0, 1))
            .collect();
        let ranked = rank_profiles(&profiles, LeaderboardKind::Balance);
        let page = paginate(&ranked, 2, 10);
        let ranks: Vec<usize> = page.iter().map(|e| e.rank).collect();
        assert_eq!(ranks, (11..=20).collect::<Vec<_>>());
    }

    #[test]
    fn test_ties_broken_by_user_id() {
        let profiles = vec![
            profile("carol", 500, 0, 1),
            profile("alice", 500, 0, 1),
            profile("bob", 500, 0, 1),
        ];
        let ranked = rank_profiles(&profiles, LeaderboardKind::Balance);
        let order: Vec<&str> = ranked.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(order, vec!["alice", "bob", "carol"]);
    }

    #[test]
    fn test_level_ranks_by_total_xp_shows_level() {
        let profiles = vec![profile("a", 0, 90, 1), profile("b", 0, 400, 3)];
        let ranked = rank_profiles(&profiles, LeaderboardKind::Level);
        assert_eq!(ranked[0].user_id, "b");
        assert_eq!(ranked[0].value, 3);
        assert_eq!(rank_of(&ranked, "a").map(|e| e.rank), Some(2));
        assert!(rank_of(&ranked, "zed").is_none());
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("commands".parse::<LeaderboardKind>(), Ok(LeaderboardKind::Commands));
        assert!("wealth".parse::<LeaderboardKind>().is_err());
    }
}
