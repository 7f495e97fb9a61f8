//! Derived read models: win streaks and achievement tiers.

pub mod streaks;
pub mod tiers;

pub use streaks::{current_win_streak, longest_win_streak};
pub use tiers::{table_for, MetricCategory, TierStatus, TierTable, DEFAULT_TIER_TABLES};

use crate::leaderboard::Leaderboard;
use crate::models::{MatchRecord, NameKey};
use serde::Serialize;

/// One metric category's value and tier placement for a player.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryStatus {
    pub category: MetricCategory,
    pub value: u32,
    pub status: TierStatus,
}

/// The combined per-player read model shown on the achievements screen.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerMilestones {
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub mvps: u32,
    pub longest_streak: u32,
    /// Reported for display only; tier membership in the streak category is
    /// always evaluated against `longest_streak`.
    pub current_streak: u32,
    pub tiers: [CategoryStatus; 4],
}

/// Folds the aggregator counters and the streak engine into the milestone
/// view. `history` must be Active-inclusive and chronologically ordered;
/// voided records are skipped internally.
pub fn milestones_for(
    key: &NameKey,
    leaderboard: &Leaderboard,
    history: &[MatchRecord],
) -> PlayerMilestones {
    let entry = leaderboard.entry_or_default(key);
    let longest_streak = longest_win_streak(key, history);
    let current_streak = current_win_streak(key, history);

    let status = |category: MetricCategory, value: u32| CategoryStatus {
        category,
        value,
        status: table_for(category).status(value),
    };

    PlayerMilestones {
        games_played: entry.games_played(),
        wins: entry.wins,
        losses: entry.losses,
        mvps: entry.mvps,
        longest_streak,
        current_streak,
        tiers: [
            status(MetricCategory::GamesPlayed, entry.games_played()),
            status(MetricCategory::Wins, entry.wins),
            status(MetricCategory::Mvps, entry.mvps),
            status(MetricCategory::WinStreak, longest_streak),
        ],
    }
}
