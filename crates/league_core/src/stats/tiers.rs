//! Achievement tiers.
//!
//! Four metric categories are evaluated independently per player, each
//! against its own four ascending thresholds. Tier membership is the highest
//! threshold at or below the metric value; there is no interpolation.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

pub const TIER_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    GamesPlayed,
    Wins,
    Mvps,
    WinStreak,
}

impl MetricCategory {
    pub fn label(&self) -> &'static str {
        match self {
            MetricCategory::GamesPlayed => "Games Played",
            MetricCategory::Wins => "Wins",
            MetricCategory::Mvps => "MVPs",
            MetricCategory::WinStreak => "Win Streak",
        }
    }
}

/// Four strictly increasing thresholds for one metric category. Purely
/// derived configuration, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTable {
    pub category: MetricCategory,
    pub thresholds: [u32; TIER_COUNT],
}

/// Where a metric value sits within a tier table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierStatus {
    /// Achieved tier, 1-4, or `None` when the value is below the first
    /// threshold.
    pub tier: Option<u8>,
    /// Threshold of the next tier, absent at the top tier.
    pub next_threshold: Option<u32>,
    /// Progress toward the next tier as a 0.0-1.0 fraction; 1.0 at the top
    /// tier.
    pub progress: f32,
}

impl TierStatus {
    pub fn percent(&self) -> f32 {
        self.progress * 100.0
    }
}

impl TierTable {
    pub fn new(category: MetricCategory, thresholds: [u32; TIER_COUNT]) -> Self {
        debug_assert!(
            thresholds.windows(2).all(|w| w[0] < w[1]),
            "tier thresholds must be strictly increasing"
        );
        Self { category, thresholds }
    }

    /// The achieved tier is the highest threshold `t <= value`. Progress
    /// toward the next tier is `min(value / next, 1.0)`; a player at the
    /// top tier reports 100% and no next threshold.
    pub fn status(&self, value: u32) -> TierStatus {
        let achieved = self
            .thresholds
            .iter()
            .rposition(|t| *t <= value)
            .map(|idx| (idx + 1) as u8);

        let next_threshold = match achieved {
            Some(t) if (t as usize) < TIER_COUNT => Some(self.thresholds[t as usize]),
            Some(_) => None,
            None => Some(self.thresholds[0]),
        };

        let progress = match next_threshold {
            Some(next) if next > 0 => (value as f32 / next as f32).min(1.0),
            Some(_) => 1.0,
            None => 1.0,
        };

        TierStatus { tier: achieved, next_threshold, progress }
    }
}

/// Built-in tier tables, one per metric category.
pub static DEFAULT_TIER_TABLES: Lazy<[TierTable; 4]> = Lazy::new(|| {
    [
        TierTable::new(MetricCategory::GamesPlayed, [5, 15, 30, 50]),
        TierTable::new(MetricCategory::Wins, [3, 10, 25, 40]),
        TierTable::new(MetricCategory::Mvps, [1, 5, 15, 30]),
        TierTable::new(MetricCategory::WinStreak, [3, 5, 10, 15]),
    ]
});

pub fn table_for(category: MetricCategory) -> &'static TierTable {
    DEFAULT_TIER_TABLES
        .iter()
        .find(|t| t.category == category)
        .expect("every category has a built-in table")
}
