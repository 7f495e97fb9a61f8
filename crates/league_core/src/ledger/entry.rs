use crate::models::Score;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The acting user stamped into every ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
}

impl Actor {
    pub fn new(id: &str, name: &str) -> Self {
        Self { id: id.to_string(), name: name.to_string() }
    }
}

/// Closed enumeration of every mutating action the ledger records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    PlayerAdded,
    PlayerUpdated,
    PlayerDeleted,
    RatingAdded,
    RatingUpdated,
    MatchSaved,
    MatchCompleted,
    RematchCreated,
    TeamsGenerated,
    LeaderboardReset,
    LogDeleted,
}

impl ActionKind {
    /// Whether the reversal dispatcher accepts this kind. Everything else
    /// either has no well-defined inverse or is session-scoped.
    pub fn is_undoable(&self) -> bool {
        matches!(
            self,
            ActionKind::PlayerAdded
                | ActionKind::RatingAdded
                | ActionKind::RatingUpdated
                | ActionKind::MatchSaved
                | ActionKind::MatchCompleted
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::PlayerAdded => "player added",
            ActionKind::PlayerUpdated => "player updated",
            ActionKind::PlayerDeleted => "player deleted",
            ActionKind::RatingAdded => "rating added",
            ActionKind::RatingUpdated => "rating updated",
            ActionKind::MatchSaved => "match saved",
            ActionKind::MatchCompleted => "match completed",
            ActionKind::RematchCreated => "rematch created",
            ActionKind::TeamsGenerated => "teams generated",
            ActionKind::LeaderboardReset => "leaderboard reset",
            ActionKind::LogDeleted => "log entry deleted",
        }
    }
}

/// Per-kind payload captured at action time.
///
/// Match payloads snapshot the rosters, score and MVP as they were saved, so
/// a later reversal works from the ledger's own record even if the stored
/// match drifted afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionDetails {
    Player {
        name: String,
        /// Reviewer of the rating submission that created the player, when
        /// the player was created through a rating rather than an explicit
        /// add.
        #[serde(default)]
        reviewer_id: Option<String>,
    },
    Rating {
        player: String,
        reviewer_id: String,
    },
    Match {
        team_a: Vec<String>,
        team_b: Vec<String>,
        score: Score,
        #[serde(default)]
        mvp: Option<String>,
    },
    Matchup {
        team_a: Vec<String>,
        team_b: Vec<String>,
    },
    Teams {
        team_count: usize,
        team_size: u8,
    },
    Reset,
    Deleted {
        reversed_action: ActionKind,
        #[serde(default)]
        player: Option<String>,
        summary: String,
    },
}

/// One record of a mutating action. Immutable once appended; consumed
/// (removed) only by a successful reversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub action: ActionKind,
    pub details: ActionDetails,
    pub actor_id: String,
    pub actor_name: String,
    pub timestamp: DateTime<Utc>,
    pub undoable: bool,
}

impl LedgerEntry {
    pub fn new(action: ActionKind, details: ActionDetails, actor: &Actor) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            action,
            details,
            actor_id: actor.id.clone(),
            actor_name: actor.name.clone(),
            timestamp: Utc::now(),
            undoable: action.is_undoable(),
        }
    }
}
