use super::name::NameKey;
use crate::error::{LeagueError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Final score of a match. `a` belongs to the first roster, `b` to the
/// second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub a: u32,
    pub b: u32,
}

impl Score {
    pub fn new(a: u32, b: u32) -> Self {
        Self { a, b }
    }

    pub fn is_tie(&self) -> bool {
        self.a == self.b
    }

    /// The same score seen from the opposite side assignment.
    pub fn swapped(&self) -> Self {
        Self { a: self.b, b: self.a }
    }
}

/// Which roster a player was on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

/// How a match ended for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticipantOutcome {
    Win,
    Loss,
    Tie,
}

/// Lifecycle of a saved match.
///
/// Matches are appended once and never physically removed; a reversal flips
/// the record to `Voided` while `played_at` keeps the original date, so
/// chronological folds are unaffected by when the voiding happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MatchLifecycle {
    Active,
    Voided { reason: String, voided_at: DateTime<Utc>, voided_by: String },
}

/// Canonical in-memory match shape. Every component operates on this; the
/// two persisted shapes are converted exactly once by [`RawMatch::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
    pub score: Score,
    pub mvp: Option<String>,
    pub team_size: u8,
    pub played_at: DateTime<Utc>,
    pub lifecycle: MatchLifecycle,
    /// Set by the leaderboard aggregator when this record's deltas have been
    /// applied, making `record_match` idempotent.
    #[serde(default)]
    pub processed: bool,
}

impl MatchRecord {
    pub fn is_active(&self) -> bool {
        matches!(self.lifecycle, MatchLifecycle::Active)
    }

    pub fn roster(&self, side: Side) -> &[String] {
        match side {
            Side::A => &self.team_a,
            Side::B => &self.team_b,
        }
    }

    /// The winning side, or `None` for a tie.
    pub fn winner(&self) -> Option<Side> {
        match self.score.a.cmp(&self.score.b) {
            std::cmp::Ordering::Greater => Some(Side::A),
            std::cmp::Ordering::Less => Some(Side::B),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn side_of(&self, key: &NameKey) -> Option<Side> {
        if self.team_a.iter().any(|n| &NameKey::new(n) == key) {
            Some(Side::A)
        } else if self.team_b.iter().any(|n| &NameKey::new(n) == key) {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn contains(&self, key: &NameKey) -> bool {
        self.side_of(key).is_some()
    }

    /// Win/loss/tie from one participant's perspective; `None` when the
    /// player was not on either roster. A participation counts as a win iff
    /// the player's roster strictly outscored the other.
    pub fn outcome_for(&self, key: &NameKey) -> Option<ParticipantOutcome> {
        let side = self.side_of(key)?;
        Some(match self.winner() {
            None => ParticipantOutcome::Tie,
            Some(w) if w == side => ParticipantOutcome::Win,
            Some(_) => ParticipantOutcome::Loss,
        })
    }

    pub fn mvp_key(&self) -> Option<NameKey> {
        self.mvp.as_deref().map(NameKey::new).filter(|k| !k.is_empty())
    }

    /// Flips the record to `Voided`, preserving `played_at`.
    pub fn void(&mut self, reason: &str, voided_by: &str, voided_at: DateTime<Utc>) {
        self.lifecycle = MatchLifecycle::Voided {
            reason: reason.to_string(),
            voided_at,
            voided_by: voided_by.to_string(),
        };
    }

    /// Compares this record's rosters against a (team_a, team_b) pair by
    /// canonical-key set equality, on both possible side assignments.
    /// Returns `Some(swapped)` on a match, where `swapped` indicates the
    /// pair matched with sides exchanged.
    pub fn rosters_match(&self, team_a: &[String], team_b: &[String]) -> Option<bool> {
        let own_a = roster_keys(&self.team_a);
        let own_b = roster_keys(&self.team_b);
        let other_a = roster_keys(team_a);
        let other_b = roster_keys(team_b);

        if own_a == other_a && own_b == other_b {
            Some(false)
        } else if own_a == other_b && own_b == other_a {
            Some(true)
        } else {
            None
        }
    }
}

/// Canonical-key set for a roster.
pub fn roster_keys(roster: &[String]) -> BTreeSet<NameKey> {
    roster.iter().map(|n| NameKey::new(n)).filter(|k| !k.is_empty()).collect()
}

/// Stable chronological ordering by original match date. Stability matters:
/// records sharing a date keep their insertion order, so voiding an entry
/// never reorders its neighbours.
pub fn sort_chronologically(history: &mut [MatchRecord]) {
    history.sort_by_key(|m| m.played_at);
}

// ============================================================================
// Raw persisted shapes and normalization
// ============================================================================

/// A score cell as found in stored documents: either a number or a numeric
/// string, depending on how old the record is.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawPoints {
    Int(i64),
    Text(String),
}

impl RawPoints {
    fn as_u32(&self) -> Option<u32> {
        match self {
            RawPoints::Int(v) => u32::try_from(*v).ok(),
            RawPoints::Text(s) => s.trim().parse::<u32>().ok(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawScore {
    #[serde(default)]
    pub a: Option<RawPoints>,
    #[serde(default)]
    pub b: Option<RawPoints>,
}

/// Fields shared by both historical match shapes, including the scattered
/// soft-delete flags that older records carry instead of a lifecycle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMatchCommon {
    #[serde(default)]
    pub score: Option<RawScore>,
    #[serde(default)]
    pub mvp: Option<String>,
    #[serde(default, alias = "teamSize")]
    pub team_size: Option<u8>,
    #[serde(default, alias = "playedAt", alias = "date")]
    pub played_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub voided: bool,
    #[serde(default, alias = "voidedAt")]
    pub voided_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "voidedBy")]
    pub voided_by: Option<String>,
    #[serde(default, alias = "voidReason", alias = "reason")]
    pub void_reason: Option<String>,
    #[serde(default)]
    pub processed: bool,
}

/// The "team-array" persisted shape: `{ "teams": [rosterA, rosterB], ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTeamArrayMatch {
    pub teams: Vec<Vec<String>>,
    #[serde(flatten)]
    pub common: RawMatchCommon,
}

/// The "named-field" persisted shape: `{ "teamA": [...], "teamB": [...] }`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawNamedTeamsMatch {
    #[serde(alias = "teamA")]
    pub team_a: Vec<String>,
    #[serde(alias = "teamB")]
    pub team_b: Vec<String>,
    #[serde(flatten)]
    pub common: RawMatchCommon,
}

/// Tagged union over the two persisted match shapes. Normalized exactly once
/// at this boundary; nothing deeper in the pipeline branches on shape.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMatch {
    TeamArray(RawTeamArrayMatch),
    NamedTeams(RawNamedTeamsMatch),
}

impl RawMatch {
    /// Converts either persisted shape into the canonical [`MatchRecord`].
    ///
    /// Side-effect free. Fails with a validation error when the score is
    /// missing or unparseable; everything else is defaulted the way legacy
    /// records require: `team_size` inferred from the larger roster (clamped
    /// to 5), blank MVP treated as absent, missing dates pinned to the Unix
    /// epoch so undated legacy rows sort before dated ones.
    pub fn normalize(self) -> Result<MatchRecord> {
        let (team_a, team_b, common) = match self {
            RawMatch::TeamArray(raw) => {
                let mut teams = raw.teams.into_iter();
                let (Some(a), Some(b)) = (teams.next(), teams.next()) else {
                    return Err(LeagueError::Validation(
                        "match requires exactly two rosters".to_string(),
                    ));
                };
                (a, b, raw.common)
            }
            RawMatch::NamedTeams(raw) => (raw.team_a, raw.team_b, raw.common),
        };

        let team_a = clean_roster(team_a);
        let team_b = clean_roster(team_b);

        let score = parse_score(common.score.as_ref())?;

        let team_size = match common.team_size {
            Some(size) => size,
            None => infer_team_size(&team_a, &team_b),
        };

        let mvp = common
            .mvp
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        let played_at = common.played_at.unwrap_or(DateTime::<Utc>::UNIX_EPOCH);

        let lifecycle = if common.voided {
            MatchLifecycle::Voided {
                reason: common.void_reason.unwrap_or_else(|| "voided".to_string()),
                voided_at: common.voided_at.unwrap_or(played_at),
                voided_by: common.voided_by.unwrap_or_default(),
            }
        } else {
            MatchLifecycle::Active
        };

        Ok(MatchRecord {
            team_a,
            team_b,
            score,
            mvp,
            team_size,
            played_at,
            lifecycle,
            processed: common.processed,
        })
    }
}

fn clean_roster(roster: Vec<String>) -> Vec<String> {
    roster
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .collect()
}

fn parse_score(raw: Option<&RawScore>) -> Result<Score> {
    let raw = raw
        .ok_or_else(|| LeagueError::Validation("match score is missing".to_string()))?;

    let parse_side = |points: Option<&RawPoints>, side: &str| -> Result<u32> {
        points
            .ok_or_else(|| {
                LeagueError::Validation(format!("score for team {side} is missing"))
            })?
            .as_u32()
            .ok_or_else(|| {
                LeagueError::Validation(format!("score for team {side} is not a valid integer"))
            })
    };

    Ok(Score { a: parse_side(raw.a.as_ref(), "A")?, b: parse_side(raw.b.as_ref(), "B")? })
}

/// Legacy records without an explicit team size: use the larger roster,
/// clamped to 5 to cover old bench-heavy data.
fn infer_team_size(team_a: &[String], team_b: &[String]) -> u8 {
    team_a.len().max(team_b.len()).clamp(1, 5) as u8
}
