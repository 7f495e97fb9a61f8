//! The per-league document and the operation façade over it.
//!
//! `LeagueSet` is the mutable per-league state as persisted; `League` wraps
//! it together with the activity log and exposes every mutating operation
//! the application performs. Each mutation appends the matching ledger entry
//! so it can later be selectively reversed.

use crate::error::{LeagueError, Result};
use crate::leaderboard::{Leaderboard, LeaderboardEntry};
use crate::ledger::{
    reverse_entry, ActionDetails, ActionKind, ActivityLog, Actor, ReversalOutcome,
};
use crate::models::{
    sort_chronologically, AttributeScores, MatchRecord, NameKey, Player, RawMatch, Score,
    Submission,
};
use crate::stats::{milestones_for, PlayerMilestones};
use crate::balance;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A pending, unsaved pairing produced by team generation or a rematch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
    pub team_size: u8,
}

/// Per-league mutable state, one document per league.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueSet {
    pub players: Vec<Player>,
    /// Pending matchups awaiting scores; cleared or replaced by the next
    /// generation run.
    pub matchups: Vec<Matchup>,
    pub leaderboard: Leaderboard,
    /// Canonical match records, Active or Voided, in append order.
    pub match_history: Vec<MatchRecord>,
    /// Belt vote tallies, voter id to voted player display name.
    #[serde(default)]
    pub belt_votes: HashMap<String, String>,
    /// Current belt holders, belt name to player display name.
    #[serde(default)]
    pub belt_holders: HashMap<String, String>,
}

impl LeagueSet {
    pub fn find_player(&self, key: &NameKey) -> Option<&Player> {
        self.players.iter().find(|p| &p.key() == key)
    }

    pub fn find_player_mut(&mut self, key: &NameKey) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.key() == key)
    }

    pub fn player_index(&self, key: &NameKey) -> Option<usize> {
        self.players.iter().position(|p| &p.key() == key)
    }
}

/// What a rename touched, reported back to the caller so external
/// name-keyed records (user claims) can be updated too.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenameOutcome {
    pub old_name: String,
    pub new_name: String,
    pub matches_rewritten: usize,
    pub belt_records_rewritten: usize,
}

/// One row of the standings view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandingsRow {
    pub name: String,
    pub entry: LeaderboardEntry,
}

/// The league façade: state document plus activity log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub set: LeagueSet,
    pub log: ActivityLog,
}

impl League {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(set: LeagueSet, log: ActivityLog) -> Self {
        Self { set, log }
    }

    // ------------------------------------------------------------------
    // Players and ratings
    // ------------------------------------------------------------------

    /// Adds a player, optionally with the actor's initial rating sheet.
    /// A name already present (case- and whitespace-insensitive) is
    /// rejected before any state changes.
    pub fn add_player(
        &mut self,
        name: &str,
        initial_scores: Option<AttributeScores>,
        actor: &Actor,
    ) -> Result<Player> {
        let key = NameKey::new(name);
        if key.is_empty() {
            return Err(LeagueError::Validation("player name must not be blank".to_string()));
        }
        if self.set.find_player(&key).is_some() {
            return Err(LeagueError::DuplicatePlayer(name.trim().to_string()));
        }

        let mut player = Player::new(name);
        let reviewer_id = if let Some(scores) = initial_scores {
            player.apply_submission(Submission {
                reviewer_id: actor.id.clone(),
                scores,
                submitted_at: Utc::now(),
            });
            Some(actor.id.clone())
        } else {
            None
        };

        self.set.players.push(player.clone());
        self.log.record(
            ActionKind::PlayerAdded,
            ActionDetails::Player { name: player.name.clone(), reviewer_id },
            actor,
        );
        log::info!("added player '{}'", player.name);
        Ok(player)
    }

    /// Records the actor's rating sheet for a player, replacing any prior
    /// sheet from the same reviewer.
    pub fn submit_rating(
        &mut self,
        player_name: &str,
        scores: AttributeScores,
        actor: &Actor,
    ) -> Result<Player> {
        let key = NameKey::new(player_name);
        let player = self
            .set
            .find_player_mut(&key)
            .ok_or_else(|| LeagueError::NotFound(format!("player '{player_name}'")))?;

        let had_prior = player.submission_from(&actor.id).is_some();
        player.apply_submission(Submission {
            reviewer_id: actor.id.clone(),
            scores,
            submitted_at: Utc::now(),
        });
        let snapshot = player.clone();

        let kind = if had_prior { ActionKind::RatingUpdated } else { ActionKind::RatingAdded };
        self.log.record(
            kind,
            ActionDetails::Rating { player: snapshot.name.clone(), reviewer_id: actor.id.clone() },
            actor,
        );
        Ok(snapshot)
    }

    pub fn set_player_active(&mut self, name: &str, active: bool, actor: &Actor) -> Result<Player> {
        let key = NameKey::new(name);
        let player = self
            .set
            .find_player_mut(&key)
            .ok_or_else(|| LeagueError::NotFound(format!("player '{name}'")))?;
        player.active = active;
        let snapshot = player.clone();

        self.log.record(
            ActionKind::PlayerUpdated,
            ActionDetails::Player { name: snapshot.name.clone(), reviewer_id: None },
            actor,
        );
        Ok(snapshot)
    }

    /// Admin delete: removes the player and their leaderboard counters.
    /// Match history is untouched; past matches keep the name.
    pub fn delete_player(&mut self, name: &str, actor: &Actor) -> Result<()> {
        let key = NameKey::new(name);
        let idx = self
            .set
            .player_index(&key)
            .ok_or_else(|| LeagueError::NotFound(format!("player '{name}'")))?;
        let removed = self.set.players.remove(idx);
        self.set.leaderboard.remove(&key);

        self.log.record(
            ActionKind::PlayerDeleted,
            ActionDetails::Player { name: removed.name.clone(), reviewer_id: None },
            actor,
        );
        log::info!("deleted player '{}'", removed.name);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Matches
    // ------------------------------------------------------------------

    /// Saves a match from either persisted raw shape: normalize, apply the
    /// leaderboard deltas, append to history, and ledger the save with the
    /// rosters/score/MVP snapshotted for later reversal.
    pub fn save_match(&mut self, raw: RawMatch, actor: &Actor) -> Result<MatchRecord> {
        let record = raw.normalize()?;
        self.store_match(record, ActionKind::MatchSaved, actor)
    }

    /// Records the score for a pending matchup, consuming it.
    pub fn complete_match(
        &mut self,
        matchup_index: usize,
        score: Score,
        mvp: Option<String>,
        played_at: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<MatchRecord> {
        if matchup_index >= self.set.matchups.len() {
            return Err(LeagueError::NotFound(format!("matchup #{matchup_index}")));
        }
        let matchup = self.set.matchups.remove(matchup_index);

        let record = MatchRecord {
            team_a: matchup.team_a,
            team_b: matchup.team_b,
            score,
            mvp: mvp.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
            team_size: matchup.team_size,
            played_at,
            lifecycle: crate::models::MatchLifecycle::Active,
            processed: false,
        };
        self.store_match(record, ActionKind::MatchCompleted, actor)
    }

    fn store_match(
        &mut self,
        mut record: MatchRecord,
        kind: ActionKind,
        actor: &Actor,
    ) -> Result<MatchRecord> {
        self.set.leaderboard.record_match(&mut record);
        self.set.match_history.push(record.clone());

        self.log.record(
            kind,
            ActionDetails::Match {
                team_a: record.team_a.clone(),
                team_b: record.team_b.clone(),
                score: record.score,
                mvp: record.mvp.clone(),
            },
            actor,
        );
        Ok(record)
    }

    /// Queues a rematch of a played match as a new pending matchup.
    pub fn create_rematch(&mut self, history_index: usize, actor: &Actor) -> Result<Matchup> {
        let source = self
            .set
            .match_history
            .get(history_index)
            .ok_or_else(|| LeagueError::NotFound(format!("match #{history_index}")))?;

        let matchup = Matchup {
            team_a: source.team_a.clone(),
            team_b: source.team_b.clone(),
            team_size: source.team_size,
        };
        self.set.matchups.push(matchup.clone());

        self.log.record(
            ActionKind::RematchCreated,
            ActionDetails::Matchup {
                team_a: matchup.team_a.clone(),
                team_b: matchup.team_b.clone(),
            },
            actor,
        );
        Ok(matchup)
    }

    /// Runs the local fallback partitioner over the active roster and
    /// replaces the pending matchups with the result.
    pub fn generate_teams(&mut self, team_size: usize, actor: &Actor) -> Result<Vec<Matchup>> {
        let active: Vec<Player> =
            self.set.players.iter().filter(|p| p.active).cloned().collect();
        let partition = balance::partition(&active, team_size)?;

        let matchups: Vec<Matchup> = partition
            .matchups
            .iter()
            .map(|(a, b)| Matchup {
                team_a: a.iter().map(|p| p.name.clone()).collect(),
                team_b: b.iter().map(|p| p.name.clone()).collect(),
                team_size: team_size as u8,
            })
            .collect();

        self.set.matchups = matchups.clone();
        self.log.record(
            ActionKind::TeamsGenerated,
            ActionDetails::Teams { team_count: partition.teams.len(), team_size: team_size as u8 },
            actor,
        );
        Ok(matchups)
    }

    /// Starts a fresh season: clears the leaderboard and the match history
    /// together so the aggregate-equals-fold invariant holds on both sides
    /// of the reset. Not reversible.
    pub fn reset_leaderboard(&mut self, actor: &Actor) {
        self.set.leaderboard.clear();
        self.set.match_history.clear();
        self.log.record(ActionKind::LeaderboardReset, ActionDetails::Reset, actor);
        log::info!("leaderboard reset by '{}'", actor.name);
    }

    // ------------------------------------------------------------------
    // Rename
    // ------------------------------------------------------------------

    /// Renames a player everywhere the name is keyed inside this league
    /// document: player record, leaderboard, history rosters and MVP
    /// fields, belt votes and holders. All-or-nothing from the caller's
    /// perspective; the outcome reports what was touched so callers can
    /// update name-keyed records held outside this document (user claims).
    pub fn rename_player(&mut self, old_name: &str, new_name: &str) -> Result<RenameOutcome> {
        let old_key = NameKey::new(old_name);
        let new_key = NameKey::new(new_name);
        if new_key.is_empty() {
            return Err(LeagueError::Validation("new player name must not be blank".to_string()));
        }
        if self.set.player_index(&old_key).is_none() {
            return Err(LeagueError::NotFound(format!("player '{old_name}'")));
        }
        if new_key != old_key && self.set.find_player(&new_key).is_some() {
            return Err(LeagueError::DuplicatePlayer(new_name.trim().to_string()));
        }

        let display = new_name.trim().to_string();
        let old_display = {
            let player = self.set.find_player_mut(&old_key).expect("presence checked above");
            let old_display = player.name.clone();
            player.name = display.clone();
            old_display
        };

        self.set.leaderboard.rename_entry(&old_key, new_key.clone());

        let mut matches_rewritten = 0usize;
        for record in &mut self.set.match_history {
            let mut touched = false;
            for name in record.team_a.iter_mut().chain(record.team_b.iter_mut()) {
                if NameKey::new(name) == old_key {
                    *name = display.clone();
                    touched = true;
                }
            }
            if let Some(mvp) = record.mvp.as_mut() {
                if NameKey::new(mvp) == old_key {
                    *mvp = display.clone();
                    touched = true;
                }
            }
            if touched {
                matches_rewritten += 1;
            }
        }
        for matchup in &mut self.set.matchups {
            for name in matchup.team_a.iter_mut().chain(matchup.team_b.iter_mut()) {
                if NameKey::new(name) == old_key {
                    *name = display.clone();
                }
            }
        }

        let mut belt_records_rewritten = 0usize;
        for target in self.set.belt_votes.values_mut().chain(self.set.belt_holders.values_mut()) {
            if NameKey::new(target) == old_key {
                *target = display.clone();
                belt_records_rewritten += 1;
            }
        }

        log::info!("renamed player '{old_display}' to '{display}'");
        Ok(RenameOutcome {
            old_name: old_display,
            new_name: display,
            matches_rewritten,
            belt_records_rewritten,
        })
    }

    // ------------------------------------------------------------------
    // Reversal
    // ------------------------------------------------------------------

    /// Reverses a single past action through the ledger's compensating
    /// dispatcher. On success the triggering entry is consumed and replaced
    /// by a `log_deleted` entry; the outcome carries the refreshed state
    /// the caller needs for display.
    pub fn reverse(&mut self, entry_id: &str, actor: &Actor) -> Result<ReversalOutcome> {
        reverse_entry(&mut self.set, &mut self.log, entry_id, actor)
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Standings sorted by wins, then fewest losses, then name. Names come
    /// from the player roster where possible so the display spelling wins
    /// over the canonical key.
    pub fn standings(&self) -> Vec<StandingsRow> {
        let mut rows: Vec<StandingsRow> = self
            .set
            .leaderboard
            .iter()
            .map(|(key, entry)| {
                let name = self
                    .set
                    .find_player(key)
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| key.as_str().to_string());
                StandingsRow { name, entry: *entry }
            })
            .collect();
        rows.sort_by(|a, b| {
            b.entry
                .wins
                .cmp(&a.entry.wins)
                .then(a.entry.losses.cmp(&b.entry.losses))
                .then(a.name.cmp(&b.name))
        });
        rows
    }

    /// Match history in stable chronological order, voided records
    /// included in place.
    pub fn history_chronological(&self) -> Vec<MatchRecord> {
        let mut history = self.set.match_history.clone();
        sort_chronologically(&mut history);
        history
    }

    pub fn milestones(&self, player_name: &str) -> Result<PlayerMilestones> {
        let key = NameKey::new(player_name);
        if self.set.find_player(&key).is_none() {
            return Err(LeagueError::NotFound(format!("player '{player_name}'")));
        }
        let history = self.history_chronological();
        Ok(milestones_for(&key, &self.set.leaderboard, &history))
    }

    /// Reconciliation check: the cached leaderboard must equal the pure
    /// fold of Active history, and no player may hold two live submissions
    /// from the same reviewer.
    pub fn check_invariants(&self) -> Result<()> {
        let folded = Leaderboard::full_recompute(&self.set.match_history);
        if !self.set.leaderboard.agrees_with(&folded) {
            return Err(LeagueError::Consistency(
                "leaderboard disagrees with the fold of active match history".to_string(),
            ));
        }

        for player in &self.set.players {
            let mut seen = HashSet::new();
            for submission in &player.submissions {
                if !seen.insert(submission.reviewer_id.as_str()) {
                    return Err(LeagueError::Consistency(format!(
                        "player '{}' holds multiple submissions from reviewer '{}'",
                        player.name, submission.reviewer_id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchLifecycle;
    use serde_json::json;

    fn actor() -> Actor {
        Actor::new("admin-1", "Admin")
    }

    fn raw_match(team_a: &[&str], team_b: &[&str], a: u32, b: u32, day: u32) -> RawMatch {
        serde_json::from_value(json!({
            "teamA": team_a,
            "teamB": team_b,
            "score": {"a": a, "b": b},
            "playedAt": format!("2024-03-{day:02}T18:00:00Z")
        }))
        .unwrap()
    }

    #[test]
    fn duplicate_add_is_rejected_before_mutation() {
        let mut league = League::new();
        league.add_player("Ana", None, &actor()).unwrap();
        let err = league.add_player("  ANA ", None, &actor()).unwrap_err();

        assert!(matches!(err, LeagueError::DuplicatePlayer(_)));
        assert_eq!(league.set.players.len(), 1);
        assert_eq!(league.log.len(), 1);
    }

    #[test]
    fn submit_rating_distinguishes_added_from_updated() {
        let mut league = League::new();
        league.add_player("Ana", None, &actor()).unwrap();

        league.submit_rating("Ana", AttributeScores::from_uniform(7.0), &actor()).unwrap();
        league.submit_rating("Ana", AttributeScores::from_uniform(9.0), &actor()).unwrap();

        let kinds: Vec<ActionKind> = league.log.iter().map(|e| e.action).collect();
        assert_eq!(
            kinds,
            vec![ActionKind::PlayerAdded, ActionKind::RatingAdded, ActionKind::RatingUpdated]
        );

        let player = league.set.find_player(&NameKey::new("ana")).unwrap();
        assert_eq!(player.submissions.len(), 1);
        assert!((player.scores.scoring - 9.0).abs() < 1e-6);
    }

    #[test]
    fn save_match_updates_board_history_and_log() {
        let mut league = League::new();
        let record =
            league.save_match(raw_match(&["Ana"], &["Bo"], 21, 15, 1), &actor()).unwrap();

        assert!(record.processed);
        assert_eq!(league.set.match_history.len(), 1);
        assert_eq!(league.set.leaderboard.entry_or_default(&NameKey::new("ana")).wins, 1);
        assert_eq!(league.log.last().unwrap().action, ActionKind::MatchSaved);
        league.check_invariants().unwrap();
    }

    #[test]
    fn complete_match_consumes_the_pending_matchup() {
        let mut league = League::new();
        league.set.matchups.push(Matchup {
            team_a: vec!["Ana".into()],
            team_b: vec!["Bo".into()],
            team_size: 1,
        });

        let record = league
            .complete_match(0, Score::new(15, 11), Some("Ana".into()), Utc::now(), &actor())
            .unwrap();

        assert!(league.set.matchups.is_empty());
        assert_eq!(record.mvp.as_deref(), Some("Ana"));
        assert_eq!(league.log.last().unwrap().action, ActionKind::MatchCompleted);
    }

    #[test]
    fn reset_clears_board_and_history_together() {
        let mut league = League::new();
        league.save_match(raw_match(&["Ana"], &["Bo"], 21, 15, 1), &actor()).unwrap();

        league.reset_leaderboard(&actor());

        assert!(league.set.leaderboard.is_empty());
        assert!(league.set.match_history.is_empty());
        league.check_invariants().unwrap();
    }

    #[test]
    fn rename_rewrites_board_history_and_belts() {
        let mut league = League::new();
        league.add_player("Ana", None, &actor()).unwrap();
        league.save_match(raw_match(&["Ana"], &["Bo"], 21, 15, 1), &actor()).unwrap();
        league.set.belt_holders.insert("scoring".into(), "ana".into());

        let outcome = league.rename_player("ana", "Anastasia").unwrap();

        assert_eq!(outcome.new_name, "Anastasia");
        assert_eq!(outcome.matches_rewritten, 1);
        assert_eq!(outcome.belt_records_rewritten, 1);
        assert_eq!(league.set.match_history[0].team_a[0], "Anastasia");
        assert_eq!(
            league.set.leaderboard.entry_or_default(&NameKey::new("anastasia")).wins,
            1
        );
        assert!(league.set.leaderboard.entry(&NameKey::new("ana")).is_none());
        league.check_invariants().unwrap();
    }

    #[test]
    fn rename_to_existing_player_is_rejected() {
        let mut league = League::new();
        league.add_player("Ana", None, &actor()).unwrap();
        league.add_player("Bo", None, &actor()).unwrap();

        let err = league.rename_player("Ana", "bo").unwrap_err();
        assert!(matches!(err, LeagueError::DuplicatePlayer(_)));
    }

    #[test]
    fn standings_sort_by_wins_then_losses_then_name() {
        let mut league = League::new();
        league.save_match(raw_match(&["Ana"], &["Bo"], 21, 15, 1), &actor()).unwrap();
        league.save_match(raw_match(&["Cy"], &["Bo"], 21, 15, 2), &actor()).unwrap();
        league.save_match(raw_match(&["Ana"], &["Cy"], 21, 15, 3), &actor()).unwrap();

        let rows = league.standings();
        assert_eq!(rows[0].name, "Ana");
        assert_eq!(rows[0].entry.wins, 2);
        assert_eq!(rows.last().unwrap().name, "Bo");
    }

    // ------------------------------------------------------------------
    // End-to-end scenario: two players, three matches, middle reversal.
    // ------------------------------------------------------------------

    #[test]
    fn three_match_scenario_with_middle_reversal() {
        let mut league = League::new();
        let admin = actor();
        league.add_player("A", Some(AttributeScores::from_uniform(5.0)), &admin).unwrap();
        league.add_player("B", Some(AttributeScores::from_uniform(8.0)), &admin).unwrap();

        league.save_match(raw_match(&["A"], &["B"], 21, 15, 1), &admin).unwrap();
        league.save_match(raw_match(&["B"], &["A"], 21, 10, 2), &admin).unwrap();
        league.save_match(raw_match(&["A"], &["B"], 21, 18, 3), &admin).unwrap();

        let a = NameKey::new("A");
        let b = NameKey::new("B");
        assert_eq!(
            league.set.leaderboard.entry_or_default(&a),
            LeaderboardEntry { wins: 2, losses: 1, mvps: 0 }
        );
        assert_eq!(
            league.set.leaderboard.entry_or_default(&b),
            LeaderboardEntry { wins: 1, losses: 2, mvps: 0 }
        );

        let milestones = league.milestones("A").unwrap();
        assert_eq!(milestones.longest_streak, 1);
        assert_eq!(milestones.current_streak, 1);

        // Find the ledger entry for the middle match (B 21-10 A).
        let middle_id = league
            .log
            .iter()
            .find(|e| {
                matches!(
                    &e.details,
                    ActionDetails::Match { score, .. } if *score == Score::new(21, 10)
                )
            })
            .unwrap()
            .id
            .clone();

        let outcome = league.reverse(&middle_id, &admin).unwrap();
        assert!(outcome.history_updated);
        assert!(outcome.warning.is_none());

        assert_eq!(
            league.set.leaderboard.entry_or_default(&a),
            LeaderboardEntry { wins: 2, losses: 0, mvps: 0 }
        );
        assert_eq!(
            league.set.leaderboard.entry_or_default(&b),
            LeaderboardEntry { wins: 0, losses: 2, mvps: 0 }
        );

        let milestones = league.milestones("A").unwrap();
        assert_eq!(milestones.longest_streak, 2);

        // The voided record is still present, in place, with its date.
        let history = league.history_chronological();
        assert_eq!(history.len(), 3);
        assert!(matches!(history[1].lifecycle, MatchLifecycle::Voided { .. }));
        assert!(history[0].played_at < history[1].played_at);
        assert!(history[1].played_at < history[2].played_at);

        // Entry consumed, log_deleted appended, re-reversal impossible.
        assert!(league.log.get(&middle_id).is_none());
        let last = league.log.last().unwrap();
        assert_eq!(last.action, ActionKind::LogDeleted);
        assert!(!last.undoable);
        assert!(matches!(
            league.reverse(&middle_id, &admin).unwrap_err(),
            LeagueError::NotFound(_)
        ));

        league.check_invariants().unwrap();
    }

    #[test]
    fn check_invariants_flags_board_drift() {
        let mut league = League::new();
        league.save_match(raw_match(&["Ana"], &["Bo"], 21, 15, 1), &actor()).unwrap();
        league.set.leaderboard.clear();

        assert!(matches!(
            league.check_invariants().unwrap_err(),
            LeagueError::Consistency(_)
        ));
    }
}
