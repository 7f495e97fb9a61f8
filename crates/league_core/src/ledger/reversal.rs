//! Compensating reversal of ledger entries.
//!
//! Single entry point [`reverse_entry`]: looks up the triggering entry,
//! applies the inverse of its action against the league state, consumes the
//! entry and appends a non-undoable `log_deleted` trace. An entry can only
//! be reversed while it exists; after a successful reversal it is gone, so
//! re-reversal is structurally impossible.

use super::entry::{ActionDetails, ActionKind, Actor, LedgerEntry};
use super::log::ActivityLog;
use crate::error::{LeagueError, Result};
use crate::league::LeagueSet;
use crate::models::{MatchLifecycle, MatchRecord, NameKey, Player, Score};
use chrono::{DateTime, Utc};

const VOID_REASON: &str = "reversed from activity log";

/// Refreshed state handed back to the caller after a reversal, replacing
/// the old window-level refresh side channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ReversalOutcome {
    pub reversed: ActionKind,
    /// The affected player after the reversal, when one remains.
    pub player: Option<Player>,
    /// Display name of a player removed entirely by the reversal.
    pub deleted_player: Option<String>,
    /// Whether a history record was located and voided.
    pub history_updated: bool,
    /// Non-fatal consistency warning (for example: aggregator corrected but
    /// no matching history record found).
    pub warning: Option<String>,
}

impl ReversalOutcome {
    fn new(reversed: ActionKind) -> Self {
        Self { reversed, player: None, deleted_player: None, history_updated: false, warning: None }
    }
}

/// Reverses the ledger entry with the given id.
///
/// Fails without touching any state when the entry is missing, marked
/// non-undoable, or carries a payload that does not match its action. The
/// missing-history case during a match reversal is deliberately non-fatal:
/// the leaderboard correction still applies and a warning is reported.
pub fn reverse_entry(
    set: &mut LeagueSet,
    log: &mut ActivityLog,
    entry_id: &str,
    actor: &Actor,
) -> Result<ReversalOutcome> {
    let entry: LedgerEntry = log
        .get(entry_id)
        .cloned()
        .ok_or_else(|| LeagueError::NotFound(format!("ledger entry '{entry_id}'")))?;

    if !entry.undoable {
        return Err(LeagueError::Irreversible(entry.action.label().to_string()));
    }

    let mut outcome = ReversalOutcome::new(entry.action);
    match (entry.action, &entry.details) {
        (ActionKind::PlayerAdded, ActionDetails::Player { name, reviewer_id }) => {
            reverse_player_added(set, name, reviewer_id.as_deref(), &mut outcome)?;
        }
        (
            ActionKind::RatingAdded | ActionKind::RatingUpdated,
            ActionDetails::Rating { player, reviewer_id },
        ) => {
            reverse_rating(set, player, reviewer_id, &mut outcome)?;
        }
        (
            ActionKind::MatchSaved | ActionKind::MatchCompleted,
            ActionDetails::Match { team_a, team_b, score, mvp },
        ) => {
            reverse_match(set, team_a, team_b, *score, mvp.as_deref(), actor, &mut outcome);
        }
        _ => {
            return Err(LeagueError::Validation(
                "ledger entry payload does not match its action".to_string(),
            ));
        }
    }

    let consumed = log.take(entry_id).expect("entry presence was checked above");
    let affected = outcome
        .deleted_player
        .clone()
        .or_else(|| outcome.player.as_ref().map(|p| p.name.clone()));
    log.record(
        ActionKind::LogDeleted,
        ActionDetails::Deleted {
            reversed_action: consumed.action,
            player: affected,
            summary: format!("reversed {}", consumed.action.label()),
        },
        actor,
    );
    log::info!("reversed ledger entry '{}' ({})", entry_id, consumed.action.label());
    Ok(outcome)
}

/// Undo a player creation. When the creating submission was the only one
/// ever recorded (or the player never had any), the player is deleted
/// entirely with a cascading leaderboard removal; otherwise only that
/// submission is stripped and the attributes recomputed.
fn reverse_player_added(
    set: &mut LeagueSet,
    name: &str,
    reviewer_id: Option<&str>,
    outcome: &mut ReversalOutcome,
) -> Result<()> {
    let key = NameKey::new(name);
    let idx = set
        .player_index(&key)
        .ok_or_else(|| LeagueError::NotFound(format!("player '{name}'")))?;

    if set.players[idx].submissions.len() <= 1 {
        let removed = set.players.remove(idx);
        set.leaderboard.remove(&key);
        outcome.deleted_player = Some(removed.name);
        return Ok(());
    }

    let player = &mut set.players[idx];
    match reviewer_id {
        Some(reviewer) => {
            if player.remove_submission(reviewer).is_none() {
                outcome.warning = Some(format!(
                    "no live submission from reviewer '{reviewer}' on player '{}'",
                    player.name
                ));
            }
        }
        None => {
            outcome.warning = Some(format!(
                "player '{}' has ratings recorded after the add; player kept",
                player.name
            ));
        }
    }
    outcome.player = Some(player.clone());
    Ok(())
}

/// Undo a rating submission: strip the reviewer's sheet and recompute.
/// Never deletes the player; a player with zero submissions keeps default
/// attributes.
fn reverse_rating(
    set: &mut LeagueSet,
    player_name: &str,
    reviewer_id: &str,
    outcome: &mut ReversalOutcome,
) -> Result<()> {
    let key = NameKey::new(player_name);
    let player = set
        .find_player_mut(&key)
        .ok_or_else(|| LeagueError::NotFound(format!("player '{player_name}'")))?;

    if player.remove_submission(reviewer_id).is_none() {
        outcome.warning = Some(format!(
            "no live submission from reviewer '{reviewer_id}' on player '{}'",
            player.name
        ));
    }
    outcome.player = Some(player.clone());
    Ok(())
}

/// Undo a saved match: apply the aggregator's compensating decrement from
/// the ledger payload, then locate the history record (roster set-equality
/// on either side assignment, matching score orientation, MVP when the
/// payload named one) and flip it to Voided with the original date kept.
fn reverse_match(
    set: &mut LeagueSet,
    team_a: &[String],
    team_b: &[String],
    score: Score,
    mvp: Option<&str>,
    actor: &Actor,
    outcome: &mut ReversalOutcome,
) {
    let probe = MatchRecord {
        team_a: team_a.to_vec(),
        team_b: team_b.to_vec(),
        score,
        mvp: mvp.map(|m| m.to_string()),
        team_size: team_a.len().max(team_b.len()) as u8,
        played_at: DateTime::<Utc>::UNIX_EPOCH,
        lifecycle: MatchLifecycle::Active,
        processed: true,
    };
    set.leaderboard.reverse_match(&probe);

    let payload_mvp = probe.mvp_key();
    let voided_at = Utc::now();
    for record in set.match_history.iter_mut() {
        if !record.is_active() {
            continue;
        }
        let Some(swapped) = record.rosters_match(team_a, team_b) else {
            continue;
        };
        let expected = if swapped { score.swapped() } else { score };
        if record.score != expected {
            continue;
        }
        if payload_mvp.is_some() && record.mvp_key() != payload_mvp {
            continue;
        }

        record.void(VOID_REASON, &actor.name, voided_at);
        outcome.history_updated = true;
        return;
    }

    // Aggregator already corrected; leaving history untouched is the
    // documented availability-over-strictness trade-off.
    let warning = "no matching match record found in history; leaderboard corrected, \
                   history left unchanged";
    log::warn!("{warning}");
    outcome.warning = Some(warning.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::League;
    use crate::models::AttributeScores;
    use serde_json::json;

    fn actor(id: &str) -> Actor {
        Actor::new(id, id)
    }

    fn save(league: &mut League, team_a: &[&str], team_b: &[&str], a: u32, b: u32) -> String {
        let raw = serde_json::from_value(json!({
            "teamA": team_a,
            "teamB": team_b,
            "score": {"a": a, "b": b},
            "playedAt": "2024-05-01T19:00:00Z"
        }))
        .unwrap();
        league.save_match(raw, &actor("admin")).unwrap();
        league.log.last().unwrap().id.clone()
    }

    #[test]
    fn rating_reversal_restores_the_prior_average() {
        let mut league = League::new();
        league.add_player("Ana", None, &actor("admin")).unwrap();
        league.submit_rating("Ana", AttributeScores::from_uniform(4.0), &actor("u1")).unwrap();
        league.submit_rating("Ana", AttributeScores::from_uniform(8.0), &actor("u2")).unwrap();
        let u2_entry = league.log.last().unwrap().id.clone();

        let outcome = league.reverse(&u2_entry, &actor("admin")).unwrap();

        let player = outcome.player.unwrap();
        assert_eq!(player.submissions.len(), 1);
        assert!((player.scores.scoring - 4.0).abs() < 1e-6);
        assert!(league.set.find_player(&NameKey::new("ana")).is_some());
    }

    #[test]
    fn rating_reversal_to_zero_submissions_restores_defaults() {
        let mut league = League::new();
        league.add_player("Ana", None, &actor("admin")).unwrap();
        league.submit_rating("Ana", AttributeScores::from_uniform(9.0), &actor("u1")).unwrap();
        let entry = league.log.last().unwrap().id.clone();

        let outcome = league.reverse(&entry, &actor("admin")).unwrap();

        let player = outcome.player.unwrap();
        assert!(player.submissions.is_empty());
        assert!((player.rating - 5.0).abs() < 1e-6);
    }

    #[test]
    fn player_added_reversal_deletes_a_single_submission_player() {
        let mut league = League::new();
        league
            .add_player("Ana", Some(AttributeScores::from_uniform(7.0)), &actor("u1"))
            .unwrap();
        let entry = league.log.last().unwrap().id.clone();

        let outcome = league.reverse(&entry, &actor("admin")).unwrap();

        assert_eq!(outcome.deleted_player.as_deref(), Some("Ana"));
        assert!(league.set.players.is_empty());
        assert!(league.set.leaderboard.entry(&NameKey::new("ana")).is_none());
    }

    #[test]
    fn player_added_reversal_strips_only_the_creating_submission() {
        let mut league = League::new();
        league
            .add_player("Ana", Some(AttributeScores::from_uniform(4.0)), &actor("u1"))
            .unwrap();
        let add_entry = league.log.last().unwrap().id.clone();
        league.submit_rating("Ana", AttributeScores::from_uniform(8.0), &actor("u2")).unwrap();

        let outcome = league.reverse(&add_entry, &actor("admin")).unwrap();

        let player = outcome.player.unwrap();
        assert_eq!(player.submissions.len(), 1);
        assert_eq!(player.submissions[0].reviewer_id, "u2");
        assert!((player.scores.defense - 8.0).abs() < 1e-6);
        assert!(league.set.find_player(&NameKey::new("ana")).is_some());
    }

    #[test]
    fn match_reversal_voids_even_with_swapped_sides_in_history() {
        let mut league = League::new();
        save(&mut league, &["Ana"], &["Bo"], 21, 15);

        // A payload with the sides exchanged and the score mirrored still
        // identifies the same match.
        league.log.record(
            ActionKind::MatchSaved,
            ActionDetails::Match {
                team_a: vec!["Bo".into()],
                team_b: vec!["Ana".into()],
                score: Score::new(15, 21),
                mvp: None,
            },
            &actor("admin"),
        );
        let id = league.log.last().unwrap().id.clone();

        let outcome = league.reverse(&id, &actor("admin")).unwrap();

        assert!(outcome.history_updated);
        assert!(!league.set.match_history[0].is_active());
        assert_eq!(league.set.leaderboard.entry_or_default(&NameKey::new("ana")).wins, 0);
    }

    #[test]
    fn match_reversal_without_history_record_warns_but_corrects_board() {
        let mut league = League::new();
        let entry_id = save(&mut league, &["Ana"], &["Bo"], 21, 15);
        // History drifts away behind the ledger's back.
        league.set.match_history.clear();

        let outcome = league.reverse(&entry_id, &actor("admin")).unwrap();

        assert!(!outcome.history_updated);
        assert!(outcome.warning.is_some());
        assert_eq!(league.set.leaderboard.entry_or_default(&NameKey::new("ana")).wins, 0);
        // Entry is still consumed: the reversal succeeded, with a warning.
        assert!(league.log.get(&entry_id).is_none());
        assert_eq!(league.log.last().unwrap().action, ActionKind::LogDeleted);
    }

    #[test]
    fn non_undoable_kinds_are_rejected_up_front() {
        let mut league = League::new();
        league.add_player("Ana", None, &actor("admin")).unwrap();
        league.generate_teams(1, &actor("admin")).unwrap();
        let entry_id = league.log.last().unwrap().id.clone();

        let err = league.reverse(&entry_id, &actor("admin")).unwrap_err();

        assert!(matches!(err, LeagueError::Irreversible(_)));
        // Rejected up front: the entry is not consumed.
        assert!(league.log.get(&entry_id).is_some());
    }

    #[test]
    fn failed_dispatch_leaves_the_entry_in_place() {
        let mut league = League::new();
        league.add_player("Ana", None, &actor("admin")).unwrap();
        let entry_id = league.log.last().unwrap().id.clone();
        // Player vanishes outside the ledger's knowledge.
        league.set.players.clear();

        let err = league.reverse(&entry_id, &actor("admin")).unwrap_err();

        assert!(matches!(err, LeagueError::NotFound(_)));
        assert!(league.log.get(&entry_id).is_some());
    }
}
