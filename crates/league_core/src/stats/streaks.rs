//! Win-streak folds over chronologically ordered match history.
//!
//! Both folds skip matches the player did not participate in and every
//! Voided match. A tie is never a win and breaks a streak exactly like a
//! loss.

use crate::models::{MatchRecord, NameKey, ParticipantOutcome};

/// Longest run of consecutive wins, oldest to newest.
pub fn longest_win_streak(key: &NameKey, history: &[MatchRecord]) -> u32 {
    let mut run = 0u32;
    let mut best = 0u32;
    for record in history.iter().filter(|m| m.is_active()) {
        match record.outcome_for(key) {
            None => continue,
            Some(ParticipantOutcome::Win) => {
                run += 1;
                best = best.max(run);
            }
            Some(_) => run = 0,
        }
    }
    best
}

/// Consecutive wins counted from the most recent participated match
/// backward, stopping at the first non-win.
pub fn current_win_streak(key: &NameKey, history: &[MatchRecord]) -> u32 {
    let mut run = 0u32;
    for record in history.iter().rev().filter(|m| m.is_active()) {
        match record.outcome_for(key) {
            None => continue,
            Some(ParticipantOutcome::Win) => run += 1,
            Some(_) => break,
        }
    }
    run
}
