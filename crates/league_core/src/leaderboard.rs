//! Incremental win/loss/MVP aggregation.
//!
//! The leaderboard is a cached aggregate: for every player it must equal the
//! fold of all Active matches over that player. It is mutated incrementally
//! on save and reversal, and can be recomputed from history as a
//! reconciliation check.

use crate::models::{MatchRecord, NameKey, Side};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub wins: u32,
    pub losses: u32,
    pub mvps: u32,
}

impl LeaderboardEntry {
    pub fn games_played(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn is_zero(&self) -> bool {
        *self == LeaderboardEntry::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: HashMap<NameKey, LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, key: &NameKey) -> Option<&LeaderboardEntry> {
        self.entries.get(key)
    }

    /// Counters for a player, zeros when the player has never been touched.
    pub fn entry_or_default(&self, key: &NameKey) -> LeaderboardEntry {
        self.entries.get(key).copied().unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NameKey, &LeaderboardEntry)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn remove(&mut self, key: &NameKey) -> Option<LeaderboardEntry> {
        self.entries.remove(key)
    }

    fn touch(&mut self, key: NameKey) -> &mut LeaderboardEntry {
        self.entries.entry(key).or_default()
    }

    /// Applies a saved match's deltas.
    ///
    /// A tie applies no win/loss delta for anyone; the MVP, if named, is
    /// still credited. Idempotent: the record is marked `processed` as part
    /// of this operation and a second call is a no-op.
    pub fn record_match(&mut self, record: &mut MatchRecord) {
        if record.processed {
            return;
        }

        for name in record.team_a.iter().chain(record.team_b.iter()) {
            self.touch(NameKey::new(name));
        }

        if let Some(winner) = record.winner() {
            let (winners, losers) = match winner {
                Side::A => (&record.team_a, &record.team_b),
                Side::B => (&record.team_b, &record.team_a),
            };
            for name in winners {
                self.touch(NameKey::new(name)).wins += 1;
            }
            for name in losers {
                self.touch(NameKey::new(name)).losses += 1;
            }
        }

        if let Some(mvp) = record.mvp_key() {
            self.touch(mvp).mvps += 1;
        }

        record.processed = true;
    }

    /// Compensating inverse of [`record_match`].
    ///
    /// Winner, losers and MVP are re-derived from the match's own stored
    /// score and MVP, never from current state, and every counter floors at
    /// zero. Does not require the match to still be Active; this is
    /// specifically the correction applied when a match is voided.
    ///
    /// [`record_match`]: Leaderboard::record_match
    pub fn reverse_match(&mut self, record: &MatchRecord) {
        if let Some(winner) = record.winner() {
            let (winners, losers) = match winner {
                Side::A => (&record.team_a, &record.team_b),
                Side::B => (&record.team_b, &record.team_a),
            };
            for name in winners {
                let entry = self.touch(NameKey::new(name));
                entry.wins = entry.wins.saturating_sub(1);
            }
            for name in losers {
                let entry = self.touch(NameKey::new(name));
                entry.losses = entry.losses.saturating_sub(1);
            }
        }

        if let Some(mvp) = record.mvp_key() {
            let entry = self.touch(mvp);
            entry.mvps = entry.mvps.saturating_sub(1);
        }
    }

    /// Pure fold over all Active matches, producing the leaderboard from
    /// scratch. Used to validate or repair the incremental aggregate and on
    /// first load when no cached aggregate is present.
    pub fn full_recompute(history: &[MatchRecord]) -> Leaderboard {
        let mut board = Leaderboard::new();
        for record in history.iter().filter(|m| m.is_active()) {
            let mut copy = record.clone();
            copy.processed = false;
            board.record_match(&mut copy);
        }
        board
    }

    /// Moves the counters stored under `old` to `new`. Part of the
    /// league-level rename operation; a missing old key is a no-op.
    pub fn rename_entry(&mut self, old: &NameKey, new: NameKey) {
        if let Some(entry) = self.entries.remove(old) {
            self.entries.insert(new, entry);
        }
    }

    /// Per-player equality against another aggregate, treating a missing
    /// entry as all zeros. This is the invariant check: an entry that was
    /// decremented back to zero and an entry that never existed are the
    /// same leaderboard.
    pub fn agrees_with(&self, other: &Leaderboard) -> bool {
        self.entries
            .keys()
            .chain(other.entries.keys())
            .all(|key| self.entry_or_default(key) == other.entry_or_default(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchLifecycle, Score};
    use chrono::{DateTime, Utc};

    fn record(team_a: &[&str], team_b: &[&str], a: u32, b: u32, mvp: Option<&str>) -> MatchRecord {
        MatchRecord {
            team_a: team_a.iter().map(|s| s.to_string()).collect(),
            team_b: team_b.iter().map(|s| s.to_string()).collect(),
            score: Score::new(a, b),
            mvp: mvp.map(|s| s.to_string()),
            team_size: team_a.len().max(team_b.len()) as u8,
            played_at: DateTime::<Utc>::UNIX_EPOCH,
            lifecycle: MatchLifecycle::Active,
            processed: false,
        }
    }

    fn key(name: &str) -> NameKey {
        NameKey::new(name)
    }

    #[test]
    fn record_credits_winners_losers_and_mvp() {
        let mut board = Leaderboard::new();
        let mut m = record(&["Ana", "Bo"], &["Cy", "Dee"], 21, 15, Some("Ana"));
        board.record_match(&mut m);

        assert_eq!(
            board.entry_or_default(&key("ana")),
            LeaderboardEntry { wins: 1, losses: 0, mvps: 1 }
        );
        assert_eq!(board.entry_or_default(&key("cy")).losses, 1);
        assert!(m.processed);
    }

    #[test]
    fn record_is_idempotent_via_processed_flag() {
        let mut board = Leaderboard::new();
        let mut m = record(&["Ana"], &["Bo"], 21, 10, None);
        board.record_match(&mut m);
        board.record_match(&mut m);

        assert_eq!(board.entry_or_default(&key("ana")).wins, 1);
    }

    #[test]
    fn tie_applies_no_win_loss_but_credits_mvp() {
        let mut board = Leaderboard::new();
        let mut m = record(&["Ana"], &["Bo"], 15, 15, Some("Bo"));
        board.record_match(&mut m);

        assert_eq!(board.entry_or_default(&key("ana")), LeaderboardEntry::default());
        assert_eq!(
            board.entry_or_default(&key("bo")),
            LeaderboardEntry { wins: 0, losses: 0, mvps: 1 }
        );
    }

    #[test]
    fn reverse_is_a_true_inverse() {
        let mut board = Leaderboard::new();
        let mut m = record(&["Ana", "Bo"], &["Cy"], 21, 18, Some("Bo"));
        let before = board.clone();

        board.record_match(&mut m);
        board.reverse_match(&m);

        assert!(board.agrees_with(&before));
    }

    #[test]
    fn reverse_floors_counters_at_zero() {
        let mut board = Leaderboard::new();
        let m = record(&["Ana"], &["Bo"], 21, 10, Some("Ana"));

        board.reverse_match(&m);

        let entry = board.entry_or_default(&key("ana"));
        assert_eq!(entry, LeaderboardEntry::default());
    }

    #[test]
    fn full_recompute_skips_voided_matches() {
        let mut history = vec![
            record(&["Ana"], &["Bo"], 21, 10, Some("Ana")),
            record(&["Ana"], &["Bo"], 8, 21, None),
        ];
        history[1].void("bad entry", "admin", Utc::now());

        let board = Leaderboard::full_recompute(&history);
        assert_eq!(
            board.entry_or_default(&key("ana")),
            LeaderboardEntry { wins: 1, losses: 0, mvps: 1 }
        );
        assert_eq!(board.entry_or_default(&key("bo")).wins, 0);
    }

    #[test]
    fn rename_moves_counters_to_new_key() {
        let mut board = Leaderboard::new();
        let mut m = record(&["Ana"], &["Bo"], 21, 10, Some("Ana"));
        board.record_match(&mut m);

        board.rename_entry(&key("ana"), key("Anastasia"));

        assert!(board.entry(&key("ana")).is_none());
        assert_eq!(board.entry_or_default(&key("anastasia")).wins, 1);
    }

    #[test]
    fn agrees_with_treats_missing_and_zero_alike() {
        let mut decremented = Leaderboard::new();
        let mut m = record(&["Ana"], &["Bo"], 21, 10, None);
        decremented.record_match(&mut m);
        decremented.reverse_match(&m);

        let empty = Leaderboard::new();
        assert!(decremented.agrees_with(&empty));
        assert!(empty.agrees_with(&decremented));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const POOL: [&str; 5] = ["ana", "bo", "cy", "dee", "eli"];

        fn arb_match() -> impl Strategy<Value = MatchRecord> {
            (
                proptest::sample::subsequence(POOL.to_vec(), 1..=2),
                proptest::sample::subsequence(POOL.to_vec(), 1..=2),
                0u32..30,
                0u32..30,
                proptest::option::of(proptest::sample::select(POOL.to_vec())),
            )
                .prop_filter("rosters must not overlap", |(a, b, _, _, _)| {
                    a.iter().all(|n| !b.contains(n))
                })
                .prop_map(|(a, b, sa, sb, mvp)| {
                    record(
                        &a.iter().map(|s| &**s).collect::<Vec<_>>(),
                        &b.iter().map(|s| &**s).collect::<Vec<_>>(),
                        sa,
                        sb,
                        mvp.as_deref(),
                    )
                })
        }

        proptest! {
            #[test]
            fn incremental_aggregate_equals_full_fold(
                matches in proptest::collection::vec(arb_match(), 0..20)
            ) {
                let mut incremental = Leaderboard::new();
                let mut history = Vec::new();
                for mut m in matches {
                    incremental.record_match(&mut m);
                    history.push(m);
                }

                let folded = Leaderboard::full_recompute(&history);
                prop_assert!(incremental.agrees_with(&folded));
            }

            #[test]
            fn record_then_reverse_restores_prior_counters(
                prefix in proptest::collection::vec(arb_match(), 0..10),
                extra in arb_match()
            ) {
                let mut board = Leaderboard::new();
                for mut m in prefix {
                    board.record_match(&mut m);
                }
                let before = board.clone();

                let mut m = extra;
                board.record_match(&mut m);
                board.reverse_match(&m);

                prop_assert!(board.agrees_with(&before));
            }
        }
    }
}
