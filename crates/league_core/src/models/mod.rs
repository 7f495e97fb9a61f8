//! Core data model: players, submissions, and the canonical match shape.

pub mod match_record;
pub mod name;
pub mod player;

pub use match_record::{
    sort_chronologically, MatchLifecycle, MatchRecord, ParticipantOutcome, RawMatch, Score, Side,
};
pub use name::{same_player, NameKey};
pub use player::{AttributeScores, Player, Submission, ATTRIBUTE_NAMES, RATING_WEIGHTS};
