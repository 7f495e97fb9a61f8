//! # league_core - Pickup-League Statistics & Ledger Engine
//!
//! This library is the statistics reconciliation and reversible-ledger core
//! of a roster/ratings/match-tracking tool for informal leagues: it folds a
//! growing, multi-shape history of match results and rating submissions
//! into derived aggregates (win/loss/MVP counts, achievement tiers, win
//! streaks), and supports selective reversal of any individual past action
//! while keeping the aggregates and the chronological record consistent.
//!
//! ## Features
//! - One-time normalization of both historical match shapes
//! - Incremental leaderboard with a pure full-recompute reconciliation fold
//! - Soft-deletion by lifecycle flag; voided matches never reorder history
//! - Append-only activity ledger with compensating reversal per action kind
//! - Deterministic team-partitioning fallback with the external service's
//!   wire shapes

pub mod api;
pub mod balance;
pub mod error;
pub mod leaderboard;
pub mod league;
pub mod ledger;
pub mod models;
pub mod stats;
pub mod store;

// Re-export main API types
pub use api::{generate_teams_json, TeamGenRequest, TeamGenResponse};
pub use error::{LeagueError, Result};
pub use league::{League, LeagueSet, Matchup, RenameOutcome, StandingsRow};

// Re-export the data model
pub use models::{
    AttributeScores, MatchLifecycle, MatchRecord, NameKey, Player, RawMatch, Score, Submission,
};

// Re-export aggregation and derived stats
pub use leaderboard::{Leaderboard, LeaderboardEntry};
pub use stats::{milestones_for, MetricCategory, PlayerMilestones, TierStatus, TierTable};

// Re-export the ledger
pub use ledger::{ActionDetails, ActionKind, ActivityLog, Actor, LedgerEntry, ReversalOutcome};

// Re-export the store
pub use store::{LeagueDoc, StoreError, StoreManager, STORE_VERSION};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;
