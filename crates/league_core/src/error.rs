use crate::store::StoreError;
use thiserror::Error;

/// Error taxonomy for the league core.
///
/// Validation and duplicate errors block an operation before any state
/// mutation. Consistency drift is non-fatal on the reversal path (surfaced
/// as a warning in the outcome) but is returned as an error from the
/// explicit reconciliation check.
#[derive(Error, Debug)]
pub enum LeagueError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("duplicate player: {0}")]
    DuplicatePlayer(String),

    #[error("action '{0}' cannot be reversed")]
    Irreversible(String),

    #[error("consistency error: {0}")]
    Consistency(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for LeagueError {
    fn from(err: serde_json::Error) -> Self {
        LeagueError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LeagueError>;
