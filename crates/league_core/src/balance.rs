//! Local team-partitioning fallback.
//!
//! This is the documented pure-function contract behind the external
//! team-generation service: given the same players in the same order it
//! always produces the same teams and matchups. The authoritative path is
//! the remote service (see `api::teams_json`); callers cannot tell which
//! one ran because both speak the same shapes.

use crate::error::{LeagueError, Result};
use crate::models::Player;
use std::cmp::Ordering;

/// A player's strength for balancing: the fixed weighted sum of the seven
/// attributes, identical to the displayed rating so the two can never
/// disagree.
pub fn strength(player: &Player) -> f32 {
    player.scores.weighted_rating()
}

/// Teams and the pairings between them.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub teams: Vec<Vec<Player>>,
    pub matchups: Vec<(Vec<Player>, Vec<Player>)>,
}

/// Buckets players into teams of exactly `team_size` (one trailing short
/// team allowed) and pairs adjacent-strength teams into matchups, using the
/// default strength function.
pub fn partition(players: &[Player], team_size: usize) -> Result<Partition> {
    partition_with(players, team_size, strength)
}

/// [`partition`] with a caller-supplied strength function.
///
/// Players are ordered by strength with a canonical-name tie-break, then
/// chunked consecutively, which keeps each team's strength homogeneous;
/// pairing adjacent teams after sorting by aggregate strength minimizes
/// expected blowouts. An odd team count leaves the weakest team without an
/// opponent.
pub fn partition_with<F>(players: &[Player], team_size: usize, strength_fn: F) -> Result<Partition>
where
    F: Fn(&Player) -> f32,
{
    if team_size == 0 {
        return Err(LeagueError::Validation("team size must be at least 1".to_string()));
    }
    if players.is_empty() {
        return Err(LeagueError::Validation("no players available for team generation".to_string()));
    }

    let mut sorted: Vec<Player> = players.to_vec();
    sorted.sort_by(|a, b| {
        strength_fn(b)
            .partial_cmp(&strength_fn(a))
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.key().cmp(&b.key()))
    });

    let mut teams: Vec<Vec<Player>> = sorted
        .chunks(team_size)
        .map(|chunk| chunk.to_vec())
        .collect();

    let total = |team: &[Player]| -> f32 { team.iter().map(&strength_fn).sum() };
    teams.sort_by(|a, b| total(b).partial_cmp(&total(a)).unwrap_or(Ordering::Equal));

    let matchups: Vec<(Vec<Player>, Vec<Player>)> = teams
        .chunks(2)
        .filter(|pair| pair.len() == 2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect();

    Ok(Partition { teams, matchups })
}
