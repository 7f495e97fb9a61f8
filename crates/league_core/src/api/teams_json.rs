//! Team-generation service contract.
//!
//! These are the exact wire shapes of the external team-balancing service;
//! `generate_teams_json` runs the local fallback partitioner against the
//! same request and produces the same response, so callers are agnostic to
//! which path ran. Failures surface inside the response envelope
//! (`success: false`), never as a transport-level error.

use crate::balance;
use crate::error::Result;
use crate::models::{AttributeScores, Player, RATING_WEIGHTS};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const TEAM_GEN_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct TeamGenRequest {
    pub players: Vec<TeamGenPlayer>,
    pub team_size: usize,
    pub league_id: String,
    /// Optional per-attribute strength weighting override; the fixed
    /// rating weights apply when absent.
    #[serde(default)]
    pub weightings: Option<Weightings>,
}

/// A player as the service sees one: name plus the seven attributes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TeamGenPlayer {
    pub name: String,
    pub scoring: f32,
    pub defense: f32,
    pub rebounding: f32,
    pub playmaking: f32,
    pub stamina: f32,
    pub physicality: f32,
    pub xfactor: f32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct Weightings {
    pub scoring: f32,
    pub defense: f32,
    pub rebounding: f32,
    pub playmaking: f32,
    pub stamina: f32,
    pub physicality: f32,
    pub xfactor: f32,
}

impl Weightings {
    fn as_array(&self) -> [f32; 7] {
        [
            self.scoring,
            self.defense,
            self.rebounding,
            self.playmaking,
            self.stamina,
            self.physicality,
            self.xfactor,
        ]
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct TeamGenResponse {
    pub success: bool,
    pub teams: Vec<Vec<TeamGenPlayer>>,
    pub matchups: Vec<(Vec<TeamGenPlayer>, Vec<TeamGenPlayer>)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TeamGenResponse {
    fn failure(message: String) -> Self {
        Self { success: false, teams: Vec::new(), matchups: Vec::new(), error: Some(message) }
    }
}

impl TeamGenPlayer {
    pub fn from_player(player: &Player) -> Self {
        let [scoring, defense, rebounding, playmaking, stamina, physicality, xfactor] =
            player.scores.as_array();
        Self {
            name: player.name.clone(),
            scoring,
            defense,
            rebounding,
            playmaking,
            stamina,
            physicality,
            xfactor,
        }
    }

    pub fn to_player(&self) -> Player {
        let mut player = Player::new(&self.name);
        player.scores = AttributeScores {
            scoring: self.scoring,
            defense: self.defense,
            rebounding: self.rebounding,
            playmaking: self.playmaking,
            stamina: self.stamina,
            physicality: self.physicality,
            xfactor: self.xfactor,
        };
        player.rating = player.scores.weighted_rating();
        player
    }
}

/// Runs the fallback partitioner against a service-shaped request and
/// returns the service-shaped response as JSON.
pub fn generate_teams_json(request_json: &str) -> Result<String> {
    let request: TeamGenRequest = match serde_json::from_str(request_json) {
        Ok(request) => request,
        Err(err) => {
            let response = TeamGenResponse::failure(format!("invalid request: {err}"));
            return Ok(serde_json::to_string(&response)?);
        }
    };

    let response = generate_teams(&request);
    Ok(serde_json::to_string(&response)?)
}

/// Typed variant of [`generate_teams_json`] for in-process callers.
pub fn generate_teams(request: &TeamGenRequest) -> TeamGenResponse {
    let players: Vec<Player> = request.players.iter().map(TeamGenPlayer::to_player).collect();

    let weights = request.weightings.map(|w| w.as_array()).unwrap_or(RATING_WEIGHTS);
    let strength_fn = move |p: &Player| -> f32 {
        let weight_sum: f32 = weights.iter().sum();
        if weight_sum == 0.0 {
            return 0.0;
        }
        p.scores.as_array().iter().zip(weights).map(|(v, w)| v * w).sum::<f32>() / weight_sum
    };

    match balance::partition_with(&players, request.team_size, strength_fn) {
        Ok(partition) => {
            let to_wire =
                |team: &[Player]| team.iter().map(TeamGenPlayer::from_player).collect::<Vec<_>>();
            TeamGenResponse {
                success: true,
                teams: partition.teams.iter().map(|t| to_wire(t)).collect(),
                matchups: partition
                    .matchups
                    .iter()
                    .map(|(a, b)| (to_wire(a), to_wire(b)))
                    .collect(),
                error: None,
            }
        }
        Err(err) => {
            log::warn!("fallback team generation failed: {err}");
            TeamGenResponse::failure(err.to_string())
        }
    }
}
