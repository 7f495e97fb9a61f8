//! JSON boundary: the external team-generation contract.

pub mod teams_json;

pub use teams_json::{
    generate_teams, generate_teams_json, TeamGenPlayer, TeamGenRequest, TeamGenResponse,
    Weightings, TEAM_GEN_SCHEMA_VERSION,
};
