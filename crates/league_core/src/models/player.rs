use super::name::NameKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default score for every attribute when no submission exists.
pub const DEFAULT_SCORE: f32 = 5.0;

/// Valid range for a single attribute score.
pub const SCORE_MIN: f32 = 1.0;
pub const SCORE_MAX: f32 = 10.0;

/// Attribute names in canonical order, used by the API boundary and the
/// weight table below.
pub const ATTRIBUTE_NAMES: [&str; 7] =
    ["scoring", "defense", "rebounding", "playmaking", "stamina", "physicality", "xfactor"];

/// Weighted-rating weights, same order as [`ATTRIBUTE_NAMES`]. These also
/// drive the team partitioner's strength function so that "rating" and
/// "strength" can never disagree.
pub const RATING_WEIGHTS: [f32; 7] = [0.25, 0.20, 0.15, 0.15, 0.10, 0.10, 0.05];

/// The seven peer-rated attribute scores, each on a 1-10 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttributeScores {
    pub scoring: f32,
    pub defense: f32,
    pub rebounding: f32,
    pub playmaking: f32,
    pub stamina: f32,
    pub physicality: f32,
    pub xfactor: f32,
}

impl Default for AttributeScores {
    fn default() -> Self {
        Self::from_uniform(DEFAULT_SCORE)
    }
}

impl AttributeScores {
    /// Creates scores with a uniform value, clamped to the valid range.
    pub fn from_uniform(val: f32) -> Self {
        let v = val.clamp(SCORE_MIN, SCORE_MAX);
        Self {
            scoring: v,
            defense: v,
            rebounding: v,
            playmaking: v,
            stamina: v,
            physicality: v,
            xfactor: v,
        }
    }

    pub fn as_array(&self) -> [f32; 7] {
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

    pub fn from_array(vals: [f32; 7]) -> Self {
        Self {
            scoring: vals[0],
            defense: vals[1],
            rebounding: vals[2],
            playmaking: vals[3],
            stamina: vals[4],
            physicality: vals[5],
            xfactor: vals[6],
        }
    }

    /// Clamp every attribute into the 1-10 range.
    pub fn clamped(&self) -> Self {
        let mut vals = self.as_array();
        for v in &mut vals {
            *v = v.clamp(SCORE_MIN, SCORE_MAX);
        }
        Self::from_array(vals)
    }

    /// Per-attribute arithmetic mean over a set of score sheets. Returns the
    /// all-defaults sheet when the input is empty.
    pub fn mean(sheets: &[AttributeScores]) -> Self {
        if sheets.is_empty() {
            return Self::default();
        }
        let mut sums = [0.0f32; 7];
        for sheet in sheets {
            for (sum, v) in sums.iter_mut().zip(sheet.as_array()) {
                *sum += v;
            }
        }
        let n = sheets.len() as f32;
        let mut vals = [0.0f32; 7];
        for (out, sum) in vals.iter_mut().zip(sums) {
            *out = sum / n;
        }
        Self::from_array(vals)
    }

    /// Weighted average of the seven attributes, the player's displayed
    /// rating. Weights are [`RATING_WEIGHTS`]; the result stays on the 1-10
    /// scale.
    pub fn weighted_rating(&self) -> f32 {
        let sum: f32 =
            self.as_array().iter().zip(RATING_WEIGHTS).map(|(v, w)| v * w).sum();
        let weight_sum: f32 = RATING_WEIGHTS.iter().sum();
        sum / weight_sum
    }
}

/// One reviewer's rating sheet for a player.
///
/// At most one live submission exists per (player, reviewer); a resubmission
/// replaces the prior sheet for that reviewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub reviewer_id: String,
    pub scores: AttributeScores,
    pub submitted_at: DateTime<Utc>,
}

/// A league member.
///
/// Created on first rating submission or explicit add; destroyed only by
/// admin delete or by ledger reversal of its creating event. The canonical
/// lookup key is the trimmed, lowercased name; `name` keeps the display
/// spelling as it was entered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: String,
    pub active: bool,
    pub scores: AttributeScores,
    #[serde(default)]
    pub submissions: Vec<Submission>,
    pub rating: f32,
}

impl Player {
    pub fn new(name: &str) -> Self {
        let scores = AttributeScores::default();
        Self {
            name: name.trim().to_string(),
            active: true,
            scores,
            submissions: Vec::new(),
            rating: scores.weighted_rating(),
        }
    }

    pub fn key(&self) -> NameKey {
        NameKey::new(&self.name)
    }

    /// Records a rating sheet from a reviewer, replacing any prior sheet
    /// from the same reviewer. Returns the replaced submission, if any.
    pub fn apply_submission(&mut self, submission: Submission) -> Option<Submission> {
        let replaced = self.remove_submission_only(&submission.reviewer_id);
        self.submissions.push(Submission {
            scores: submission.scores.clamped(),
            ..submission
        });
        self.recompute();
        replaced
    }

    /// Strips the submission from the given reviewer (if present) and
    /// recomputes the derived attributes and rating.
    pub fn remove_submission(&mut self, reviewer_id: &str) -> Option<Submission> {
        let removed = self.remove_submission_only(reviewer_id);
        self.recompute();
        removed
    }

    fn remove_submission_only(&mut self, reviewer_id: &str) -> Option<Submission> {
        let idx = self.submissions.iter().position(|s| s.reviewer_id == reviewer_id)?;
        Some(self.submissions.remove(idx))
    }

    pub fn submission_from(&self, reviewer_id: &str) -> Option<&Submission> {
        self.submissions.iter().find(|s| s.reviewer_id == reviewer_id)
    }

    /// Recomputes every attribute as the mean of the live submissions
    /// (defaults when none remain), then the weighted rating.
    pub fn recompute(&mut self) {
        let sheets: Vec<AttributeScores> =
            self.submissions.iter().map(|s| s.scores).collect();
        self.scores = AttributeScores::mean(&sheets);
        self.rating = self.scores.weighted_rating();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet(v: f32) -> AttributeScores {
        AttributeScores::from_uniform(v)
    }

    fn submission(reviewer: &str, v: f32) -> Submission {
        Submission { reviewer_id: reviewer.to_string(), scores: sheet(v), submitted_at: Utc::now() }
    }

    #[test]
    fn from_uniform_clamps_to_bounds() {
        assert_eq!(sheet(0.0).scoring, 1.0);
        assert_eq!(sheet(12.0).defense, 10.0);
        assert_eq!(sheet(7.5).xfactor, 7.5);
    }

    #[test]
    fn weights_cover_all_seven_attributes() {
        let total: f32 = RATING_WEIGHTS.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert_eq!(ATTRIBUTE_NAMES.len(), RATING_WEIGHTS.len());
    }

    #[test]
    fn uniform_sheet_rates_at_its_value() {
        let rating = sheet(8.0).weighted_rating();
        assert!((rating - 8.0).abs() < 1e-6);
    }

    #[test]
    fn resubmission_replaces_prior_sheet() {
        let mut player = Player::new("Sam");
        player.apply_submission(submission("u1", 4.0));
        player.apply_submission(submission("u1", 9.0));

        assert_eq!(player.submissions.len(), 1);
        assert!((player.scores.scoring - 9.0).abs() < 1e-6);
    }

    #[test]
    fn attributes_average_across_reviewers() {
        let mut player = Player::new("Sam");
        player.apply_submission(submission("u1", 4.0));
        player.apply_submission(submission("u2", 8.0));

        assert!((player.scores.defense - 6.0).abs() < 1e-6);
        assert!((player.rating - 6.0).abs() < 1e-6);
    }

    #[test]
    fn removing_last_submission_restores_defaults() {
        let mut player = Player::new("Sam");
        player.apply_submission(submission("u1", 9.0));
        let removed = player.remove_submission("u1");

        assert!(removed.is_some());
        assert!(player.submissions.is_empty());
        assert!((player.scores.scoring - DEFAULT_SCORE).abs() < 1e-6);
        assert!((player.rating - DEFAULT_SCORE).abs() < 1e-6);
    }

    #[test]
    fn player_key_normalizes_display_name() {
        let player = Player::new("  Big Mike ");
        assert_eq!(player.name, "Big Mike");
        assert_eq!(player.key().as_str(), "big mike");
    }
}
