//! Composite scoring engine for candidate fitness.
//!
//! Combines four independent sub-scores (must gate, nice-to-have semantic
//! similarity, experience years, role compatibility) into a 0-100 integer,
//! with a cap rule that overrides the weighted sum when hard gates fail.
//! All scoring is deterministic; the embedding vectors are produced upstream.

pub mod must;
pub mod nice;
pub mod role;
pub mod year;

use crate::schema::{CandidateProfile, JobRequirements};
use role::RoleMatrix;
use serde::{Deserialize, Serialize};

/// Relative weights of the four sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Weight of the must gate score.
    pub must: f64,
    /// Weight of the nice-to-have similarity score.
    pub nice: f64,
    /// Weight of the experience-years score.
    pub year: f64,
    /// Weight of the role compatibility score.
    pub role: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            must: 0.45,
            nice: 0.20,
            year: 0.20,
            role: 0.15,
        }
    }
}

/// Tuning knobs for one scoring run. Loaded from the versioned
/// `score_config` table; immutable once created.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSettings {
    /// Sub-score weights.
    pub weights: ScoreWeights,
    /// Whether the must-cap rule is active.
    pub must_cap_enabled: bool,
    /// Ceiling applied to the total when must gaps exist.
    pub must_cap_value: i64,
    /// How many of the best nice similarities are averaged.
    pub nice_top_n: usize,
    /// Role compatibility matrix.
    pub role_distance: RoleMatrix,
}

impl Default for ScoreSettings {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            must_cap_enabled: true,
            must_cap_value: 20,
            nice_top_n: 3,
            role_distance: RoleMatrix::default(),
        }
    }
}

/// The full result of scoring one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreBreakdown {
    /// Must gate score in [0, 1].
    pub must_score: f64,
    /// Nice-to-have similarity score in [0, 1].
    pub nice_score: f64,
    /// Experience-years score in [0, 1].
    pub year_score: f64,
    /// Role compatibility score in [0, 1].
    pub role_score: f64,
    /// Composite fit, integer in [0, 100].
    pub total_fit_0_100: i64,
    /// Texts of the unsatisfied must requirements, in requirement order.
    pub must_gaps: Vec<String>,
}

/// Scoring engine bound to one settings snapshot.
pub struct ScoringEngine {
    settings: ScoreSettings,
}

impl ScoringEngine {
    /// Create an engine for the given settings snapshot.
    pub fn new(settings: ScoreSettings) -> Self {
        Self { settings }
    }

    /// Score a candidate from the extraction and the embedding set.
    ///
    /// `candidate_embedding` may be absent (the candidate summary was
    /// empty); the nice score is then 0.
    pub fn score(
        &self,
        requirements: &JobRequirements,
        profile: &CandidateProfile,
        candidate_embedding: Option<&[f32]>,
        nice_embeddings: &[(String, Vec<f32>)],
    ) -> ScoreBreakdown {
        let (must_score, must_gaps) = must::must_score(requirements, profile);
        let year_score = year::year_score(requirements, profile);
        let role_score = role::role_score(requirements, profile, &self.settings.role_distance);
        let nice_score = nice::nice_score(
            candidate_embedding,
            nice_embeddings,
            self.settings.nice_top_n,
        );

        let total_fit_0_100 = total_fit(
            &self.settings,
            must_score,
            nice_score,
            year_score,
            role_score,
            !must_gaps.is_empty(),
        );

        tracing::info!(
            must = must_score,
            nice = nice_score,
            year = year_score,
            role = role_score,
            total = total_fit_0_100,
            gaps = must_gaps.len(),
            "candidate scored"
        );

        ScoreBreakdown {
            must_score,
            nice_score,
            year_score,
            role_score,
            total_fit_0_100,
            must_gaps,
        }
    }

    /// The settings this engine was built with.
    pub fn settings(&self) -> &ScoreSettings {
        &self.settings
    }
}

/// Combine the sub-scores into the final 0-100 integer.
///
/// `round(weighted_sum * 100)`, capped at `must_cap_value` when the cap is
/// enabled and gaps exist, then clamped to [0, 100].
pub fn total_fit(
    settings: &ScoreSettings,
    must_score: f64,
    nice_score: f64,
    year_score: f64,
    role_score: f64,
    has_must_gaps: bool,
) -> i64 {
    let weights = &settings.weights;
    let raw = weights.must * must_score
        + weights.nice * nice_score
        + weights.year * year_score
        + weights.role * role_score;

    let mut total = (raw * 100.0).round() as i64;

    if settings.must_cap_enabled && has_must_gaps {
        total = total.min(settings.must_cap_value);
        tracing::info!(cap = settings.must_cap_value, "must cap applied");
    }

    total.clamp(0, 100)
}
