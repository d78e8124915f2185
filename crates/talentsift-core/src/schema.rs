//! Typed shapes for LLM output.
//!
//! Model responses are validated into these structs exactly once, at the
//! stage boundary; everything downstream works with typed data. Maps use
//! `BTreeMap` so persisted JSON is byte-stable across repeated runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A hard-gate requirement extracted from the job text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MustRequirement {
    /// Stable identifier within the extraction (e.g. "m1").
    pub id: String,
    /// The requirement text as written in the job posting.
    pub text: String,
    /// Normalised skill names this requirement is about.
    #[serde(default)]
    pub skill_tags: Vec<String>,
}

/// A soft-preference requirement extracted from the job text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NiceRequirement {
    /// Stable identifier within the extraction (e.g. "n1").
    pub id: String,
    /// The requirement text as written in the job posting.
    pub text: String,
    /// Normalised skill names this requirement is about.
    #[serde(default)]
    pub skill_tags: Vec<String>,
}

/// Requirements extracted from a job posting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobRequirements {
    /// Hard gates.
    #[serde(default)]
    pub must: Vec<MustRequirement>,
    /// Soft preferences, scored by semantic similarity.
    #[serde(default)]
    pub nice: Vec<NiceRequirement>,
    /// Expected role, one of IC/Lead/Manager, or absent.
    #[serde(default)]
    pub role_expectation: Option<String>,
    /// Minimum years of experience per skill. Null values mean the posting
    /// mentioned the skill without a usable number.
    #[serde(default)]
    pub year_requirements: BTreeMap<String, Option<f64>>,
}

/// Profile extracted from a candidate's documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateProfile {
    /// Normalised skill names.
    #[serde(default)]
    pub skills: Vec<String>,
    /// Role labels the candidate has held.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Years of experience per skill where explicitly supported by the text.
    #[serde(default)]
    pub experience_years: BTreeMap<String, Option<f64>>,
    /// Notable achievements.
    #[serde(default)]
    pub highlights: Vec<String>,
    /// Potential issues spotted in the documents.
    #[serde(default)]
    pub concerns: Vec<String>,
    /// Items the model could not verify.
    #[serde(default)]
    pub unknowns: Vec<String>,
}

/// Short verbatim quotes supporting each extracted item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// requirement id -> quote from the job text.
    #[serde(default)]
    pub job: BTreeMap<String, String>,
    /// attribute id -> quote from the resume.
    #[serde(default)]
    pub candidate: BTreeMap<String, String>,
}

/// Complete structured-extraction result.
///
/// The three top-level keys are required; their inner fields default so a
/// sparse but well-shaped response still validates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted job requirements.
    pub job_requirements: JobRequirements,
    /// Extracted candidate profile.
    pub candidate_profile: CandidateProfile,
    /// Supporting quotes.
    pub evidence: Evidence,
}

impl ExtractionResult {
    /// Validate a raw model response into the typed shape.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

/// Maximum strengths the explanation may list.
pub const MAX_STRENGTHS: usize = 3;
/// Maximum concerns the explanation may list.
pub const MAX_CONCERNS: usize = 3;
/// Maximum unknowns the explanation may list.
pub const MAX_UNKNOWNS: usize = 5;

/// Structured screening rationale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplanationOutcome {
    /// One to two sentence fit summary.
    pub summary: String,
    /// Key strengths, at most three.
    #[serde(default)]
    pub strengths: Vec<String>,
    /// Potential concerns, at most three.
    #[serde(default)]
    pub concerns: Vec<String>,
    /// Unverifiable items, at most five.
    #[serde(default)]
    pub unknowns: Vec<String>,
    /// Unsatisfied must requirements, copied from the score.
    #[serde(default)]
    pub must_gaps: Vec<String>,
}

impl ExplanationOutcome {
    /// Validate a raw model response, truncating over-length lists to the
    /// documented bounds rather than rejecting them.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let mut outcome: Self = serde_json::from_value(value)?;
        outcome.strengths.truncate(MAX_STRENGTHS);
        outcome.concerns.truncate(MAX_CONCERNS);
        outcome.unknowns.truncate(MAX_UNKNOWNS);
        Ok(outcome)
    }
}
