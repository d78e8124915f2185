//! Years-of-experience scorer.

use crate::schema::{CandidateProfile, JobRequirements};
use std::collections::BTreeMap;

/// Score experience years against the job's requirements.
///
/// Per skill the score is `clamp(actual / required, 0, 1)`, with 0 when the
/// candidate has no recorded years for the skill. The final score is the
/// mean across all positive requirements; 1.0 when there are none.
pub fn year_score(requirements: &JobRequirements, profile: &CandidateProfile) -> f64 {
    if requirements.year_requirements.is_empty() {
        return 1.0;
    }

    let candidate_years: BTreeMap<String, f64> = profile
        .experience_years
        .iter()
        .filter_map(|(k, v)| v.map(|years| (k.to_lowercase(), years)))
        .collect();

    let mut scores = Vec::new();
    for (skill, required) in &requirements.year_requirements {
        let Some(required) = *required else { continue };
        if required <= 0.0 {
            continue;
        }

        let per_skill = match candidate_years.get(&skill.to_lowercase()) {
            Some(actual) => (actual / required).clamp(0.0, 1.0),
            None => 0.0,
        };
        scores.push(per_skill);
    }

    if scores.is_empty() {
        return 1.0;
    }

    let score = scores.iter().sum::<f64>() / scores.len() as f64;
    tracing::info!(score = score, requirements = scores.len(), "year score computed");
    score
}
