//! Must-requirement scorer: the hard gate.

use crate::schema::{CandidateProfile, JobRequirements};
use std::collections::BTreeMap;

/// Score the must requirements and collect the gaps.
///
/// A requirement is satisfied when any of its skill tags matches a candidate
/// skill (exactly or by substring containment in either direction) and every
/// positive year requirement on its tags is met. Returns the score in [0, 1]
/// and the ordered texts of the unsatisfied requirements.
pub fn must_score(
    requirements: &JobRequirements,
    profile: &CandidateProfile,
) -> (f64, Vec<String>) {
    if requirements.must.is_empty() {
        return (1.0, Vec::new());
    }

    let candidate_skills: Vec<String> =
        profile.skills.iter().map(|s| s.to_lowercase()).collect();
    let candidate_years: BTreeMap<String, f64> = profile
        .experience_years
        .iter()
        .filter_map(|(k, v)| v.map(|years| (k.to_lowercase(), years)))
        .collect();

    let mut satisfied_count = 0usize;
    let mut must_gaps = Vec::new();

    for requirement in &requirements.must {
        let tags: Vec<String> = requirement
            .skill_tags
            .iter()
            .map(|t| t.to_lowercase())
            .collect();

        let skill_match = tags.iter().any(|tag| {
            candidate_skills
                .iter()
                .any(|skill| skill == tag || skill.contains(tag.as_str()) || tag.contains(skill.as_str()))
        });

        if !skill_match {
            must_gaps.push(requirement.text.clone());
            continue;
        }

        let years_satisfied = tags.iter().all(|tag| {
            match requirements.year_requirements.get(tag.as_str()).copied().flatten() {
                Some(required) if required > 0.0 => {
                    candidate_years.get(tag).is_some_and(|actual| *actual >= required)
                }
                _ => true,
            }
        });

        if years_satisfied {
            satisfied_count += 1;
        } else {
            must_gaps.push(requirement.text.clone());
        }
    }

    let score = satisfied_count as f64 / requirements.must.len() as f64;
    tracing::info!(
        score = score,
        satisfied = satisfied_count,
        total = requirements.must.len(),
        "must score computed"
    );
    (score, must_gaps)
}
