//! Prompt templates for the extraction and explanation stages.

use crate::schema::{CandidateProfile, Evidence, JobRequirements};

/// Version label stamped onto extraction records. Bump when the prompt or
/// schema changes in a way that affects output.
pub const EXTRACT_VERSION: &str = "v1";

/// System prompt for structured extraction.
pub const EXTRACTION_SYSTEM: &str = r#"You are an information extraction engine for recruitment screening.
Return ONLY valid JSON that conforms to the provided schema.
Do not add any commentary, markdown, or extra keys.

Rules:
- Never infer or guess. If not clearly stated, set value to null and add the item to unknowns.
- Extract evidence: provide a short quote (<= 20 words) from the input text that supports each extracted item.
- Do not use sensitive attributes (age, gender, nationality, race, religion). If present, ignore them.
- Normalize skill names to common industry terms where possible (e.g., "EKS" -> "Kubernetes", "S3" -> "AWS S3").
- Experience years must be numeric if explicitly supported; otherwise null.

Output JSON Schema:
{
  "job_requirements": {
    "must": [{"id": "m1", "text": "requirement text", "skill_tags": ["skill1"]}],
    "nice": [{"id": "n1", "text": "requirement text", "skill_tags": ["skill1"]}],
    "role_expectation": "IC|Lead|Manager|null",
    "year_requirements": {"skill_name": number_or_null}
  },
  "candidate_profile": {
    "skills": ["skill1", "skill2"],
    "roles": ["IC|Lead|Manager"],
    "experience_years": {"skill_name": number_or_null},
    "highlights": ["highlight1"],
    "concerns": ["concern1"],
    "unknowns": ["unknown1"]
  },
  "evidence": {
    "job": {"must:m1": "quote from job text"},
    "candidate": {"skill:Python": "quote from resume"}
  }
}"#;

/// User prompt for structured extraction.
pub fn extraction_user(job_text: &str, resume_text: &str) -> String {
    format!(
        "Extract job requirements and candidate profile from the following texts.\n\n\
         [JOB_TEXT]\n{job_text}\n\n\
         [RESUME_TEXT]\n{resume_text}\n\n\
         Return JSON matching the schema. Use null when unknown."
    )
}

/// System prompt for explanation generation.
pub const EXPLANATION_SYSTEM: &str = r#"You are generating an explanation for a recruitment screening score.
Use only the provided inputs and evidence. Do not invent facts.
Keep it concise and actionable for a recruiter.

Output format must be JSON with keys:
- summary (string): A 1-2 sentence summary of the candidate's fit
- strengths (array of strings, up to 3): Key strengths matching job requirements
- concerns (array of strings, up to 3): Potential concerns or gaps
- unknowns (array of strings, up to 5): Information that couldn't be verified
- must_gaps (array of strings): Must requirements that are not satisfied"#;

/// User prompt for explanation generation: four labelled JSON blobs.
pub fn explanation_user(
    job_requirements: &JobRequirements,
    candidate_profile: &CandidateProfile,
    scores: &serde_json::Value,
    evidence: &Evidence,
) -> String {
    format!(
        "Given:\n\
         - job_requirements: {}\n\
         - candidate_profile: {}\n\
         - scores: {}\n\
         - evidence: {}\n\n\
         Generate the explanation JSON.",
        serde_json::to_string(job_requirements).unwrap_or_else(|_| "{}".to_string()),
        serde_json::to_string(candidate_profile).unwrap_or_else(|_| "{}".to_string()),
        scores,
        serde_json::to_string(evidence).unwrap_or_else(|_| "{}".to_string()),
    )
}
