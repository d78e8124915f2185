//! Role-expectation scorer and the role distance matrix.

use crate::schema::{CandidateProfile, JobRequirements};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The closed set of role levels the matrix is indexed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleLevel {
    /// Individual contributor.
    Ic,
    /// Tech/team lead.
    Lead,
    /// People manager.
    Manager,
}

impl RoleLevel {
    fn index(self) -> usize {
        match self {
            RoleLevel::Ic => 0,
            RoleLevel::Lead => 1,
            RoleLevel::Manager => 2,
        }
    }

    fn label(self) -> &'static str {
        match self {
            RoleLevel::Ic => "IC",
            RoleLevel::Lead => "Lead",
            RoleLevel::Manager => "Manager",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "IC" => Some(RoleLevel::Ic),
            "Lead" => Some(RoleLevel::Lead),
            "Manager" => Some(RoleLevel::Manager),
            _ => None,
        }
    }
}

/// Map common role synonyms onto the closed level set.
///
/// Unknown labels return `None` and fall through to the neutral handling
/// in [`role_score`].
pub fn normalize_role(role: &str) -> Option<RoleLevel> {
    match role.trim().to_lowercase().as_str() {
        "ic" | "individual contributor" | "engineer" | "developer" => Some(RoleLevel::Ic),
        "lead" | "tech lead" | "team lead" | "senior" => Some(RoleLevel::Lead),
        "manager" | "engineering manager" | "em" | "director" => Some(RoleLevel::Manager),
        _ => None,
    }
}

/// Dense 3x3 role compatibility matrix, expected-role by candidate-role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, BTreeMap<String, f64>>")]
#[serde(into = "BTreeMap<String, BTreeMap<String, f64>>")]
pub struct RoleMatrix([[f64; 3]; 3]);

impl RoleMatrix {
    /// Compatibility of a candidate role with the expected role.
    pub fn get(&self, expected: RoleLevel, candidate: RoleLevel) -> f64 {
        self.0[expected.index()][candidate.index()]
    }
}

impl Default for RoleMatrix {
    /// Diagonal 1.0; IC and Manager are distant (0.3), Lead is adjacent to
    /// both (0.7).
    fn default() -> Self {
        Self([
            [1.0, 0.7, 0.3], // IC
            [0.7, 1.0, 0.7], // Lead
            [0.3, 0.7, 1.0], // Manager
        ])
    }
}

impl TryFrom<BTreeMap<String, BTreeMap<String, f64>>> for RoleMatrix {
    type Error = String;

    fn try_from(map: BTreeMap<String, BTreeMap<String, f64>>) -> Result<Self, Self::Error> {
        let mut matrix = RoleMatrix::default();
        for (expected_label, row) in &map {
            let expected = RoleLevel::from_label(expected_label)
                .ok_or_else(|| format!("unknown role '{expected_label}' in distance matrix"))?;
            for (candidate_label, value) in row {
                let candidate = RoleLevel::from_label(candidate_label)
                    .ok_or_else(|| format!("unknown role '{candidate_label}' in distance matrix"))?;
                if !(0.0..=1.0).contains(value) {
                    return Err(format!(
                        "role distance {expected_label}->{candidate_label} out of range: {value}"
                    ));
                }
                matrix.0[expected.index()][candidate.index()] = *value;
            }
        }
        Ok(matrix)
    }
}

impl From<RoleMatrix> for BTreeMap<String, BTreeMap<String, f64>> {
    fn from(matrix: RoleMatrix) -> Self {
        let levels = [RoleLevel::Ic, RoleLevel::Lead, RoleLevel::Manager];
        levels
            .iter()
            .map(|expected| {
                let row = levels
                    .iter()
                    .map(|candidate| {
                        (
                            candidate.label().to_string(),
                            matrix.get(*expected, *candidate),
                        )
                    })
                    .collect();
                (expected.label().to_string(), row)
            })
            .collect()
    }
}

/// Score the candidate's roles against the job's role expectation.
///
/// No expectation scores 1.0; an empty candidate role list scores the
/// neutral 0.5. Otherwise the best matrix entry wins, with a direct
/// string-equality rescue to 1.0 and a final neutral 0.5 fallback for
/// labels outside the closed set.
pub fn role_score(
    requirements: &JobRequirements,
    profile: &CandidateProfile,
    matrix: &RoleMatrix,
) -> f64 {
    let Some(expected_raw) = requirements.role_expectation.as_deref() else {
        return 1.0;
    };
    if profile.roles.is_empty() {
        return 0.5;
    }

    let expected = normalize_role(expected_raw);
    let mut best = 0.0f64;
    for role in &profile.roles {
        if let (Some(expected), Some(candidate)) = (expected, normalize_role(role)) {
            best = best.max(matrix.get(expected, candidate));
        }
    }

    let score = if best == 0.0 {
        if profile
            .roles
            .iter()
            .any(|role| role.trim().eq_ignore_ascii_case(expected_raw.trim()))
        {
            1.0
        } else {
            0.5
        }
    } else {
        best
    };

    tracing::info!(
        score = score,
        expected = expected_raw,
        candidate_roles = profile.roles.len(),
        "role score computed"
    );
    score
}
