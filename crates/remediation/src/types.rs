use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::RemediationError;

/// Monotonic lifecycle of a remediation: a problem starts `Open`, is
/// written up as `Documented`, and finally `Resolved`. No transition ever
/// moves backward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemediationStatus {
    Open,
    Documented,
    Resolved,
}

impl RemediationStatus {
    /// `true` if moving from `self` to `next` does not go backward.
    pub fn can_transition_to(self, next: RemediationStatus) -> bool {
        next >= self
    }
}

impl FromStr for RemediationStatus {
    type Err = RemediationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(RemediationStatus::Open),
            "documented" => Ok(RemediationStatus::Documented),
            "resolved" => Ok(RemediationStatus::Resolved),
            other => Err(RemediationError::Validation(format!(
                "unknown remediation status '{other}'"
            ))),
        }
    }
}

/// `{ problem, fix, status }` of spec §4.7, plus an id and a free-form
/// identifier slot for attaching e.g. a CVE number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationRecord {
    pub id: String,
    pub problem: String,
    pub fix: Option<String>,
    pub status: RemediationStatus,
    pub tags: Vec<String>,
    #[serde(default)]
    pub identifier: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRemediation {
    pub record: RemediationRecord,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions_never_move_backward() {
        assert!(RemediationStatus::Open.can_transition_to(RemediationStatus::Documented));
        assert!(RemediationStatus::Documented.can_transition_to(RemediationStatus::Resolved));
        assert!(RemediationStatus::Open.can_transition_to(RemediationStatus::Open));
        assert!(!RemediationStatus::Resolved.can_transition_to(RemediationStatus::Open));
        assert!(!RemediationStatus::Documented.can_transition_to(RemediationStatus::Open));
    }

    #[test]
    fn parses_known_status_strings() {
        assert_eq!(RemediationStatus::from_str("open").unwrap(), RemediationStatus::Open);
        assert!(RemediationStatus::from_str("unknown").is_err());
    }
}
