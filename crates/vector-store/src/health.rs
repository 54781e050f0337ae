use serde::{Deserialize, Serialize};

/// Total categorization of every collection directory under `<root>` and
/// `<root>/quarantine` (§8 invariant 5): each one is exactly one of
/// `healthy`, `corrupt`, `empty` (removed on sight), `quarantined`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    /// Collection names with a metadata record (loadable as-is).
    pub healthy: Vec<String>,
    /// Hash-directories found with documents but no metadata record at the
    /// moment of this scan, before being moved to quarantine. In normal
    /// operation this is empty — the startup reconciliation pass already
    /// quarantines anything in this state.
    pub corrupt: Vec<String>,
    /// Hash-directories currently resting under `quarantine/`.
    pub quarantined: Vec<String>,
    /// Empty hash-directories (no metadata, no documents) removed during
    /// this scan.
    pub empty_removed: Vec<String>,
}

impl HealthReport {
    pub fn total_unhealthy(&self) -> usize {
        self.corrupt.len() + self.quarantined.len()
    }
}
