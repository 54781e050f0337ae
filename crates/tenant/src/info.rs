use crate::error::{Result, TenantError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

static ID_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9_\-]{1,64}$").unwrap());

/// Identity carried on every store request: `(tenant_id, team_id, project_id)`
/// plus the optional filesystem path the project id was derived from.
///
/// Every document written to the vector store has this triple stored in its
/// metadata map; every query has a matching equality filter injected
/// (fail-closed, see [`crate::context`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantInfo {
    pub tenant_id: String,
    pub team_id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<String>,
}

impl TenantInfo {
    /// `team_id` defaults to `tenant_id` when not given.
    pub fn new(tenant_id: impl Into<String>, project_id: impl Into<String>) -> Result<Self> {
        let tenant_id = tenant_id.into();
        let project_id = project_id.into();
        validate_id("tenant_id", &tenant_id)?;
        validate_id("project_id", &project_id)?;
        Ok(Self {
            team_id: tenant_id.clone(),
            tenant_id,
            project_id,
            project_path: None,
        })
    }

    pub fn with_team(mut self, team_id: impl Into<String>) -> Result<Self> {
        let team_id = team_id.into();
        validate_id("team_id", &team_id)?;
        self.team_id = team_id;
        Ok(self)
    }

    pub fn with_project_path(mut self, path: impl Into<String>) -> Self {
        self.project_path = Some(path.into());
        self
    }

    /// Derive a `project_id` from a project directory path: the basename of
    /// the path after trimming trailing separators.
    ///
    /// §9 open question: the original behavior yields `"default"` for a path
    /// ending in a separator (it reads the empty final component). This
    /// implementation normalizes trailing separators first, per the spec's
    /// recommendation — see `DESIGN.md` for the resolved decision.
    pub fn derive_project_id(path: &Path) -> String {
        let trimmed = path
            .to_string_lossy()
            .trim_end_matches(['/', '\\'])
            .to_string();
        let trimmed_path = Path::new(&trimmed);
        match trimmed_path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => "default".to_string(),
        }
    }

    /// Equality filter every store query MUST carry: tenant/team/project must
    /// all match for a document to be visible.
    pub fn as_filter(&self) -> Vec<(&'static str, String)> {
        vec![
            ("tenant_id", self.tenant_id.clone()),
            ("team_id", self.team_id.clone()),
            ("project_id", self.project_id.clone()),
        ]
    }

    pub fn collection_suffix(&self) -> String {
        format!("{}_{}", self.tenant_id, self.project_id)
    }
}

fn validate_id(field: &'static str, value: &str) -> Result<()> {
    if ID_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(TenantError::InvalidId {
            field,
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_tenant_id() {
        assert!(TenantInfo::new("Bad Tenant!", "proj").is_err());
        assert!(TenantInfo::new("bad/tenant", "proj").is_err());
    }

    #[test]
    fn team_defaults_to_tenant() {
        let info = TenantInfo::new("acme", "proj").unwrap();
        assert_eq!(info.team_id, "acme");
    }

    #[test]
    fn derive_project_id_trims_trailing_separators() {
        assert_eq!(
            TenantInfo::derive_project_id(Path::new("/repos/my-project/")),
            "my-project"
        );
        assert_eq!(
            TenantInfo::derive_project_id(Path::new("/repos/my-project")),
            "my-project"
        );
        assert_eq!(
            TenantInfo::derive_project_id(Path::new("/repos/my-project///")),
            "my-project"
        );
    }
}
