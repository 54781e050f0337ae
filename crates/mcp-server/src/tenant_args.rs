//! The tenant triple every MCP tool argument object carries (spec.md §7.3:
//! "Tools accept an object with tenant triple fields").

use contextd_tenant::TenantInfo;

/// Build a [`TenantInfo`] from the three fields every request schema in
/// this crate repeats inline (`tenant_id`, `team_id`, `project_id`). `Err`
/// carries a message suitable to hand straight to `CallToolResult::error`.
pub fn tenant_from(
    tenant_id: String,
    team_id: Option<String>,
    project_id: String,
) -> Result<TenantInfo, String> {
    let tenant = TenantInfo::new(tenant_id, project_id).map_err(|err| err.to_string())?;
    match team_id {
        Some(team_id) => tenant.with_team(team_id).map_err(|err| err.to_string()),
        None => Ok(tenant),
    }
}
