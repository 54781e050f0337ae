pub mod checkpoint;
pub mod health;
pub mod init;
pub mod mcp;
pub mod metadata;
pub mod scrub;
pub mod serve;
pub mod status;
pub mod statusline;

use anyhow::{Context, Result};
use contextd_tenant::TenantInfo;

use crate::config::Config;

/// Every tenant-scoped subcommand resolves against the config's
/// `default_tenant`, overridden by the global `--tenant`/`--team`/`--project`
/// flags (already folded into `config.default_tenant` in `main.rs` before
/// dispatch). Fails closed: no tenant id means no command runs.
pub fn resolve_tenant(config: &Config) -> Result<TenantInfo> {
    let tenant_id = config
        .default_tenant
        .tenant_id
        .clone()
        .context("no tenant configured: pass --tenant or set default_tenant in the config file")?;
    let project_id = config.default_tenant.project_id.clone().unwrap_or_else(|| "default".to_string());
    let tenant = TenantInfo::new(tenant_id, project_id)?;
    Ok(match &config.default_tenant.team_id {
        Some(team_id) => tenant.with_team(team_id.clone())?,
        None => tenant,
    })
}
