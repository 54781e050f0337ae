//! Ambient tenant propagation.
//!
//! Rust has no implicit per-request context object, so "ambient" here means a
//! task-local scope (`tokio::task_local!`) rather than a process-wide global:
//! [`with_tenant`] installs the value for the lifetime of a future, and
//! [`tenant_from_context`] reads it back. The vector-store boundary never
//! reads this task-local directly — every store call still takes an explicit
//! `&TenantInfo` parameter (§9 "must be explicit at the store boundary");
//! this module only exists to let MCP/HTTP/CLI entry points thread the
//! authenticated tenant down to the service call without a parameter on
//! every intermediate function.

use crate::error::{Result, TenantError};
use crate::info::TenantInfo;
use std::future::Future;

tokio::task_local! {
    static CURRENT_TENANT: TenantInfo;
}

/// Run `f` with `info` installed as the ambient tenant for its duration.
pub async fn with_tenant<F>(info: TenantInfo, f: F) -> F::Output
where
    F: Future,
{
    CURRENT_TENANT.scope(info, f).await
}

/// Read the ambient tenant, or `ErrTenantMissing` if none is installed.
///
/// Never falls back to a wide-open (no filter) state. The only sanctioned
/// bypass is an explicit `default_tenant` configured on the service
/// constructor (see `DefaultTenantPolicy`).
pub fn tenant_from_context() -> Result<TenantInfo> {
    CURRENT_TENANT
        .try_with(|info| info.clone())
        .map_err(|_| TenantError::Missing)
}

/// Policy a service constructor accepts so single-user/CLI deployments can
/// operate without an authenticated transport supplying a tenant on every
/// call. Enabling this is the *only* way to bypass `ErrTenantMissing`; the
/// default tenant is still carried through `as_filter()` like any other
/// tenant, never as a wide-open query.
#[derive(Debug, Clone, Default)]
pub struct DefaultTenantPolicy {
    pub default_tenant: Option<TenantInfo>,
}

impl DefaultTenantPolicy {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_default(tenant: TenantInfo) -> Self {
        Self {
            default_tenant: Some(tenant),
        }
    }

    /// Resolve the effective tenant for a call: ambient context first, then
    /// the configured default, then fail closed.
    pub fn resolve(&self, ambient: Result<TenantInfo>) -> Result<TenantInfo> {
        match ambient {
            Ok(info) => Ok(info),
            Err(TenantError::Missing) => self
                .default_tenant
                .clone()
                .ok_or(TenantError::Missing),
            Err(other) => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_context_fails_closed() {
        assert_eq!(tenant_from_context(), Err(TenantError::Missing));
    }

    #[tokio::test]
    async fn with_tenant_installs_ambient_value() {
        let info = TenantInfo::new("acme", "proj").unwrap();
        let observed = with_tenant(info.clone(), async { tenant_from_context() }).await;
        assert_eq!(observed, Ok(info));
    }

    #[tokio::test]
    async fn default_tenant_policy_only_applies_when_ambient_missing() {
        let default = TenantInfo::new("default-tenant", "proj").unwrap();
        let policy = DefaultTenantPolicy::with_default(default.clone());
        assert_eq!(policy.resolve(Err(TenantError::Missing)), Ok(default));

        let explicit = TenantInfo::new("explicit", "proj").unwrap();
        assert_eq!(
            policy.resolve(Ok(explicit.clone())),
            Ok(explicit)
        );
    }

    #[test]
    fn no_default_tenant_still_fails_closed() {
        let policy = DefaultTenantPolicy::none();
        assert_eq!(policy.resolve(Err(TenantError::Missing)), Err(TenantError::Missing));
    }
}
