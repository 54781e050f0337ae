//! Tenant identity and fail-closed context propagation.
//!
//! Every entity in contextd lives under a `(tenant_id, team_id, project_id)`
//! triple. This crate owns that triple's shape and validation ([`TenantInfo`])
//! plus the ambient-context machinery ([`context`]) that carries it from an
//! authenticated transport down to the vector-store boundary without forcing
//! every intermediate call to take it as a parameter.

mod context;
mod error;
mod info;

pub use context::{tenant_from_context, with_tenant, DefaultTenantPolicy};
pub use error::{Result, TenantError};
pub use info::TenantInfo;
