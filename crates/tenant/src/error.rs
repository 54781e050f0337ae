use thiserror::Error;

pub type Result<T> = std::result::Result<T, TenantError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TenantError {
    /// §4.2 / §7 ErrTenantMissing: a call reached a tenant-scoped boundary
    /// with no ambient tenant and no configured default.
    #[error("no tenant context: request must carry an authenticated tenant identity")]
    Missing,

    /// §7 ErrValidation: malformed tenant/team/project id.
    #[error("invalid {field}: '{value}' does not match ^[a-z0-9_-]{{1,64}}$")]
    InvalidId { field: &'static str, value: String },
}
