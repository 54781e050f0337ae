use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

/// Error taxonomy of spec §7: kinds, not concrete per-call types. Every
/// service layered on the store translates its own failures into one of
/// these so the MCP/HTTP/CLI surfaces have a single vocabulary to map onto
/// transport-specific responses (404 for NotFound and TenantMissing alike —
/// see [`VectorStoreError::http_status`]).
#[derive(Error, Debug)]
pub enum VectorStoreError {
    /// A query or mutation reached the store with no tenant filter at all.
    /// Fail-closed: never silently treated as "empty result".
    #[error("no tenant context: refusing to serve an unfiltered request")]
    TenantMissing,

    /// Id does not exist, or belongs to a different tenant. The two cases
    /// are indistinguishable by design (§7: "do not disclose existence").
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed input: bad tenant id, empty required field, unknown resume
    /// level, invalid hash/collection-name format.
    #[error("validation error: {0}")]
    Validation(String),

    /// A collection directory has document records but no metadata record.
    /// The store never auto-repairs; returned only from health scans.
    #[error("corrupt collection '{0}': documents present but no metadata record")]
    Corrupt(String),

    /// Embedding provider or LLM call failed after exhausting retries.
    #[error("external dependency failed: {0}")]
    External(String),

    /// Context deadline or explicit cancellation observed mid-operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Restore-from-quarantine (or similar) when the target path already
    /// exists.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl VectorStoreError {
    /// HTTP status an auxiliary endpoint should map this to. Per §7,
    /// tenant-scoped failures on a transport that can't authenticate the
    /// caller return 404 rather than 401/403 to avoid enumeration; the same
    /// 404 covers plain not-found so existence is never disclosed either way.
    pub fn http_status(&self) -> u16 {
        match self {
            VectorStoreError::TenantMissing | VectorStoreError::NotFound(_) => 404,
            VectorStoreError::Validation(_) | VectorStoreError::InvalidDimension { .. } => 400,
            VectorStoreError::Conflict(_) => 409,
            VectorStoreError::Cancelled => 499,
            VectorStoreError::Corrupt(_) | VectorStoreError::External(_) => 502,
            VectorStoreError::Io(_) | VectorStoreError::Serialization(_) => 500,
        }
    }
}
