//! # contextd-remediation
//!
//! `{problem, fix, status}` records with a monotonic status lifecycle and
//! hybrid semantic + exact-tag search — a smaller twin of the reasoning
//! bank.

mod error;
mod id;
mod service;
mod types;

pub use error::{RemediationError, Result};
pub use id::{new_remediation_id, REMEDIATION_ID_PREFIX};
pub use service::RemediationService;
pub use types::{RemediationRecord, RemediationStatus, ScoredRemediation};
