//! # contextd-checkpoint
//!
//! Save / List / Resume over session checkpoints, with tiered detail
//! (summary / context / full) and lazy loading of `full_state` so cheap
//! resumes never pay to read the expensive tier.

mod error;
mod id;
mod service;
mod types;

pub use error::{CheckpointError, Result};
pub use id::{is_checkpoint_id, new_checkpoint_id, CHECKPOINT_ID_PREFIX};
pub use service::CheckpointService;
pub use types::{
    CheckpointRecord, ListCheckpointsQuery, ResumeLevel, ResumedCheckpoint, SaveCheckpointInput,
};
