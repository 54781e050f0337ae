//! # contextd-statusline
//!
//! Direct, in-process reads of collection sizes for a lightweight status
//! display — never goes over HTTP.

mod service;
mod types;

pub use service::StatuslineService;
pub use types::{StatuslineSnapshot, UNKNOWN_COUNT};
