use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sentinel for a count that could not be determined — distinct from a
/// genuine zero, per §4.8 ("unknown counts are represented by a sentinel,
/// not zero").
pub const UNKNOWN_COUNT: i64 = -1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatuslineSnapshot {
    pub checkpoints: i64,
    pub memories: i64,
    pub services: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_usage_percent: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_confidence: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_compression_ratio: Option<f32>,
}

impl Default for StatuslineSnapshot {
    fn default() -> Self {
        Self {
            checkpoints: UNKNOWN_COUNT,
            memories: UNKNOWN_COUNT,
            services: BTreeMap::new(),
            context_usage_percent: None,
            last_confidence: None,
            last_compression_ratio: None,
        }
    }
}
