//! Shared wire types for the MCP tool surface and the auxiliary HTTP API:
//! the error envelope, capability advertisement, and response-budget
//! enforcement helpers. Adapted from the teacher's `context-protocol`
//! crate — same `ErrorEnvelope`/budget pattern, trimmed to the fields
//! contextd's tools actually use (no per-code-search-tool char caps).

use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const CAPABILITIES_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTruncation {
    MaxChars,
    MaxItems,
    Timeout,
}

/// `repository_search`'s `content_mode` (§7.3): how much of a matched
/// file's content is returned alongside path/score/branch.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentMode {
    Minimal,
    Preview,
    Full,
}

impl Default for ContentMode {
    fn default() -> Self {
        ContentMode::Minimal
    }
}

/// Max characters of content a `preview` response may carry, per §7.3
/// ("preview(≤200 chars)").
pub const PREVIEW_MAX_CHARS: usize = 200;

impl ContentMode {
    /// Truncate `content` to what this mode permits. `Minimal` always
    /// drops content entirely regardless of its length.
    pub fn apply(self, content: &str) -> Option<String> {
        match self {
            ContentMode::Minimal => None,
            ContentMode::Preview => Some(content.chars().take(PREVIEW_MAX_CHARS).collect()),
            ContentMode::Full => Some(content.to_string()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ToolNextAction {
    pub tool: String,
    pub args: serde_json::Value,
    pub reason: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct ErrorEnvelope {
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
    pub hint: Option<String>,
    #[serde(default)]
    pub next_actions: Vec<ToolNextAction>,
}

/// Response-size budgets shared across MCP tools and the HTTP API. Trimmed
/// from the teacher's per-tool field set (`cat_max_chars`, `rg_max_chars`,
/// ...) down to the shapes contextd's tools actually return: a flat char
/// cap plus result-count caps for search/list tools.
#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct DefaultBudgets {
    pub max_chars: usize,
    pub search_max_items: usize,
    pub list_max_items: usize,
}

impl Default for DefaultBudgets {
    fn default() -> Self {
        Self {
            max_chars: 20_000,
            search_max_items: 50,
            list_max_items: 100,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct CapabilitiesServer {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct CapabilitiesVersions {
    pub command_api: String,
    pub mcp: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, JsonSchema)]
pub struct Capabilities {
    pub schema_version: u32,
    pub server: CapabilitiesServer,
    pub versions: CapabilitiesVersions,
    pub default_budgets: DefaultBudgets,
    pub start_route: ToolNextAction,
}

pub fn finalize_used_chars<T: Serialize>(
    value: &mut T,
    mut set_used: impl FnMut(&mut T, usize),
) -> Result<usize> {
    let mut used = 0usize;
    for _ in 0..8 {
        set_used(value, used);
        let raw = serde_json::to_string(value)?;
        let next = raw.chars().count();
        if next == used {
            set_used(value, next);
            return Ok(next);
        }
        used = next;
    }
    set_used(value, used);
    Ok(used)
}

pub fn enforce_max_chars<T: Serialize>(
    value: &mut T,
    max_chars: usize,
    mut set_used: impl FnMut(&mut T, usize),
    mut on_truncate: impl FnMut(&mut T),
    mut shrink: impl FnMut(&mut T) -> bool,
) -> Result<usize> {
    loop {
        let used = finalize_used_chars(value, |inner, used| set_used(inner, used))?;
        if used <= max_chars {
            return Ok(used);
        }
        on_truncate(value);
        if !shrink(value) {
            anyhow::bail!("budget exceeded (used_chars={used}, max_chars={max_chars})");
        }
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_mode_minimal_drops_content() {
        assert_eq!(ContentMode::Minimal.apply("anything"), None);
    }

    #[test]
    fn content_mode_preview_truncates_to_200_chars() {
        let long: String = std::iter::repeat('x').take(500).collect();
        let preview = ContentMode::Preview.apply(&long).unwrap();
        assert_eq!(preview.chars().count(), 200);
    }

    #[test]
    fn content_mode_full_keeps_everything() {
        let text = "the complete file body";
        assert_eq!(ContentMode::Full.apply(text).as_deref(), Some(text));
    }

    #[test]
    fn content_mode_default_is_minimal() {
        assert_eq!(ContentMode::default(), ContentMode::Minimal);
    }

    #[test]
    fn enforce_max_chars_shrinks_until_within_budget() {
        #[derive(Serialize)]
        struct Payload {
            items: Vec<String>,
            used_chars: usize,
        }

        let mut payload = Payload {
            items: vec!["a".repeat(10); 20],
            used_chars: 0,
        };

        let used = enforce_max_chars(
            &mut payload,
            120,
            |p, n| p.used_chars = n,
            |_| {},
            |p| {
                if p.items.is_empty() {
                    false
                } else {
                    p.items.pop();
                    true
                }
            },
        )
        .unwrap();

        assert!(used <= 120);
    }

    #[test]
    fn enforce_max_chars_bails_when_shrink_is_exhausted() {
        #[derive(Serialize)]
        struct Payload {
            items: Vec<String>,
        }

        let mut payload = Payload {
            items: vec!["x".repeat(1000)],
        };

        let result = enforce_max_chars(&mut payload, 10, |_, _| {}, |_| {}, |_| false);
        assert!(result.is_err());
    }
}
