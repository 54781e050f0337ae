use crate::message::{RawMessage, Role};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One named heuristic pattern and its confidence weight. Weights are
/// normative defaults; a deployment may supply its own set via config.
#[derive(Clone)]
pub struct DecisionPattern {
    pub name: &'static str,
    pub regex: Regex,
    pub weight: f32,
}

fn pattern(name: &'static str, source: &str, weight: f32) -> DecisionPattern {
    DecisionPattern {
        name,
        regex: Regex::new(source).expect("decision pattern regex is valid"),
        weight,
    }
}

/// Default pattern set (spec-normative weights).
pub fn default_patterns() -> Vec<DecisionPattern> {
    vec![
        pattern(
            "lets_use",
            r"(?i)\blet'?s use\b",
            0.9,
        ),
        pattern(
            "decided_to",
            r"(?i)\bdecided to\b",
            0.9,
        ),
        pattern(
            "approach_is",
            r"(?i)\b(the )?approach is\b",
            0.8,
        ),
        pattern(
            "dont_because",
            r"(?i)\bdon'?t\b.{0,40}\bbecause\b",
            0.8,
        ),
        pattern(
            "avoid_because",
            r"(?i)\bavoid\b.{0,40}\bbecause\b",
            0.8,
        ),
        pattern(
            "remember_this",
            r"(?i)\bremember this\b",
            1.0,
        ),
        pattern(
            "note_future",
            r"(?i)\bnote for (the )?future\b",
            1.0,
        ),
    ]
}

#[derive(Debug, Clone)]
pub struct DecisionDetectorConfig {
    pub confidence_threshold: f32,
    pub llm_refine_threshold: f32,
    pub context_window: usize,
    pub context_truncate_chars: usize,
}

impl Default for DecisionDetectorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            llm_refine_threshold: 0.8,
            context_window: 3,
            context_truncate_chars: 200,
        }
    }
}

/// A heuristic hit against one assistant message, still in need of
/// (optional) LLM refinement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionCandidate {
    pub session_id: String,
    pub message_uuid: String,
    pub content: String,
    pub context_window: Vec<String>,
    pub pattern_matched: String,
    pub confidence: f32,
    pub needs_refine: bool,
}

/// The refined record produced from a candidate, either by the summarizer
/// or by first-sentence fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub summary: String,
    pub reasoning: Option<String>,
    pub alternatives: Vec<String>,
    pub tags: Vec<String>,
    pub confidence: f32,
}

/// Truncate `text` to at most `max_chars` Unicode code points, never
/// splitting inside one — `chars()` already iterates scalar values, so a
/// plain take/collect can't produce an invalid UTF-8 boundary.
pub fn truncate_code_points(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn format_context_entry(message: &RawMessage, max_chars: usize) -> String {
    let role = Role::from_str(&message.role)
        .map(|r| r.label())
        .unwrap_or("Unknown");
    format!("{role}: {}", truncate_code_points(&message.content, max_chars))
}

/// Scan `messages` for assistant-authored decisions. `messages` must be in
/// chronological order — the context window looks backward from each
/// matching message's position.
pub fn detect_candidates(
    messages: &[RawMessage],
    patterns: &[DecisionPattern],
    config: &DecisionDetectorConfig,
) -> Vec<DecisionCandidate> {
    let mut candidates = Vec::new();

    for (index, message) in messages.iter().enumerate() {
        if message.role != "assistant" {
            continue;
        }

        // Among matching patterns, the highest weight wins; ties go to
        // whichever matched pattern was declared first. `Iterator::max_by`
        // returns the *last* maximal element, so the fold below only
        // replaces `best` on a strictly greater weight.
        let best = patterns
            .iter()
            .filter(|p| p.regex.is_match(&message.content))
            .fold(None::<&DecisionPattern>, |best, candidate| match best {
                Some(current) if candidate.weight <= current.weight => Some(current),
                _ => Some(candidate),
            });

        let Some(best) = best else {
            continue;
        };

        if best.weight < config.confidence_threshold {
            continue;
        }

        let start = index.saturating_sub(config.context_window);
        let context_window = messages[start..index]
            .iter()
            .map(|m| format_context_entry(m, config.context_truncate_chars))
            .collect();

        candidates.push(DecisionCandidate {
            session_id: message.session_id.clone(),
            message_uuid: message.uuid.clone(),
            content: message.content.clone(),
            context_window,
            pattern_matched: best.name.to_string(),
            confidence: best.weight,
            needs_refine: best.weight < config.llm_refine_threshold,
        });
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(role: &str, content: &str) -> RawMessage {
        RawMessage {
            session_id: "s1".to_string(),
            uuid: format!("u-{content}"),
            role: role.to_string(),
            content: content.to_string(),
            tool_calls: vec![],
            timestamp: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn lets_use_pattern_produces_expected_candidate() {
        let messages = vec![
            message("user", "How to cache?"),
            message("assistant", "Let's use Redis since it's in our stack."),
        ];
        let candidates =
            detect_candidates(&messages, &default_patterns(), &DecisionDetectorConfig::default());
        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.pattern_matched, "lets_use");
        assert_eq!(candidate.confidence, 0.9);
        assert_eq!(candidate.context_window, vec!["User: How to cache?"]);
        assert!(!candidate.needs_refine);
    }

    #[test]
    fn below_threshold_pattern_is_discarded() {
        let config = DecisionDetectorConfig {
            confidence_threshold: 0.85,
            ..Default::default()
        };
        let messages = vec![message(
            "assistant",
            "The approach is to cache responses.",
        )];
        let candidates = detect_candidates(&messages, &default_patterns(), &config);
        assert!(candidates.is_empty());
    }

    #[test]
    fn confidence_exactly_at_threshold_is_accepted() {
        let config = DecisionDetectorConfig {
            confidence_threshold: 0.8,
            ..Default::default()
        };
        let messages = vec![message("assistant", "The approach is solid.")];
        let candidates = detect_candidates(&messages, &default_patterns(), &config);
        assert_eq!(candidates.len(), 1);
    }

    #[test]
    fn non_assistant_messages_are_never_candidates() {
        let messages = vec![message("user", "Let's use Redis.")];
        let candidates =
            detect_candidates(&messages, &default_patterns(), &DecisionDetectorConfig::default());
        assert!(candidates.is_empty());
    }

    #[test]
    fn context_truncation_preserves_utf8_on_multibyte_input() {
        let text: String = std::iter::repeat('\u{1F600}').take(300).collect();
        let truncated = truncate_code_points(&text, 200);
        assert_eq!(truncated.chars().count(), 200);
        assert!(std::str::from_utf8(truncated.as_bytes()).is_ok());
    }
}
