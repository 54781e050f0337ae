use crate::decision::{Decision, DecisionCandidate};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ModelDecision {
    summary: String,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    alternatives: Vec<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    confidence: Option<f32>,
}

/// Strip a markdown code fence (```` ```json ... ``` ````) if present,
/// since models routinely wrap JSON responses in one despite being asked
/// not to.
fn unfence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let after_open = after_open
        .strip_prefix("json")
        .unwrap_or(after_open)
        .trim_start_matches('\n');
    match after_open.rfind("```") {
        Some(end) => after_open[..end].trim(),
        None => after_open.trim(),
    }
}

/// Parse a model's raw text response into a [`Decision`], falling back to
/// the candidate's first-sentence summary on any parse failure. A
/// model-returned confidence is only honored when it lies in (0, 1];
/// otherwise the candidate's own heuristic confidence is kept.
pub fn parse_model_response(raw: &str, candidate: &DecisionCandidate) -> Decision {
    let parsed: Option<ModelDecision> = serde_json::from_str(unfence(raw)).ok();

    match parsed {
        Some(model) => {
            let confidence = match model.confidence {
                Some(c) if c > 0.0 && c <= 1.0 => c,
                _ => candidate.confidence,
            };
            Decision {
                summary: model.summary,
                reasoning: model.reasoning,
                alternatives: model.alternatives,
                tags: model.tags,
                confidence,
            }
        }
        None => Decision {
            summary: super::first_sentence(&candidate.content),
            reasoning: None,
            alternatives: Vec::new(),
            tags: Vec::new(),
            confidence: candidate.confidence,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> DecisionCandidate {
        DecisionCandidate {
            session_id: "s1".to_string(),
            message_uuid: "u1".to_string(),
            content: "Let's use Redis. It's already in our stack.".to_string(),
            context_window: vec![],
            pattern_matched: "lets_use".to_string(),
            confidence: 0.9,
            needs_refine: false,
        }
    }

    #[test]
    fn parses_plain_json() {
        let raw = r#"{"summary":"Use Redis for caching","confidence":0.95}"#;
        let decision = parse_model_response(raw, &candidate());
        assert_eq!(decision.summary, "Use Redis for caching");
        assert_eq!(decision.confidence, 0.95);
    }

    #[test]
    fn parses_fenced_json() {
        let raw = "```json\n{\"summary\":\"Use Redis\",\"confidence\":0.7}\n```";
        let decision = parse_model_response(raw, &candidate());
        assert_eq!(decision.summary, "Use Redis");
        assert_eq!(decision.confidence, 0.7);
    }

    #[test]
    fn out_of_range_confidence_falls_back_to_candidate() {
        let raw = r#"{"summary":"Use Redis","confidence":1.5}"#;
        let decision = parse_model_response(raw, &candidate());
        assert_eq!(decision.confidence, 0.9);
    }

    #[test]
    fn unparseable_response_degrades_to_first_sentence() {
        let decision = parse_model_response("not json at all", &candidate());
        assert_eq!(decision.summary, "Let's use Redis.");
        assert_eq!(decision.confidence, 0.9);
    }
}
