use crate::error::{ConversationError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::Tool => "Tool",
        }
    }
}

impl FromStr for Role {
    type Err = ConversationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "tool" => Ok(Role::Tool),
            other => Err(ConversationError::Validation(format!(
                "unknown message role '{other}'"
            ))),
        }
    }
}

/// One tool invocation recorded on a transcript line, prior to being split
/// into `FileReference`/`CommitReference` side-tables.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolCallRaw {
    pub name: String,
    #[serde(default)]
    pub file_path: Option<String>,
    #[serde(default)]
    pub operation: Option<String>,
    #[serde(default)]
    pub commit_sha: Option<String>,
}

/// Raw shape of one line of the JSONL transcript, before it's split into a
/// `RawMessage` and side-tables.
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptLine {
    pub session_id: String,
    pub uuid: String,
    pub role: String,
    pub content: String,
    pub timestamp: String,
    #[serde(default)]
    pub tool_calls: Vec<ToolCallRaw>,
}

/// Line-level parse of an agent session transcript. Immutable after ingest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub session_id: String,
    pub uuid: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub tool_calls: Vec<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileReference {
    pub session_id: String,
    pub message_uuid: String,
    pub path: String,
    pub operation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitReference {
    pub session_id: String,
    pub message_uuid: String,
    pub sha: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedTranscript {
    pub messages: Vec<RawMessage>,
    pub file_references: Vec<FileReference>,
    pub commit_references: Vec<CommitReference>,
}

/// Parse an append-only JSONL transcript: one JSON object per line. Blank
/// lines are skipped; a malformed line is a hard validation error rather
/// than silently dropped, since a corrupt transcript should not produce a
/// partial, seemingly-complete ingest.
pub fn parse_jsonl(input: &str) -> Result<ParsedTranscript> {
    let mut parsed = ParsedTranscript::default();
    for (line_no, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let raw: TranscriptLine = serde_json::from_str(line).map_err(|err| {
            ConversationError::Validation(format!("transcript line {}: {err}", line_no + 1))
        })?;
        let role = Role::from_str(&raw.role)?;

        match role {
            Role::User | Role::Assistant => {
                parsed.messages.push(RawMessage {
                    session_id: raw.session_id,
                    uuid: raw.uuid,
                    role: raw.role,
                    content: raw.content,
                    tool_calls: raw.tool_calls.iter().map(|tc| tc.name.clone()).collect(),
                    timestamp: raw.timestamp,
                });
            }
            Role::Tool => {
                for tool_call in &raw.tool_calls {
                    if let (Some(path), Some(operation)) =
                        (&tool_call.file_path, &tool_call.operation)
                    {
                        parsed.file_references.push(FileReference {
                            session_id: raw.session_id.clone(),
                            message_uuid: raw.uuid.clone(),
                            path: path.clone(),
                            operation: operation.clone(),
                        });
                    }
                    if let Some(sha) = &tool_call.commit_sha {
                        parsed.commit_references.push(CommitReference {
                            session_id: raw.session_id.clone(),
                            message_uuid: raw.uuid.clone(),
                            sha: sha.clone(),
                        });
                    }
                }
            }
        }
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_messages_and_tool_side_tables() {
        let input = r#"{"session_id":"s1","uuid":"u1","role":"user","content":"How to cache?","timestamp":"2026-01-01T00:00:00Z"}
{"session_id":"s1","uuid":"u2","role":"assistant","content":"Let's use Redis.","timestamp":"2026-01-01T00:00:01Z"}
{"session_id":"s1","uuid":"u3","role":"tool","content":"edited file","timestamp":"2026-01-01T00:00:02Z","tool_calls":[{"name":"edit","file_path":"src/cache.rs","operation":"write"},{"name":"commit","commit_sha":"abc123"}]}
"#;
        let parsed = parse_jsonl(input).unwrap();
        assert_eq!(parsed.messages.len(), 2);
        assert_eq!(parsed.file_references.len(), 1);
        assert_eq!(parsed.file_references[0].path, "src/cache.rs");
        assert_eq!(parsed.commit_references.len(), 1);
        assert_eq!(parsed.commit_references[0].sha, "abc123");
    }

    #[test]
    fn skips_blank_lines() {
        let input = "\n\n{\"session_id\":\"s1\",\"uuid\":\"u1\",\"role\":\"user\",\"content\":\"hi\",\"timestamp\":\"t\"}\n\n";
        let parsed = parse_jsonl(input).unwrap();
        assert_eq!(parsed.messages.len(), 1);
    }

    #[test]
    fn rejects_unknown_role() {
        let input = "{\"session_id\":\"s1\",\"uuid\":\"u1\",\"role\":\"system\",\"content\":\"hi\",\"timestamp\":\"t\"}";
        assert!(parse_jsonl(input).is_err());
    }
}
