use once_cell::sync::Lazy;
use regex::Regex;

/// One redaction rule: a compiled pattern, the opaque placeholder it's
/// replaced with, and whether it only applies to the stricter outbound mode.
pub struct SecretPattern {
    pub name: &'static str,
    pub regex: Lazy<Regex>,
    pub replacement: &'static str,
    pub outbound_only: bool,
}

macro_rules! pattern {
    ($name:expr, $re:expr, $replacement:expr, $outbound_only:expr) => {
        SecretPattern {
            name: $name,
            regex: Lazy::new(|| Regex::new($re).expect("static scrubber pattern must compile")),
            replacement: $replacement,
            outbound_only: $outbound_only,
        }
    };
}

/// Patterns are matched in this order: most specific provider prefixes
/// first, so a generic `api[_-]?key = ...` rule never clobbers a more
/// precise label (e.g. an Anthropic key) with a less informative one.
pub static PATTERNS: Lazy<Vec<SecretPattern>> = Lazy::new(|| vec![
    pattern!(
        "anthropic_api_key",
        r"sk-ant-[A-Za-z0-9_\-]{20,}",
        "[REDACTED:API_KEY]",
        false
    ),
    pattern!(
        "openai_api_key",
        r"sk-[A-Za-z0-9]{20,}",
        "[REDACTED:API_KEY]",
        false
    ),
    pattern!(
        "pem_private_key",
        r"(?s)-----BEGIN [A-Z ]*PRIVATE KEY-----.*?-----END [A-Z ]*PRIVATE KEY-----",
        "[REDACTED:PRIVATE_KEY]",
        false
    ),
    pattern!(
        "bearer_token",
        r"(?i)\bbearer\s+[A-Za-z0-9\-_\.=]{8,}",
        "Bearer [REDACTED:TOKEN]",
        false
    ),
    pattern!(
        "generic_api_key",
        r#"(?i)\bapi[_-]?key\b\s*[:=]\s*['"]?[A-Za-z0-9\-_\.]{8,}['"]?"#,
        "api_key=[REDACTED:API_KEY]",
        false
    ),
    pattern!(
        "generic_token",
        r#"(?i)\btoken\b\s*[:=]\s*['"]?[A-Za-z0-9\-_\.]{8,}['"]?"#,
        "token=[REDACTED:TOKEN]",
        false
    ),
    pattern!(
        "generic_password",
        r#"(?i)\bpass(?:word)?\b\s*[:=]\s*['"]?\S{4,}['"]?"#,
        "password=[REDACTED:PASSWORD]",
        false
    ),
    // Outbound-only: stricter — catches anything that merely looks like a
    // long opaque secret-shaped token, at the cost of some false positives
    // that are acceptable to redact before a network call but not when just
    // storing a conversation for later retrieval.
    pattern!(
        "outbound_opaque_secret",
        r"\b[A-Za-z0-9_\-]{32,}\b",
        "[REDACTED:POSSIBLE_SECRET]",
        true
    ),
]);
