/// One entry in the tag rulebook: a tag name and the lowercase substrings
/// (words or file extensions) that trigger it.
struct TagRule {
    tag: &'static str,
    needles: &'static [&'static str],
}

const LANGUAGE_RULES: &[TagRule] = &[
    TagRule { tag: "rust", needles: &[".rs", "cargo.toml", "rustc", " rust "] },
    TagRule { tag: "python", needles: &[".py", "pip install", "pytest", " python "] },
    TagRule { tag: "typescript", needles: &[".ts", ".tsx", "tsconfig", " typescript "] },
    TagRule { tag: "javascript", needles: &[".js", ".jsx", "npm install", " javascript "] },
    TagRule { tag: "go", needles: &[".go", "go.mod", "goroutine"] },
];

const INFRASTRUCTURE_RULES: &[TagRule] = &[
    TagRule { tag: "database", needles: &["postgres", "sqlite", "mysql", " database ", " sql "] },
    TagRule { tag: "cache", needles: &["redis", " cache ", "caching", "memcached"] },
    TagRule { tag: "containers", needles: &["docker", "dockerfile", "kubernetes", " k8s "] },
    TagRule { tag: "ci", needles: &["github actions", "ci pipeline", "continuous integration"] },
];

const ACTIVITY_RULES: &[TagRule] = &[
    TagRule { tag: "debugging", needles: &["stack trace", "debugging", "traceback", "panic at"] },
    TagRule { tag: "testing", needles: &["unit test", "integration test", "test coverage"] },
    TagRule { tag: "refactor", needles: &["refactor", "rewrite", "clean up"] },
    TagRule { tag: "security", needles: &["vulnerability", "cve-", "security fix", "exploit"] },
];

/// Priority order for picking the single "domain" tag, highest first.
const DOMAIN_PRIORITY: &[&str] = &[
    "security",
    "database",
    "cache",
    "containers",
    "ci",
    "debugging",
    "testing",
    "refactor",
    "rust",
    "python",
    "typescript",
    "javascript",
    "go",
];

fn rulebooks() -> [&'static [TagRule]; 3] {
    [LANGUAGE_RULES, INFRASTRUCTURE_RULES, ACTIVITY_RULES]
}

/// Extract tags from `text` via a case-insensitive substring scan against a
/// fixed rulebook. Order of returned tags follows rulebook declaration
/// order, not input position.
pub fn extract_tags(text: &str) -> Vec<String> {
    let haystack = format!(" {} ", text.to_lowercase());
    let mut tags = Vec::new();
    for rulebook in rulebooks() {
        for rule in rulebook {
            if rule.needles.iter().any(|needle| haystack.contains(needle)) {
                tags.push(rule.tag.to_string());
            }
        }
    }
    tags
}

/// The first tag (by priority, not detection order) found in `tags`, used
/// as the record's primary domain classification.
pub fn primary_domain(tags: &[String]) -> Option<String> {
    DOMAIN_PRIORITY
        .iter()
        .find(|candidate| tags.iter().any(|tag| tag == *candidate))
        .map(|tag| tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_language_tag_from_extension() {
        let tags = extract_tags("updated src/main.rs to fix the bug");
        assert!(tags.contains(&"rust".to_string()));
    }

    #[test]
    fn extracts_multiple_tags_across_rulebooks() {
        let tags = extract_tags("added redis cache in front of postgres, wrote a unit test");
        assert!(tags.contains(&"cache".to_string()));
        assert!(tags.contains(&"database".to_string()));
        assert!(tags.contains(&"testing".to_string()));
    }

    #[test]
    fn is_case_insensitive() {
        let tags = extract_tags("Running PYTEST against the suite");
        assert!(tags.contains(&"python".to_string()));
    }

    #[test]
    fn no_match_yields_empty_tags() {
        let tags = extract_tags("just chatting about lunch plans");
        assert!(tags.is_empty());
    }

    #[test]
    fn primary_domain_prefers_highest_priority_tag() {
        let tags = vec!["rust".to_string(), "database".to_string()];
        assert_eq!(primary_domain(&tags), Some("database".to_string()));
    }

    #[test]
    fn primary_domain_is_none_without_tags() {
        assert_eq!(primary_domain(&[]), None);
    }
}
