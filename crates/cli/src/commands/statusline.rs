//! `contextd statusline {run|install|uninstall|test}` (§4.8, §6). `run`
//! emits the one-line summary a host renders verbatim; `install`/
//! `uninstall` wire that into the host's `~/.claude/settings.json`
//! `statusLine` key, the same read-modify-write shape `mcp install` uses
//! for `~/.claude.json`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use contextd_statusline::{StatuslineSnapshot, StatuslineService, UNKNOWN_COUNT};
use contextd_vector_store::VectorStore;
use serde_json::{json, Value};

use crate::commands::resolve_tenant;
use crate::config::Config;

const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";
const DOT: &str = " \x1b[2m\u{b7}\x1b[0m ";

/// Render a snapshot as the single line a host status bar displays.
/// Unknown counts (`UNKNOWN_COUNT`) render as `?`, never as `-1` or `0`.
pub fn format_line(snapshot: &StatuslineSnapshot) -> String {
    let fmt_count = |n: i64| if n == UNKNOWN_COUNT { "?".to_string() } else { n.to_string() };

    let mut parts = vec![
        format!("{DIM}contextd{RESET}"),
        format!("{} checkpoints", fmt_count(snapshot.checkpoints)),
        format!("{} memories", fmt_count(snapshot.memories)),
    ];
    if let Some(pct) = snapshot.context_usage_percent {
        parts.push(format!("ctx {pct:.0}%"));
    }
    if let Some(conf) = snapshot.last_confidence {
        parts.push(format!("conf {conf:.2}"));
    }
    parts.join(DOT)
}

pub async fn run(config: &Config) -> Result<()> {
    let tenant = resolve_tenant(config)?;
    let store = Arc::new(VectorStore::open(config.data_dir.clone()).await?);
    let service = StatuslineService::new(store, config.embedding.dimension);
    let snapshot = service.snapshot(&tenant).await;
    println!("{}", format_line(&snapshot));
    Ok(())
}

pub async fn test(config: &Config) -> Result<()> {
    let snapshot = StatuslineSnapshot {
        checkpoints: 3,
        memories: 12,
        context_usage_percent: Some(42.0),
        ..StatuslineSnapshot::default()
    };
    println!("{}", format_line(&snapshot));
    let _ = config;
    Ok(())
}

fn settings_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".claude").join("settings.json"))
}

fn load_settings(path: &PathBuf) -> Result<Value> {
    if !path.exists() {
        return Ok(json!({}));
    }
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {} as JSON", path.display()))
}

fn save_settings(path: &PathBuf, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let rendered = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, rendered).with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("failed to replace {}", path.display()))
}

pub async fn install() -> Result<()> {
    let path = settings_path()?;
    let mut settings = load_settings(&path)?;

    let contextd_binary = std::env::current_exe()
        .ok()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "contextd".to_string());

    settings
        .as_object_mut()
        .context("settings root is not a JSON object")?
        .insert(
            "statusLine".to_string(),
            json!({ "type": "command", "command": format!("{contextd_binary} statusline run") }),
        );

    save_settings(&path, &settings)?;
    println!("installed statusline into {}", path.display());
    Ok(())
}

pub async fn uninstall() -> Result<()> {
    let path = settings_path()?;
    let mut settings = load_settings(&path)?;
    let removed = settings
        .as_object_mut()
        .map(|obj| obj.remove("statusLine").is_some())
        .unwrap_or(false);

    if removed {
        save_settings(&path, &settings)?;
        println!("removed statusline from {}", path.display());
    } else {
        println!("statusline was not installed in {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_counts_render_as_question_marks_not_negative_one_or_zero() {
        let snapshot = StatuslineSnapshot::default();
        let line = format_line(&snapshot);
        assert!(line.contains("? checkpoints"));
        assert!(line.contains("? memories"));
        assert!(!line.contains('-'));
    }

    #[test]
    fn known_counts_and_context_usage_render_in_line() {
        let snapshot = StatuslineSnapshot {
            checkpoints: 3,
            memories: 12,
            context_usage_percent: Some(42.3),
            ..StatuslineSnapshot::default()
        };
        let line = format_line(&snapshot);
        assert!(line.contains("3 checkpoints"));
        assert!(line.contains("12 memories"));
        assert!(line.contains("ctx 42%"));
    }

    #[test]
    fn install_then_uninstall_round_trips_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");

        let mut settings = load_settings(&path).unwrap();
        settings
            .as_object_mut()
            .unwrap()
            .insert("statusLine".to_string(), json!({ "type": "command", "command": "contextd statusline run" }));
        save_settings(&path, &settings).unwrap();

        let reloaded = load_settings(&path).unwrap();
        assert!(reloaded.get("statusLine").is_some());

        let mut settings = reloaded;
        settings.as_object_mut().unwrap().remove("statusLine");
        save_settings(&path, &settings).unwrap();

        let reloaded = load_settings(&path).unwrap();
        assert!(reloaded.get("statusLine").is_none());
    }
}
