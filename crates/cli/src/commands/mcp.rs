//! `contextd mcp {install|uninstall|status}` — registers `contextd-mcp` as
//! a stdio MCP server in the host's `~/.claude.json` `mcpServers` table
//! (§6: "integrate with an agent host"). Never touches any other key in
//! that file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::{json, Value};

const SERVER_NAME: &str = "contextd";

fn host_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    Ok(home.join(".claude.json"))
}

fn load_host_config(path: &PathBuf) -> Result<Value> {
    if !path.exists() {
        return Ok(json!({}));
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {} as JSON", path.display()))
}

fn save_host_config(path: &PathBuf, value: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, rendered).with_context(|| format!("failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path).with_context(|| format!("failed to replace {}", path.display()))
}

pub async fn install() -> Result<()> {
    let path = host_config_path()?;
    let mut config = load_host_config(&path)?;

    let contextd_binary = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|dir| dir.join("contextd-mcp")))
        .filter(|p| p.exists())
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "contextd-mcp".to_string());

    let entry = json!({
        "command": contextd_binary,
        "args": [],
    });

    let servers = config
        .as_object_mut()
        .context("host config root is not a JSON object")?
        .entry("mcpServers")
        .or_insert_with(|| json!({}));
    servers
        .as_object_mut()
        .context("mcpServers is not a JSON object")?
        .insert(SERVER_NAME.to_string(), entry);

    save_host_config(&path, &config)?;
    println!("installed '{SERVER_NAME}' into {}", path.display());
    Ok(())
}

pub async fn uninstall() -> Result<()> {
    let path = host_config_path()?;
    let mut config = load_host_config(&path)?;

    let removed = config
        .get_mut("mcpServers")
        .and_then(|servers| servers.as_object_mut())
        .map(|servers| servers.remove(SERVER_NAME).is_some())
        .unwrap_or(false);

    if removed {
        save_host_config(&path, &config)?;
        println!("removed '{SERVER_NAME}' from {}", path.display());
    } else {
        println!("'{SERVER_NAME}' was not installed in {}", path.display());
    }
    Ok(())
}

pub async fn status() -> Result<()> {
    let path = host_config_path()?;
    let config = load_host_config(&path)?;
    let installed = config
        .get("mcpServers")
        .and_then(|servers| servers.get(SERVER_NAME))
        .is_some();
    println!("{}", json!({ "installed": installed, "config_path": path.display().to_string() }));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_then_uninstall_round_trips_through_a_fresh_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".claude.json");

        let mut config = load_host_config(&path).unwrap();
        assert_eq!(config, json!({}));

        let entry = json!({ "command": "contextd-mcp", "args": [] });
        config
            .as_object_mut()
            .unwrap()
            .entry("mcpServers")
            .or_insert_with(|| json!({}))
            .as_object_mut()
            .unwrap()
            .insert(SERVER_NAME.to_string(), entry);
        save_host_config(&path, &config).unwrap();

        let reloaded = load_host_config(&path).unwrap();
        assert!(reloaded["mcpServers"][SERVER_NAME].is_object());

        let mut config = reloaded;
        config["mcpServers"]
            .as_object_mut()
            .unwrap()
            .remove(SERVER_NAME);
        save_host_config(&path, &config).unwrap();

        let reloaded = load_host_config(&path).unwrap();
        assert!(reloaded["mcpServers"].get(SERVER_NAME).is_none());
    }

    #[test]
    fn missing_config_file_loads_as_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.json");
        assert_eq!(load_host_config(&path).unwrap(), json!({}));
    }
}
