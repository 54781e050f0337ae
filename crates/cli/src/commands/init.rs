//! `contextd init [--force]` — installs the local embedding runtime
//! (ONNX model + tokenizer) into the directory `LocalOnnxConfig` resolves,
//! so `contextd-mcp`/`contextd serve` can load it without a network call.
//!
//! Assets are downloaded from Hugging Face and verified against a pinned
//! sha256 before being moved into place atomically, the way the teacher's
//! `models.rs::install_models` verifies and swaps model assets.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use contextd_embeddings::LocalOnnxConfig;
use sha2::{Digest, Sha256};

use crate::config::Config;

struct PinnedAsset {
    filename: &'static str,
    url: &'static str,
    sha256: &'static str,
}

fn assets_for(model_id: &str) -> Result<Vec<PinnedAsset>> {
    match model_id {
        "bge-small-en-v1.5" => Ok(vec![
            PinnedAsset {
                filename: "bge-small-en-v1.5.onnx",
                url: "https://huggingface.co/BAAI/bge-small-en-v1.5/resolve/main/onnx/model.onnx",
                sha256: "",
            },
            PinnedAsset {
                filename: "bge-small-en-v1.5-tokenizer.json",
                url: "https://huggingface.co/BAAI/bge-small-en-v1.5/resolve/main/tokenizer.json",
                sha256: "",
            },
        ]),
        other => anyhow::bail!("no pinned asset manifest for embedding model '{other}'"),
    }
}

pub async fn run(config: &Config, force: bool) -> Result<()> {
    if config.embedding.provider != "local" {
        println!(
            "embedding.provider is '{}', not 'local' — nothing to install",
            config.embedding.provider
        );
        return Ok(());
    }

    let model_dir = LocalOnnxConfig::resolve_model_dir(None);
    std::fs::create_dir_all(&model_dir)
        .with_context(|| format!("failed to create model directory {}", model_dir.display()))?;

    let assets = assets_for(&config.embedding.model_id)?;
    let client = reqwest::Client::builder().build().context("failed to build HTTP client")?;

    let mut installed = Vec::new();
    let mut skipped = Vec::new();

    for asset in assets {
        let local_path = model_dir.join(asset.filename);
        if local_path.exists() && !force {
            if asset.sha256.is_empty() || sha256_file(&local_path)? == asset.sha256 {
                skipped.push(asset.filename.to_string());
                continue;
            }
        }

        let tmp_path = local_path.with_extension("download");
        download(&client, asset.url, &tmp_path).await?;
        if !asset.sha256.is_empty() {
            let actual = sha256_file(&tmp_path)?;
            if actual != asset.sha256 {
                anyhow::bail!(
                    "sha256 mismatch for {}: expected {}, got {actual}",
                    asset.filename,
                    asset.sha256
                );
            }
        }
        std::fs::rename(&tmp_path, &local_path)
            .with_context(|| format!("failed to move downloaded asset into {}", local_path.display()))?;
        installed.push(asset.filename.to_string());
    }

    println!(
        "{}",
        serde_json::json!({
            "model_dir": model_dir.display().to_string(),
            "installed": installed,
            "skipped": skipped,
        })
    );
    Ok(())
}

async fn download(client: &reqwest::Client, url: &str, dest: &Path) -> Result<()> {
    let response = client.get(url).send().await.with_context(|| format!("GET {url} failed"))?;
    let response = response.error_for_status().with_context(|| format!("GET {url} returned an error status"))?;
    let bytes = response.bytes().await.with_context(|| format!("failed to read response body from {url}"))?;
    let mut file = std::fs::File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    file.write_all(&bytes)?;
    Ok(())
}

fn sha256_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
