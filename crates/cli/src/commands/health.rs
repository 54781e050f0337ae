//! `contextd health` — read-only collection health scan (§4.1, §8 invariant
//! 5: every collection directory is exactly one of healthy/corrupt/empty/
//! quarantined). Never repairs anything; that's `metadata recover`/
//! `metadata quarantine restore`.

use anyhow::Result;
use contextd_vector_store::VectorStore;

use crate::config::Config;

pub async fn run(config: &Config) -> Result<()> {
    let store = VectorStore::open(config.data_dir.clone()).await?;
    let report = store.health_scan().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    if report.total_unhealthy() > 0 {
        std::process::exit(1);
    }
    Ok(())
}
