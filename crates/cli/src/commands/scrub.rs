//! `contextd scrub [file|-]` — runs the ingest scrubber over a file's
//! contents (or stdin when the argument is `-`) and prints the `§4.5`
//! `{scrubbed_text, findings_count}` result as JSON.

use std::io::Read;

use anyhow::{Context, Result};
use contextd_scrubber::scrub_ingest;

pub async fn run(input: &str) -> Result<()> {
    let content = if input == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(input).with_context(|| format!("failed to read {input}"))?
    };

    let result = scrub_ingest(&content);
    println!(
        "{}",
        serde_json::json!({
            "content": result.scrubbed_text,
            "findings_count": result.findings_count,
        })
    );
    Ok(())
}
