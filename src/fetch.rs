use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

pub const README_URL: &str =
    "https://raw.githubusercontent.com/modelcontextprotocol/servers/main/README.md";
pub const README_PATH: &str = "data/README.md";

/// Download the upstream README and save it for offline parsing.
pub async fn download_readme(url: &str, out: &str) -> Result<usize> {
    let client = reqwest::Client::new();

    info!("Fetching README: {}", url);
    let text = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
        .context("Failed to fetch README")?;

    if let Some(dir) = Path::new(out).parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(out, &text).with_context(|| format!("Failed to write {}", out))?;

    Ok(text.lines().count())
}
