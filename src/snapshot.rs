use std::path::Path;

use anyhow::{Context, Result};

use crate::model::CatalogRecord;

/// Capped catalog consumed by the app.
pub const SNAPSHOT_PATH: &str = "data/catalog.json";
/// Full enriched set, kept for reference and debugging.
pub const FULL_SNAPSHOT_PATH: &str = "data/catalog_full.json";

/// Serialize the ranked sequence as a JSON array, order preserved,
/// overwriting any prior snapshot.
pub fn write(path: impl AsRef<Path>, records: &[CatalogRecord]) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
    Ok(())
}

pub fn read(path: impl AsRef<Path>) -> Result<Vec<CatalogRecord>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Malformed snapshot {}", path.display()))
}
