use serde::{Deserialize, Serialize};

/// One normalized entry in the final catalog, as persisted and displayed.
/// Serialized field names match the app's JSON snapshot shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecord {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub long_description: String,
    pub category: String,
    pub github_url: String,
    #[serde(default)]
    pub npm_package: Option<String>,
    pub author: String,
    pub repo_stars: i64,
    pub rating: f64,
    pub last_updated: String,
    pub is_verified: bool,
    pub is_featured: bool,
    pub is_archived: bool,
    pub is_community: bool,
    pub section: String,
    pub tags: Vec<String>,
}

/// Derive the unique slug for a display name: lower-cased, runs of
/// non-alphanumerics collapsed to a single hyphen, outer hyphens trimmed.
/// Pure and idempotent; this is the dedupe/upsert key.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending && !out.is_empty() {
                out.push('-');
            }
            pending = false;
            out.push(c.to_ascii_lowercase());
        } else {
            pending = true;
        }
    }
    out
}

/// Truncate to at most `max` characters (not bytes).
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Rating without any random draw: verified entries hold 4.5, community
/// entries climb from 3.5 with star count, capped at 5.0. Unenriched
/// community entries keep the parse-time default of 4.0.
pub fn rating_for(is_verified: bool, stars: i64) -> f64 {
    if is_verified {
        4.5
    } else if stars > 0 {
        (3.5 + (stars as f64).log10() / 2.0).min(5.0)
    } else {
        4.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_collapses_and_trims() {
        assert_eq!(slugify("Google Drive!!"), "google-drive");
        assert_eq!(slugify("  a__b  "), "a-b");
        assert_eq!(slugify("PostgreSQL"), "postgresql");
    }

    #[test]
    fn slug_is_idempotent() {
        let once = slugify("Brave Search (official)");
        assert_eq!(slugify(&once), once);
    }

    #[test]
    fn truncate_counts_chars() {
        assert_eq!(truncate_chars("héllo wörld", 5), "héllo");
        assert_eq!(truncate_chars("short", 150), "short");
    }

    #[test]
    fn rating_is_deterministic_and_bounded() {
        assert_eq!(rating_for(true, 0), 4.5);
        assert_eq!(rating_for(true, 100_000), 4.5);
        assert_eq!(rating_for(false, 0), 4.0);
        // 10 stars -> 3.5 + 1/2 = 4.0
        assert!((rating_for(false, 10) - 4.0).abs() < 1e-9);
        // 1000 stars -> 3.5 + 1.5 = 5.0, and never above
        assert_eq!(rating_for(false, 1_000), 5.0);
        assert_eq!(rating_for(false, 10_000_000), 5.0);
        assert!(rating_for(false, 1) >= 3.5);
    }
}
