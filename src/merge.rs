use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use crate::category::categorize;
use crate::model::{rating_for, slugify, truncate_chars, CatalogRecord};
use crate::parser::{RawEntry, Section};
use crate::repo;

/// The shipped catalog keeps only the top-ranked prefix; the full enriched
/// set is persisted separately for reference.
pub const CATALOG_CAP: usize = 300;

static MONOREPO_DIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"github\.com/modelcontextprotocol/servers/(?:tree|blob)/main/src/([A-Za-z0-9_-]+)")
        .unwrap()
});

#[derive(Debug, Default)]
pub struct MergeStats {
    pub parsed: usize,
    pub archived: usize,
    pub dropped_urls: usize,
    pub deduped: usize,
    pub unique: usize,
}

impl MergeStats {
    pub fn print(&self) {
        println!(
            "Merged {} entries into {} records ({} archived, {} bad URLs, {} duplicates)",
            self.parsed + self.archived,
            self.unique,
            self.archived,
            self.dropped_urls,
            self.deduped,
        );
    }
}

/// Turn parsed entries into deduplicated catalog records, document order
/// preserved.
///
/// Archived entries are excluded up front. When two entries share a slug the
/// later one wins unless the earlier came from a higher-priority section
/// (Reference > Official Integrations > Community).
pub fn build_records(entries: &[RawEntry]) -> (Vec<CatalogRecord>, MergeStats) {
    let mut stats = MergeStats::default();
    let mut merged: Vec<(CatalogRecord, u8)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        if entry.section == Section::Archived {
            stats.archived += 1;
            continue;
        }
        stats.parsed += 1;

        let Some(repo_ref) = repo::normalize(&entry.url) else {
            warn!("Skipping {}: cannot parse owner/repo from {}", entry.name, entry.url);
            stats.dropped_urls += 1;
            continue;
        };

        let record = build_record(entry, &repo_ref.owner);
        let priority = entry.section.priority();
        match index.get(&record.slug) {
            Some(&i) => {
                stats.deduped += 1;
                if priority >= merged[i].1 {
                    merged[i] = (record, priority);
                }
            }
            None => {
                index.insert(record.slug.clone(), merged.len());
                merged.push((record, priority));
            }
        }
    }

    let records: Vec<CatalogRecord> = merged.into_iter().map(|(r, _)| r).collect();
    stats.unique = records.len();
    (records, stats)
}

fn build_record(entry: &RawEntry, author: &str) -> CatalogRecord {
    let slug = slugify(&entry.name);
    let category = categorize(&entry.name, &entry.description);
    let section = entry.section;

    let (description, long_description) = if entry.description.is_empty() {
        let placeholder = format!("{} MCP server", entry.name);
        (placeholder.clone(), placeholder)
    } else {
        (
            truncate_chars(&entry.description, 150),
            truncate_chars(&entry.description, 300),
        )
    };

    let tags: Vec<String> = [
        section.provenance().to_string(),
        category.to_lowercase(),
        entry.name.to_lowercase(),
    ]
    .into_iter()
    .filter(|t| !t.is_empty())
    .collect();

    CatalogRecord {
        id: slug.clone(),
        name: entry.name.clone(),
        slug,
        description,
        long_description,
        category: category.to_string(),
        github_url: entry.url.clone(),
        npm_package: derive_npm_package(&entry.url),
        author: author.to_string(),
        repo_stars: 0,
        rating: rating_for(section.is_verified(), 0),
        last_updated: "1 week ago".to_string(),
        is_verified: section.is_verified(),
        is_featured: section.is_featured(),
        is_archived: false,
        is_community: section == Section::Community,
        section: section.label().to_string(),
        tags,
    }
}

/// Entries living in the official monorepo ship as scoped npm packages named
/// after their source directory.
fn derive_npm_package(url: &str) -> Option<String> {
    MONOREPO_DIR_RE
        .captures(url)
        .map(|c| format!("@modelcontextprotocol/server-{}", &c[1]))
}

/// Enrichment order: featured first, then verified, then the rest. Stable,
/// so document order breaks ties within each band.
pub fn prioritize(records: &mut [CatalogRecord]) {
    records.sort_by_key(|r| (!r.is_featured, !r.is_verified));
}

/// Final ranking: featured, then verified, then descending stars. The sort
/// is stable, so star ties preserve prior relative order.
pub fn rank(records: &mut [CatalogRecord]) {
    records.sort_by(|a, b| {
        b.is_featured
            .cmp(&a.is_featured)
            .then(b.is_verified.cmp(&a.is_verified))
            .then(b.repo_stars.cmp(&a.repo_stars))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_document;

    fn fixture_records() -> (Vec<CatalogRecord>, MergeStats) {
        let md = std::fs::read_to_string("tests/fixtures/readme.md").unwrap();
        build_records(&parse_document(&md))
    }

    #[test]
    fn archived_excluded_before_merge() {
        let (records, stats) = fixture_records();
        assert_eq!(stats.archived, 2);
        assert!(records.iter().all(|r| !r.is_archived));
        assert!(records.iter().all(|r| r.slug != "sqlite" && r.slug != "google-drive"));
    }

    #[test]
    fn dedupe_keeps_higher_priority_section() {
        let (records, stats) = fixture_records();
        assert_eq!(stats.deduped, 1);
        let everything: Vec<_> = records.iter().filter(|r| r.slug == "everything").collect();
        assert_eq!(everything.len(), 1);
        // The Reference copy's trust flags survive the Community duplicate.
        assert!(everything[0].is_verified);
        assert!(everything[0].is_featured);
        assert_eq!(everything[0].tags[0], "reference");
    }

    #[test]
    fn later_entry_wins_at_equal_priority() {
        let md = "\
### 🌍 Community Servers
- [Weather](https://github.com/first-author/weather-mcp) - First listing
- [Weather](https://github.com/second-author/weather-mcp) - Second listing
";
        let (records, stats) = build_records(&parse_document(md));
        assert_eq!(stats.deduped, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].author, "second-author");
        assert_eq!(records[0].description, "Second listing");
    }

    #[test]
    fn derived_fields() {
        let (records, _) = fixture_records();
        let fetch = records.iter().find(|r| r.slug == "fetch").unwrap();
        assert_eq!(fetch.author, "modelcontextprotocol");
        assert_eq!(
            fetch.npm_package.as_deref(),
            Some("@modelcontextprotocol/server-fetch")
        );
        assert_eq!(fetch.section, "Reference");
        assert_eq!(fetch.tags.last().unwrap(), "fetch");
        assert!((fetch.rating - 4.5).abs() < 1e-9);

        let grafana = records.iter().find(|r| r.slug == "grafana").unwrap();
        assert!(grafana.is_verified && !grafana.is_featured);
        assert_eq!(grafana.npm_package, None);
        assert_eq!(grafana.tags[0], "official");

        let postgres = records.iter().find(|r| r.slug == "postgresql").unwrap();
        assert!(postgres.is_community && !postgres.is_verified);
        assert_eq!(postgres.author, "community-dev");
        assert!((postgres.rating - 4.0).abs() < 1e-9);
    }

    #[test]
    fn missing_description_gets_placeholder() {
        let md = "\
## 🌟 Reference Servers
- [Git](https://github.com/modelcontextprotocol/servers/tree/main/src/git)
";
        let (records, _) = build_records(&parse_document(md));
        assert_eq!(records[0].description, "Git MCP server");
        assert_eq!(records[0].long_description, "Git MCP server");
    }

    #[test]
    fn long_descriptions_are_prefix_truncated() {
        let long = "x".repeat(400);
        let md = format!(
            "### 🌍 Community Servers\n- [Big](https://github.com/a/big) - {}\n",
            long
        );
        let (records, _) = build_records(&parse_document(&md));
        assert_eq!(records[0].description.chars().count(), 150);
        assert_eq!(records[0].long_description.chars().count(), 300);
    }

    #[test]
    fn unparseable_url_dropped_and_counted() {
        let md = "\
### 🌍 Community Servers
- [Broken](https://github.com/onlyowner) - No repo segment
- [Fine](https://github.com/a/b) - Works
";
        let (records, stats) = build_records(&parse_document(md));
        assert_eq!(stats.dropped_urls, 1);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].slug, "fine");
    }

    #[test]
    fn rank_puts_featured_then_verified_before_stars() {
        let mk = |slug: &str, featured: bool, verified: bool, stars: i64| {
            let mut r = build_record(
                &RawEntry {
                    name: slug.to_string(),
                    url: format!("https://github.com/o/{}", slug),
                    description: String::new(),
                    section: Section::Community,
                },
                "o",
            );
            r.is_featured = featured;
            r.is_verified = verified;
            r.repo_stars = stars;
            r
        };
        let mut records = vec![
            mk("verified", false, true, 10),
            mk("featured", true, false, 1),
            mk("plain", false, false, 100),
        ];
        rank(&mut records);
        let order: Vec<&str> = records.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(order, vec!["featured", "verified", "plain"]);
    }

    #[test]
    fn rank_is_stable_on_star_ties() {
        let mk = |slug: &str| RawEntry {
            name: slug.to_string(),
            url: format!("https://github.com/o/{}", slug),
            description: String::new(),
            section: Section::Community,
        };
        let (mut records, _) =
            build_records(&[mk("alpha"), mk("beta"), mk("gamma")]);
        rank(&mut records);
        let order: Vec<&str> = records.iter().map(|r| r.slug.as_str()).collect();
        assert_eq!(order, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn prioritize_bands() {
        let (mut records, _) = fixture_records();
        prioritize(&mut records);
        let featured = records.iter().take_while(|r| r.is_featured).count();
        assert_eq!(featured, 3); // fetch, filesystem, everything
        assert!(records[featured..].iter().all(|r| !r.is_featured));
        let verified_band = records[featured..]
            .iter()
            .take_while(|r| r.is_verified)
            .count();
        assert_eq!(verified_band, 2); // agentql, grafana
        assert!(records[featured + verified_band..].iter().all(|r| !r.is_verified));
    }
}
