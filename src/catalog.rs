use std::cmp::Ordering;
use std::path::Path;
use std::sync::LazyLock;

use clap::ValueEnum;
use regex::Regex;
use tracing::{info, warn};

use crate::db;
use crate::model::CatalogRecord;
use crate::snapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortMode {
    Popular,
    Recent,
    Alphabetical,
    Rating,
}

#[derive(Debug, Default)]
pub struct CatalogQuery {
    /// Case-insensitive substring over name/description/author/tags.
    pub query: Option<String>,
    /// Exact category match; None or "All" disables the filter.
    pub category: Option<String>,
    pub sort: Option<SortMode>,
}

/// Read the catalog from the preferred store: the database when present and
/// non-empty, else the local snapshot, else nothing. Source failures are
/// logged, never raised — an empty catalog is defined behavior here.
pub fn load() -> Vec<CatalogRecord> {
    if Path::new(db::DB_PATH).exists() {
        match db::connect().and_then(|conn| db::fetch_all(&conn)) {
            Ok(records) if !records.is_empty() => {
                info!("Loaded {} records from {}", records.len(), db::DB_PATH);
                return records;
            }
            Ok(_) => {}
            Err(e) => warn!("Failed to read {}: {}", db::DB_PATH, e),
        }
    }
    match snapshot::read(snapshot::SNAPSHOT_PATH) {
        Ok(records) => {
            info!("Loaded {} records from {}", records.len(), snapshot::SNAPSHOT_PATH);
            records
        }
        Err(_) => Vec::new(),
    }
}

/// Apply search, category filter, and sort mode. Featured records are
/// always pinned first regardless of the selected mode.
pub fn filter_and_sort(records: &[CatalogRecord], q: &CatalogQuery) -> Vec<CatalogRecord> {
    let needle = q.query.as_deref().unwrap_or("").to_lowercase();
    let sort = q.sort.unwrap_or(SortMode::Popular);

    let mut out: Vec<CatalogRecord> = records
        .iter()
        .filter(|r| {
            let matches_search = needle.is_empty()
                || r.name.to_lowercase().contains(&needle)
                || r.description.to_lowercase().contains(&needle)
                || r.author.to_lowercase().contains(&needle)
                || r.tags.iter().any(|t| t.to_lowercase().contains(&needle));
            let matches_category = match q.category.as_deref() {
                None | Some("All") => true,
                Some(c) => r.category == c,
            };
            matches_search && matches_category
        })
        .cloned()
        .collect();

    out.sort_by(|a, b| {
        b.is_featured
            .cmp(&a.is_featured)
            .then_with(|| match sort {
                // Actual star count, rating as tiebreak.
                SortMode::Popular => b
                    .repo_stars
                    .cmp(&a.repo_stars)
                    .then(cmp_f64(b.rating, a.rating)),
                SortMode::Recent => age_days(a).cmp(&age_days(b)),
                SortMode::Alphabetical => a.name.cmp(&b.name),
                SortMode::Rating => cmp_f64(b.rating, a.rating)
                    .then(b.repo_stars.cmp(&a.repo_stars)),
            })
    });

    out
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn age_days(record: &CatalogRecord) -> i64 {
    // Unparseable phrases sort last, not first.
    parse_relative_days(&record.last_updated).unwrap_or(i64::MAX)
}

static AGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\s+(day|week|month|year)s?\s+ago$").unwrap());

/// Parse a stored relative-age phrase back into days.
pub fn parse_relative_days(phrase: &str) -> Option<i64> {
    let phrase = phrase.trim();
    if phrase == "today" {
        return Some(0);
    }
    let caps = AGE_RE.captures(phrase)?;
    let n: i64 = caps[1].parse().ok()?;
    Some(match &caps[2] {
        "day" => n,
        "week" => n * 7,
        "month" => n * 30,
        _ => n * 365,
    })
}
