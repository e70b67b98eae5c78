use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::model::{rating_for, truncate_chars, CatalogRecord};
use crate::repo;

const API_BASE: &str = "https://api.github.com/repos";
const USER_AGENT: &str = "mcp_catalog";

// Two external quota tiers: authenticated callers may pace much faster.
const PACING_AUTH_MS: u64 = 100;
const PACING_ANON_MS: u64 = 1200;
const FETCH_LIMIT_AUTH: usize = 200;
const FETCH_LIMIT_ANON: usize = 50;

pub const CACHE_TTL_SECS: i64 = 60 * 60;
pub const CACHE_PATH: &str = "data/star_cache.json";

/// Live repository metadata from the hosting API.
#[derive(Debug, Clone)]
pub struct RepoMetadata {
    pub stars: i64,
    pub updated_at: DateTime<Utc>,
    pub description: String,
}

#[derive(Debug, Error)]
pub enum FetchError {
    /// The API signaled quota exhaustion; the whole batch must stop.
    #[error("rate limit exhausted")]
    Quota,
    /// Any other failure; affects a single entry only.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Seam between the enrichment loop and the network, so the loop's
/// quota/fallback behavior is testable without reaching the API.
#[allow(async_fn_in_trait)]
pub trait StarSource {
    async fn fetch(&self, owner: &str, repo: &str) -> Result<RepoMetadata, FetchError>;
}

// ── GitHub client ──

#[derive(Deserialize)]
struct RepoResponse {
    stargazers_count: i64,
    updated_at: DateTime<Utc>,
    description: Option<String>,
}

pub struct GitHubSource {
    client: reqwest::Client,
    token: Option<String>,
}

impl GitHubSource {
    /// Token comes from GITHUB_TOKEN; its presence changes only the pacing
    /// and batch size, never correctness.
    pub fn from_env() -> Self {
        let token = std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty());
        GitHubSource {
            client: reqwest::Client::new(),
            token,
        }
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Delay inserted between consecutive lookups.
    pub fn pacing(&self) -> Duration {
        if self.has_token() {
            Duration::from_millis(PACING_AUTH_MS)
        } else {
            Duration::from_millis(PACING_ANON_MS)
        }
    }

    /// How many records to enrich by default in one run.
    pub fn fetch_limit(&self) -> usize {
        if self.has_token() {
            FETCH_LIMIT_AUTH
        } else {
            FETCH_LIMIT_ANON
        }
    }
}

impl StarSource for GitHubSource {
    async fn fetch(&self, owner: &str, repo: &str) -> Result<RepoMetadata, FetchError> {
        let url = format!("{}/{}/{}", API_BASE, owner, repo);
        let mut req = self
            .client
            .get(&url)
            .header(reqwest::header::USER_AGENT, USER_AGENT);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.map_err(|e| FetchError::Other(e.into()))?;
        let status = resp.status();
        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::Quota);
        }
        if !status.is_success() {
            return Err(FetchError::Other(anyhow!("GET {} returned {}", url, status)));
        }
        let body: RepoResponse = resp.json().await.map_err(|e| FetchError::Other(e.into()))?;
        Ok(RepoMetadata {
            stars: body.stargazers_count,
            updated_at: body.updated_at,
            description: body.description.unwrap_or_default(),
        })
    }
}

// ── TTL cache ──

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedLookup {
    stars: i64,
    updated_at: DateTime<Utc>,
    description: String,
    fetched_at: DateTime<Utc>,
}

/// Successful lookups cached by the record's original source URL (not the
/// normalized ref). Read-before-write per key, last-writer-wins; staleness
/// within the TTL is acceptable by design.
pub struct StarCache {
    entries: HashMap<String, CachedLookup>,
    ttl: chrono::Duration,
}

impl StarCache {
    pub fn new(ttl_secs: i64) -> Self {
        StarCache {
            entries: HashMap::new(),
            ttl: chrono::Duration::seconds(ttl_secs),
        }
    }

    /// A missing or corrupt cache file loads as an empty cache.
    pub fn load(path: impl AsRef<Path>, ttl_secs: i64) -> Self {
        let mut cache = Self::new(ttl_secs);
        cache.entries = std::fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        cache
    }

    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        if let Some(dir) = path.as_ref().parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_string(&self.entries)?)?;
        Ok(())
    }

    pub fn get(&self, url: &str, now: DateTime<Utc>) -> Option<RepoMetadata> {
        let hit = self.entries.get(url)?;
        if now - hit.fetched_at >= self.ttl {
            return None;
        }
        Some(RepoMetadata {
            stars: hit.stars,
            updated_at: hit.updated_at,
            description: hit.description.clone(),
        })
    }

    pub fn put(&mut self, url: &str, meta: &RepoMetadata, now: DateTime<Utc>) {
        self.entries.insert(
            url.to_string(),
            CachedLookup {
                stars: meta.stars,
                updated_at: meta.updated_at,
                description: meta.description.clone(),
                fetched_at: now,
            },
        );
    }
}

// ── Batch enrichment ──

#[derive(Debug, Default)]
pub struct EnrichStats {
    pub attempted: usize,
    pub fetched: usize,
    pub cache_hits: usize,
    pub errors: usize,
    pub quota_hit: bool,
}

/// Enrich the first `max` records in place, strictly sequentially with a
/// pacing delay between lookups.
///
/// A quota signal stops the loop for the rest of the run; remaining records
/// keep their fallback values. Any other fetch error falls back to zero
/// stars for that entry only and the loop continues.
pub async fn enrich_records<S: StarSource>(
    records: &mut [CatalogRecord],
    source: &S,
    cache: &mut StarCache,
    max: usize,
    delay: Duration,
) -> EnrichStats {
    let limit = max.min(records.len());
    let mut stats = EnrichStats::default();

    let pb = ProgressBar::new(limit as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
            .unwrap()
            .progress_chars("=> "),
    );

    for i in 0..limit {
        stats.attempted += 1;
        let now = Utc::now();
        let record = &mut records[i];

        if let Some(meta) = cache.get(&record.github_url, now) {
            apply_metadata(record, &meta, now);
            stats.cache_hits += 1;
            pb.inc(1);
            continue;
        }

        let Some(repo) = repo::normalize(&record.github_url) else {
            pb.inc(1);
            continue;
        };

        match source.fetch(&repo.owner, &repo.repo).await {
            Ok(meta) => {
                apply_metadata(record, &meta, now);
                cache.put(&record.github_url, &meta, now);
                stats.fetched += 1;
            }
            Err(FetchError::Quota) => {
                warn!(
                    "Hit rate limit after {} lookups; remaining entries keep fallback star counts",
                    stats.fetched
                );
                stats.quota_hit = true;
                break;
            }
            Err(FetchError::Other(e)) => {
                warn!("Failed to fetch {}/{}: {}", repo.owner, repo.repo, e);
                stats.errors += 1;
                record.repo_stars = 0;
                record.last_updated = relative_age_phrase(now, now);
            }
        }

        pb.inc(1);
        if i + 1 < limit {
            tokio::time::sleep(delay).await;
        }
    }

    pb.finish_and_clear();
    stats
}

/// Fold fetched metadata into a record: stars, relative age, a deterministic
/// rating refresh for community entries, and the description only when the
/// parsed one was empty or the generated placeholder.
fn apply_metadata(record: &mut CatalogRecord, meta: &RepoMetadata, now: DateTime<Utc>) {
    record.repo_stars = meta.stars;
    record.last_updated = relative_age_phrase(meta.updated_at, now);
    if !record.is_verified {
        record.rating = rating_for(false, meta.stars);
    }
    let placeholder = format!("{} MCP server", record.name);
    if (record.description.is_empty() || record.description == placeholder)
        && !meta.description.is_empty()
    {
        record.description = truncate_chars(&meta.description, 150);
        record.long_description = truncate_chars(&meta.description, 300);
    }
}

/// "today", "1 day ago", "3 days ago", "2 weeks ago", "4 months ago",
/// "1 years ago" — the phrase shape the catalog stores and the consumer
/// parses back.
pub fn relative_age_phrase(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let days = (now - then).num_days().max(0);
    match days {
        0 => "today".to_string(),
        1 => "1 day ago".to_string(),
        d if d < 7 => format!("{} days ago", d),
        d if d < 30 => format!("{} weeks ago", d / 7),
        d if d < 365 => format!("{} months ago", d / 30),
        d => format!("{} years ago", d / 365),
    }
}
