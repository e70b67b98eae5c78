use anyhow::Result;
use rusqlite::Connection;

use crate::model::CatalogRecord;

pub const DB_PATH: &str = "data/catalog.sqlite";

pub fn connect() -> Result<Connection> {
    std::fs::create_dir_all("data")?;
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS mcp_servers (
            slug             TEXT PRIMARY KEY,
            id               TEXT NOT NULL,
            name             TEXT NOT NULL,
            description      TEXT NOT NULL,
            long_description TEXT NOT NULL,
            category         TEXT NOT NULL,
            github_url       TEXT NOT NULL,
            npm_package      TEXT,
            author           TEXT NOT NULL,
            repo_stars       INTEGER,
            rating           REAL,
            last_updated     TEXT NOT NULL,
            is_verified      BOOLEAN NOT NULL DEFAULT 0,
            is_featured      BOOLEAN NOT NULL DEFAULT 0,
            tags             TEXT,
            updated_at       TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_servers_category ON mcp_servers(category);
        CREATE INDEX IF NOT EXISTS idx_servers_rank ON mcp_servers(is_featured DESC, repo_stars DESC);
        ",
    )?;
    Ok(())
}

/// Upsert each record keyed by slug. Conflicting rows are fully replaced;
/// rows absent from the current run are left untouched.
pub fn upsert_records(conn: &Connection, records: &[CatalogRecord]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO mcp_servers
             (slug, id, name, description, long_description, category, github_url,
              npm_package, author, repo_stars, rating, last_updated,
              is_verified, is_featured, tags)
             VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15)",
        )?;
        for r in records {
            let tags = serde_json::to_string(&r.tags)?;
            count += stmt.execute(rusqlite::params![
                r.slug,
                r.id,
                r.name,
                r.description,
                r.long_description,
                r.category,
                r.github_url,
                r.npm_package,
                r.author,
                r.repo_stars,
                r.rating,
                r.last_updated,
                r.is_verified,
                r.is_featured,
                tags,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

/// Read the stored catalog, featured first then by stars, matching the
/// persisted rank order.
pub fn fetch_all(conn: &Connection) -> Result<Vec<CatalogRecord>> {
    let mut stmt = conn.prepare(
        "SELECT slug, id, name, description, long_description, category, github_url,
                npm_package, author, repo_stars, rating, last_updated,
                is_verified, is_featured, tags
         FROM mcp_servers
         ORDER BY is_featured DESC, is_verified DESC, repo_stars DESC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            let tags_json: Option<String> = row.get(14)?;
            let tags: Vec<String> = tags_json
                .and_then(|t| serde_json::from_str(&t).ok())
                .unwrap_or_default();
            let is_verified: bool = row.get(12)?;
            let is_featured: bool = row.get(13)?;
            // Provenance (tags[0]) carries the section through the store.
            let (section, is_community) = match tags.first().map(String::as_str) {
                Some("reference") => ("Reference", false),
                Some("official") => ("Official Integrations", false),
                _ => ("Community", true),
            };
            Ok(CatalogRecord {
                slug: row.get(0)?,
                id: row.get(1)?,
                name: row.get(2)?,
                description: row.get(3)?,
                long_description: row.get(4)?,
                category: row.get(5)?,
                github_url: row.get(6)?,
                npm_package: row.get(7)?,
                author: row.get(8)?,
                repo_stars: row.get::<_, Option<i64>>(9)?.unwrap_or(0),
                rating: row.get::<_, Option<f64>>(10)?.unwrap_or(0.0),
                last_updated: row.get(11)?,
                is_verified,
                is_featured,
                is_archived: false,
                is_community,
                section: section.to_string(),
                tags,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count(conn: &Connection) -> Result<usize> {
    Ok(conn.query_row("SELECT COUNT(*) FROM mcp_servers", [], |r| r.get(0))?)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub verified: usize,
    pub featured: usize,
    pub community: usize,
    pub categories: usize,
    pub with_stars: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM mcp_servers", [], |r| r.get(0))?;
    let verified: usize = conn.query_row(
        "SELECT COUNT(*) FROM mcp_servers WHERE is_verified = 1",
        [],
        |r| r.get(0),
    )?;
    let featured: usize = conn.query_row(
        "SELECT COUNT(*) FROM mcp_servers WHERE is_featured = 1",
        [],
        |r| r.get(0),
    )?;
    let categories: usize = conn.query_row(
        "SELECT COUNT(DISTINCT category) FROM mcp_servers",
        [],
        |r| r.get(0),
    )?;
    let with_stars: usize = conn.query_row(
        "SELECT COUNT(*) FROM mcp_servers WHERE repo_stars > 0",
        [],
        |r| r.get(0),
    )?;
    Ok(Stats {
        total,
        verified,
        featured,
        community: total - verified,
        categories,
        with_stars,
    })
}
