mod catalog;
mod category;
mod db;
mod enrich;
mod fetch;
mod merge;
mod model;
mod parser;
mod repo;
mod snapshot;

use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use catalog::SortMode;

#[derive(Parser)]
#[command(name = "mcp_catalog", about = "MCP server catalog scraper (official README -> ranked dataset)")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the upstream README
    Fetch {
        #[arg(long, default_value = fetch::README_URL)]
        url: String,
        #[arg(long, default_value = fetch::README_PATH)]
        out: String,
    },
    /// Parse the README and report what a run would ingest (no network)
    Parse {
        #[arg(short, long, default_value = fetch::README_PATH)]
        input: String,
    },
    /// Full pipeline: parse, enrich, rank, persist
    Run {
        #[arg(short, long, default_value = fetch::README_PATH)]
        input: String,
        /// Max repositories to enrich (default: 200 with a token, 50 without)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Catalog size cap after ranking
        #[arg(long, default_value_t = merge::CATALOG_CAP)]
        cap: usize,
    },
    /// Browse the persisted catalog
    Overview {
        /// Substring search over name/description/author/tags
        #[arg(short, long)]
        query: Option<String>,
        /// Exact category filter (e.g. "Database")
        #[arg(short, long)]
        category: Option<String>,
        #[arg(short, long, value_enum, default_value_t = SortMode::Popular)]
        sort: SortMode,
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Show persisted-store statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fetch { url, out } => {
            let lines = fetch::download_readme(&url, &out).await?;
            println!("Saved {} lines to {}", lines, out);
            Ok(())
        }
        Commands::Parse { input } => {
            let text = read_input(&input)?;
            let entries = parser::parse_document(&text);
            let (records, stats) = merge::build_records(&entries);
            stats.print();
            print_tier_counts(&records);
            print_category_counts(&records);
            Ok(())
        }
        Commands::Run { input, limit, cap } => run_pipeline(&input, limit, cap).await,
        Commands::Overview {
            query,
            category,
            sort,
            limit,
        } => {
            let records = catalog::load();
            if records.is_empty() {
                println!("No catalog data. Run 'fetch' then 'run' first.");
                return Ok(());
            }
            let total = records.len();
            let q = catalog::CatalogQuery {
                query,
                category,
                sort: Some(sort),
            };
            let matched = catalog::filter_and_sort(&records, &q);
            if matched.is_empty() {
                println!("No servers match the current filters ({} in catalog).", total);
                return Ok(());
            }

            println!(
                "{:>3} | {:<28} | {:<14} | {:>7} | {:>6} | {:<14} | {:<9}",
                "#", "Server", "Category", "Stars", "Rating", "Updated", "Tier"
            );
            println!("{}", "-".repeat(100));
            for (i, r) in matched.iter().take(limit).enumerate() {
                let tier = r.tags.first().map(String::as_str).unwrap_or("community");
                println!(
                    "{:>3} | {:<28} | {:<14} | {:>7} | {:>6.1} | {:<14} | {:<9}",
                    i + 1,
                    truncate(&r.name, 28),
                    truncate(&r.category, 14),
                    r.repo_stars,
                    r.rating,
                    truncate(&r.last_updated, 14),
                    tier,
                );
            }
            println!("\n{} of {} servers | slug: /servers/<slug>", matched.len().min(limit), total);
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Total:      {}", s.total);
            println!("Verified:   {}", s.verified);
            println!("Featured:   {}", s.featured);
            println!("Community:  {}", s.community);
            println!("Categories: {}", s.categories);
            println!("With stars: {}", s.with_stars);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run_pipeline(input: &str, limit: Option<usize>, cap: usize) -> anyhow::Result<()> {
    // Phase 1: parse and merge (fast, no network)
    let text = read_input(input)?;
    let entries = parser::parse_document(&text);
    println!("Parsed {} entries from {}", entries.len(), input);

    let (mut records, stats) = merge::build_records(&entries);
    stats.print();
    print_tier_counts(&records);

    // Phase 2: enrich, highest-trust records first
    merge::prioritize(&mut records);
    let source = enrich::GitHubSource::from_env();
    if !source.has_token() {
        println!("No GITHUB_TOKEN set - enriching a reduced batch at the anonymous rate");
    }
    let max = limit.unwrap_or_else(|| source.fetch_limit());
    let mut cache = enrich::StarCache::load(enrich::CACHE_PATH, enrich::CACHE_TTL_SECS);

    println!("Enriching top {} of {} records...", max.min(records.len()), records.len());
    let t_enrich = Instant::now();
    let estats =
        enrich::enrich_records(&mut records, &source, &mut cache, max, source.pacing()).await;
    if let Err(e) = cache.save(enrich::CACHE_PATH) {
        warn!("Failed to persist star cache: {}", e);
    }
    println!(
        "Enriched {} records ({} fetched, {} cached, {} errors{}) in {:.1}s",
        estats.attempted,
        estats.fetched,
        estats.cache_hits,
        estats.errors,
        if estats.quota_hit { ", quota hit" } else { "" },
        t_enrich.elapsed().as_secs_f64(),
    );

    // Phase 3: rank, cap, persist. Any write failure aborts the run.
    merge::rank(&mut records);
    snapshot::write(snapshot::FULL_SNAPSHOT_PATH, &records)?;
    let top: Vec<_> = records.iter().take(cap).cloned().collect();
    snapshot::write(snapshot::SNAPSHOT_PATH, &top)?;

    let conn = db::connect()?;
    db::init_schema(&conn)?;
    let upserted = db::upsert_records(&conn, &top)?;

    println!(
        "Saved {} records to {} ({} total to {})",
        top.len(),
        snapshot::SNAPSHOT_PATH,
        records.len(),
        snapshot::FULL_SNAPSHOT_PATH,
    );
    println!(
        "Upserted {} rows into {} ({} total)",
        upserted,
        db::DB_PATH,
        db::count(&conn)?
    );

    print_category_counts(&top);

    let starred: Vec<_> = top.iter().filter(|r| r.repo_stars > 0).collect();
    if !starred.is_empty() {
        println!("\nTop by stars:");
        for (i, r) in starred.iter().take(10).enumerate() {
            println!(
                "{:>3}. {} ({} stars) - {}",
                i + 1,
                r.name,
                r.repo_stars,
                r.section
            );
        }
    }

    Ok(())
}

fn read_input(input: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {} (run 'fetch' first)", input))
}

fn print_tier_counts(records: &[model::CatalogRecord]) {
    let featured = records.iter().filter(|r| r.is_featured).count();
    let official = records
        .iter()
        .filter(|r| r.is_verified && !r.is_featured)
        .count();
    let community = records.iter().filter(|r| !r.is_verified).count();
    println!("   Reference: {}", featured);
    println!("   Official:  {}", official);
    println!("   Community: {}", community);
}

fn print_category_counts(records: &[model::CatalogRecord]) {
    let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    for r in records {
        *counts.entry(r.category.as_str()).or_default() += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    println!("\nCategories:");
    for (label, n) in counts {
        println!("   {:<14} {}", label, n);
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max - 3).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
