//! Catalog statistics.
//!
//! A quick summary of what has been archived: entry counts, archived
//! bytes, per-year breakdown, and catalog writes still waiting in the
//! pending journal. Used by `librarian stats`.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;
use crate::journal::PendingJournal;

/// Per-year breakdown of archived files.
struct YearStats {
    year: String,
    count: i64,
    bytes: i64,
}

/// Run the stats command: query the catalog and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let totals = sqlx::query(
        r#"
        SELECT
            COUNT(*) AS entries,
            COALESCE(SUM(size_bytes), 0) AS bytes,
            COALESCE(SUM(CASE WHEN latitude IS NOT NULL THEN 1 ELSE 0 END), 0) AS located,
            COALESCE(SUM(CASE WHEN captured_at IS NULL THEN 1 ELSE 0 END), 0) AS undated,
            MAX(ingested_at) AS last_ingest
        FROM media_assets
        "#,
    )
    .fetch_one(&pool)
    .await?;

    let entries: i64 = totals.get("entries");
    let bytes: i64 = totals.get("bytes");
    let located: i64 = totals.get("located");
    let undated: i64 = totals.get("undated");
    let last_ingest: Option<i64> = totals.get("last_ingest");

    let db_size = std::fs::metadata(&config.catalog.path)
        .map(|m| m.len())
        .unwrap_or(0);
    let pending = PendingJournal::open(&config.catalog.pending_dir())?.len();

    println!("Librarian catalog stats");
    println!("=======================");
    println!();
    println!("  Catalog:     {}", config.catalog.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!("  Archive:     {}", config.archive.root.display());
    println!();
    println!("  Entries:     {}", entries);
    println!("  Archived:    {}", format_bytes(bytes.max(0) as u64));
    println!(
        "  Located:     {} / {} ({}%)",
        located,
        entries,
        if entries > 0 { (located * 100) / entries } else { 0 }
    );
    println!("  Undated:     {}", undated);
    println!(
        "  Last ingest: {}",
        match last_ingest {
            Some(ts) => format_ts_relative(ts),
            None => "never".to_string(),
        }
    );
    println!("  Pending:     {}", pending);

    let year_rows = sqlx::query(
        r#"
        SELECT
            COALESCE(substr(captured_at, 1, 4), 'unknown') AS year,
            COUNT(*) AS count,
            COALESCE(SUM(size_bytes), 0) AS bytes
        FROM media_assets
        GROUP BY year
        ORDER BY year DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let years: Vec<YearStats> = year_rows
        .iter()
        .map(|row| YearStats {
            year: row.get("year"),
            count: row.get("count"),
            bytes: row.get("bytes"),
        })
        .collect();

    if !years.is_empty() {
        println!();
        println!("  By year:");
        println!("  {:<10} {:>8} {:>12}", "YEAR", "FILES", "SIZE");
        println!("  {}", "-".repeat(32));
        for y in &years {
            println!(
                "  {:<10} {:>8} {:>12}",
                y.year,
                y.count,
                format_bytes(y.bytes.max(0) as u64)
            );
        }
    }

    println!();

    pool.close().await;
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.2} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp relative to now ("3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    match delta {
        d if d < 0 => format_ts_iso(ts),
        d if d < 60 => "just now".to_string(),
        d if d < 3600 => plural(d / 60, "min"),
        d if d < 86400 => plural(d / 3600, "hour"),
        d if d < 86400 * 30 => plural(d / 86400, "day"),
        _ => format_ts_iso(ts),
    }
}

fn plural(n: i64, unit: &str) -> String {
    format!("{} {}{} ago", n, unit, if n == 1 { "" } else { "s" })
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
