//! Database statistics and corpus overview.
//!
//! A quick summary of what's stored: document, category, and concordance
//! counts plus a per-category breakdown. Used by `ccd stats` to give
//! confidence that imports and concordance runs are landing as expected.

use anyhow::Result;
use sqlx::Row;

use crate::config::Config;
use crate::db;

pub async fn run_stats(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let total_docs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
        .fetch_one(&pool)
        .await?;
    let total_words: i64 =
        sqlx::query_scalar("SELECT COALESCE(SUM(word_count), 0) FROM documents")
            .fetch_one(&pool)
            .await?;
    let total_categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&pool)
        .await?;
    let total_tables: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM concordance_tables")
        .fetch_one(&pool)
        .await?;
    let total_entries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM concordance_entries")
        .fetch_one(&pool)
        .await?;
    let last_import: Option<i64> = sqlx::query_scalar("SELECT MAX(updated_at) FROM documents")
        .fetch_one(&pool)
        .await?;

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Concord — Database Stats");
    println!("========================");
    println!();
    println!("  Database:     {}", config.db.path.display());
    println!("  Size:         {}", format_bytes(db_size));
    println!();
    println!("  Documents:    {} ({} words)", total_docs, total_words);
    println!("  Categories:   {}", total_categories);
    println!(
        "  Concordances: {} ({} entries)",
        total_tables, total_entries
    );
    println!(
        "  Last import:  {}",
        match last_import {
            Some(ts) => format_ts_relative(ts),
            None => "never".to_string(),
        }
    );

    // Per-category breakdown
    let category_rows = sqlx::query(
        r#"
        SELECT c.name, COUNT(dc.document_id) AS doc_count
        FROM categories c
        LEFT JOIN document_categories dc ON dc.category_id = c.id
        GROUP BY c.id
        ORDER BY doc_count DESC, c.name ASC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    if !category_rows.is_empty() {
        println!();
        println!("  By category:");
        println!("  {:<24} {:>6}", "CATEGORY", "DOCS");
        println!("  {}", "-".repeat(32));
        for row in &category_rows {
            let name: String = row.get("name");
            let doc_count: i64 = row.get("doc_count");
            println!("  {:<24} {:>6}", name, doc_count);
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

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
