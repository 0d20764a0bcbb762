//! Keyword search over the document corpus.
//!
//! Queries the FTS5 index kept in step with the documents table and prints
//! ranked results with snippets. This is corpus browsing, not concordance
//! generation — use `ccd concordance generate` for positional KWIC output.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::Row;

use crate::config::Config;
use crate::db;

const CANDIDATE_LIMIT: i64 = 200;

pub async fn run_search(
    config: &Config,
    query: &str,
    category: Option<String>,
    since: Option<String>,
    limit: Option<i64>,
) -> Result<()> {
    if query.trim().is_empty() {
        println!("No results.");
        return Ok(());
    }

    let pool = db::connect(config).await?;
    let final_limit = limit.unwrap_or(20).max(1);

    let rows = sqlx::query(
        r#"
        SELECT document_id, rank,
               snippet(documents_fts, 2, '>>>', '<<<', '...', 24) AS excerpt
        FROM documents_fts
        WHERE documents_fts MATCH ?
        ORDER BY rank
        LIMIT ?
        "#,
    )
    .bind(query)
    .bind(CANDIDATE_LIMIT)
    .fetch_all(&pool)
    .await?;

    struct DisplayResult {
        id: String,
        name: String,
        updated_at: i64,
        score: f64,
        excerpt: String,
    }

    let mut results: Vec<DisplayResult> = Vec::new();

    for row in &rows {
        let doc_id: String = row.get("document_id");
        let rank: f64 = row.get("rank");
        let excerpt: String = row.get("excerpt");

        let doc_row = sqlx::query("SELECT id, name, updated_at FROM documents WHERE id = ?")
            .bind(&doc_id)
            .fetch_optional(&pool)
            .await?;
        let doc_row = match doc_row {
            Some(row) => row,
            None => continue, // FTS row orphaned by a concurrent delete
        };

        let updated_at: i64 = doc_row.get("updated_at");

        // Apply category filter
        if let Some(ref name) = category {
            let in_category: bool = sqlx::query_scalar(
                r#"
                SELECT COUNT(*) > 0 FROM document_categories dc
                JOIN categories c ON c.id = dc.category_id
                WHERE dc.document_id = ? AND c.name = ?
                "#,
            )
            .bind(&doc_id)
            .bind(name)
            .fetch_one(&pool)
            .await?;
            if !in_category {
                continue;
            }
        }

        // Apply since filter
        if let Some(ref since_str) = since {
            let since_date = NaiveDate::parse_from_str(since_str, "%Y-%m-%d")?;
            let since_ts = match since_date.and_hms_opt(0, 0, 0) {
                Some(dt) => dt.and_utc().timestamp(),
                None => 0,
            };
            if updated_at < since_ts {
                continue;
            }
        }

        results.push(DisplayResult {
            id: doc_row.get("id"),
            name: doc_row.get("name"),
            updated_at,
            score: -rank, // negate so higher = better
            excerpt,
        });
    }

    if results.is_empty() {
        println!("No results.");
        pool.close().await;
        return Ok(());
    }

    // Sort: score desc, updated_at desc, id asc (deterministic)
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(b.updated_at.cmp(&a.updated_at))
            .then(a.id.cmp(&b.id))
    });
    results.truncate(final_limit as usize);

    for (i, result) in results.iter().enumerate() {
        let date = chrono::DateTime::from_timestamp(result.updated_at, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        println!("{}. [{:.2}] {}", i + 1, result.score, result.name);
        println!("    updated: {}", date);
        println!(
            "    excerpt: \"{}\"",
            result.excerpt.replace('\n', " ").trim()
        );
        println!("    id: {}", result.id);
        println!();
    }

    pool.close().await;
    Ok(())
}
