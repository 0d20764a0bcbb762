//! Document retrieval and removal.
//!
//! Fetches documents and their plaintext bodies from the database. Used by
//! the `ccd list`/`get`/`rm` commands and by concordance generation, which
//! scans document bodies loaded through [`load_documents`].

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};

use crate::config::Config;
use crate::db;
use crate::models::Document;

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Document {
    Document {
        id: row.get("id"),
        name: row.get("name"),
        path: row.get("path"),
        content_type: row.get("content_type"),
        body: row.get("body"),
        word_count: row.get("word_count"),
        byte_size: row.get("byte_size"),
        sha256: row.get("sha256"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Load documents by id; with no ids, load the whole corpus. A missing id
/// is an error rather than a silent omission.
pub async fn load_documents(pool: &SqlitePool, ids: &[String]) -> Result<Vec<Document>> {
    if ids.is_empty() {
        let rows = sqlx::query(
            "SELECT id, name, path, content_type, body, word_count, byte_size, sha256, \
             created_at, updated_at FROM documents ORDER BY name ASC, id ASC",
        )
        .fetch_all(pool)
        .await?;
        return Ok(rows.iter().map(row_to_document).collect());
    }

    let mut documents = Vec::with_capacity(ids.len());
    for id in ids {
        let row = sqlx::query(
            "SELECT id, name, path, content_type, body, word_count, byte_size, sha256, \
             created_at, updated_at FROM documents WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        match row {
            Some(row) => documents.push(row_to_document(&row)),
            None => bail!("document not found: {}", id),
        }
    }
    Ok(documents)
}

pub async fn run_list(config: &Config, category: Option<String>) -> Result<()> {
    let pool = db::connect(config).await?;

    let rows = match &category {
        Some(name) => {
            sqlx::query(
                r#"
                SELECT d.id, d.name, d.word_count, d.updated_at
                FROM documents d
                JOIN document_categories dc ON dc.document_id = d.id
                JOIN categories c ON c.id = dc.category_id
                WHERE c.name = ?
                ORDER BY d.name ASC, d.id ASC
                "#,
            )
            .bind(name)
            .fetch_all(&pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT id, name, word_count, updated_at FROM documents ORDER BY name ASC, id ASC",
            )
            .fetch_all(&pool)
            .await?
        }
    };

    if rows.is_empty() {
        println!("No documents.");
        pool.close().await;
        return Ok(());
    }

    println!("{:<36}  {:>8}  {:<10}  {}", "ID", "WORDS", "UPDATED", "NAME");
    for row in &rows {
        let id: String = row.get("id");
        let name: String = row.get("name");
        let word_count: i64 = row.get("word_count");
        let updated_at: i64 = row.get("updated_at");
        let date = chrono::DateTime::from_timestamp(updated_at, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        println!("{:<36}  {:>8}  {:<10}  {}", id, word_count, date, name);
    }

    pool.close().await;
    Ok(())
}

pub async fn run_get(config: &Config, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let docs = load_documents(&pool, &[id.to_string()]).await;
    let doc = match docs {
        Ok(mut docs) => docs.remove(0),
        Err(e) => {
            pool.close().await;
            return Err(e);
        }
    };

    let category_rows = sqlx::query(
        r#"
        SELECT c.name FROM categories c
        JOIN document_categories dc ON dc.category_id = c.id
        WHERE dc.document_id = ?
        ORDER BY c.name ASC
        "#,
    )
    .bind(id)
    .fetch_all(&pool)
    .await?;
    let categories: Vec<String> = category_rows.iter().map(|r| r.get("name")).collect();

    println!("--- Document ---");
    println!("id:           {}", doc.id);
    println!("name:         {}", doc.name);
    println!("path:         {}", doc.path);
    println!("content_type: {}", doc.content_type);
    println!("words:        {}", doc.word_count);
    println!("bytes:        {}", doc.byte_size);
    println!("sha256:       {}", doc.sha256);
    println!("created_at:   {}", format_ts_iso(doc.created_at));
    println!("updated_at:   {}", format_ts_iso(doc.updated_at));
    if !categories.is_empty() {
        println!("categories:   {}", categories.join(", "));
    }
    println!();
    println!("--- Body ---");
    println!("{}", doc.body);

    pool.close().await;
    Ok(())
}

/// Delete a document and its FTS row. Concordance entries generated earlier
/// keep their snapshot of the document id and name.
pub async fn run_rm(config: &Config, id: &str) -> Result<()> {
    let pool = db::connect(config).await?;

    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if result.rows_affected() == 0 {
        tx.rollback().await?;
        pool.close().await;
        bail!("document not found: {}", id);
    }
    sqlx::query("DELETE FROM documents_fts WHERE document_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    println!("Removed document {}", id);
    pool.close().await;
    Ok(())
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
        .unwrap_or_else(|| ts.to_string())
}
