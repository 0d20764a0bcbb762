//! SQLite persistence for concordance tables.
//!
//! Tables are saved wholesale: every save upserts the table row and replaces
//! the full entry set in one transaction. Entries cascade on table delete.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::models::{ConcordanceEntry, ConcordanceTable};

/// One line of `ccd concordance list` output.
pub struct TableSummary {
    pub id: String,
    pub name: String,
    pub keyword_count: usize,
    pub entry_count: i64,
    pub tags: Vec<String>,
    pub created_at: i64,
}

pub async fn save_table(pool: &SqlitePool, table: &ConcordanceTable) -> Result<()> {
    let keywords_json = serde_json::to_string(&table.keywords)?;
    let document_ids_json = serde_json::to_string(&table.document_ids)?;
    let settings_json = serde_json::to_string(&table.settings)?;
    let tags_json = serde_json::to_string(&table.tags)?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO concordance_tables (id, name, keywords_json, document_ids_json, settings_json, tags_json, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = excluded.name,
            keywords_json = excluded.keywords_json,
            document_ids_json = excluded.document_ids_json,
            settings_json = excluded.settings_json,
            tags_json = excluded.tags_json
        "#,
    )
    .bind(&table.id)
    .bind(&table.name)
    .bind(&keywords_json)
    .bind(&document_ids_json)
    .bind(&settings_json)
    .bind(&tags_json)
    .bind(table.created_at)
    .execute(&mut *tx)
    .await?;

    // Replace entries wholesale
    sqlx::query("DELETE FROM concordance_entries WHERE table_id = ?")
        .bind(&table.id)
        .execute(&mut *tx)
        .await?;

    for (index, entry) in table.entries.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO concordance_entries
                (id, table_id, entry_index, keyword, matched_text, left_context, right_context,
                 position, line_number, paragraph_number, document_id, document_name, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&table.id)
        .bind(index as i64)
        .bind(&entry.keyword)
        .bind(&entry.matched_text)
        .bind(&entry.left_context)
        .bind(&entry.right_context)
        .bind(entry.position as i64)
        .bind(entry.line_number as i64)
        .bind(entry.paragraph_number as i64)
        .bind(&entry.document_id)
        .bind(&entry.document_name)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Load a table by id, falling back to its unique name.
pub async fn load_table(pool: &SqlitePool, id_or_name: &str) -> Result<ConcordanceTable> {
    let row = sqlx::query(
        "SELECT id, name, keywords_json, document_ids_json, settings_json, tags_json, created_at \
         FROM concordance_tables WHERE id = ? OR name = ?",
    )
    .bind(id_or_name)
    .bind(id_or_name)
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => bail!("concordance table not found: {}", id_or_name),
    };

    let id: String = row.get("id");
    let keywords_json: String = row.get("keywords_json");
    let document_ids_json: String = row.get("document_ids_json");
    let settings_json: String = row.get("settings_json");
    let tags_json: String = row.get("tags_json");

    let entry_rows = sqlx::query(
        "SELECT keyword, matched_text, left_context, right_context, position, line_number, \
                paragraph_number, document_id, document_name, created_at \
         FROM concordance_entries WHERE table_id = ? ORDER BY entry_index ASC",
    )
    .bind(&id)
    .fetch_all(pool)
    .await?;

    let entries: Vec<ConcordanceEntry> = entry_rows
        .iter()
        .map(|row| ConcordanceEntry {
            keyword: row.get("keyword"),
            matched_text: row.get("matched_text"),
            left_context: row.get("left_context"),
            right_context: row.get("right_context"),
            position: row.get::<i64, _>("position") as usize,
            line_number: row.get::<i64, _>("line_number") as usize,
            paragraph_number: row.get::<i64, _>("paragraph_number") as usize,
            document_id: row.get("document_id"),
            document_name: row.get("document_name"),
            created_at: row.get("created_at"),
        })
        .collect();

    Ok(ConcordanceTable {
        id,
        name: row.get("name"),
        keywords: serde_json::from_str(&keywords_json)?,
        document_ids: serde_json::from_str(&document_ids_json)?,
        entries,
        settings: serde_json::from_str(&settings_json)?,
        tags: serde_json::from_str(&tags_json)?,
        created_at: row.get("created_at"),
    })
}

pub async fn list_tables(pool: &SqlitePool) -> Result<Vec<TableSummary>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.name, t.keywords_json, t.tags_json, t.created_at,
               COUNT(e.id) AS entry_count
        FROM concordance_tables t
        LEFT JOIN concordance_entries e ON e.table_id = t.id
        GROUP BY t.id
        ORDER BY t.created_at DESC, t.name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut summaries = Vec::with_capacity(rows.len());
    for row in &rows {
        let keywords_json: String = row.get("keywords_json");
        let tags_json: String = row.get("tags_json");
        let keywords: Vec<String> = serde_json::from_str(&keywords_json)?;
        summaries.push(TableSummary {
            id: row.get("id"),
            name: row.get("name"),
            keyword_count: keywords.len(),
            entry_count: row.get("entry_count"),
            tags: serde_json::from_str(&tags_json)?,
            created_at: row.get("created_at"),
        });
    }
    Ok(summaries)
}

/// Delete a table; the entry rows go with it via the FK cascade.
pub async fn delete_table(pool: &SqlitePool, id_or_name: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM concordance_tables WHERE id = ? OR name = ?")
        .bind(id_or_name)
        .bind(id_or_name)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        bail!("concordance table not found: {}", id_or_name);
    }
    Ok(())
}

/// Add a tag to a table. Adding an existing tag is a no-op.
pub async fn add_tag(pool: &SqlitePool, id_or_name: &str, tag: &str) -> Result<()> {
    let mut table = load_table(pool, id_or_name).await?;
    if !table.tags.iter().any(|t| t == tag) {
        table.tags.push(tag.to_string());
        update_tags(pool, &table.id, &table.tags).await?;
    }
    Ok(())
}

/// Remove a tag from a table. Removing an absent tag is a no-op.
pub async fn remove_tag(pool: &SqlitePool, id_or_name: &str, tag: &str) -> Result<()> {
    let mut table = load_table(pool, id_or_name).await?;
    let before = table.tags.len();
    table.tags.retain(|t| t != tag);
    if table.tags.len() != before {
        update_tags(pool, &table.id, &table.tags).await?;
    }
    Ok(())
}

async fn update_tags(pool: &SqlitePool, id: &str, tags: &[String]) -> Result<()> {
    let tags_json = serde_json::to_string(tags)?;
    sqlx::query("UPDATE concordance_tables SET tags_json = ? WHERE id = ?")
        .bind(&tags_json)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
