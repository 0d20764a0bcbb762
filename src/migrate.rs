use anyhow::Result;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    // Create documents table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            path TEXT NOT NULL,
            content_type TEXT NOT NULL DEFAULT 'text/plain',
            body TEXT NOT NULL,
            word_count INTEGER NOT NULL,
            byte_size INTEGER NOT NULL,
            sha256 TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            UNIQUE(path)
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create categories table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create document <-> category link table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS document_categories (
            document_id TEXT NOT NULL,
            category_id TEXT NOT NULL,
            PRIMARY KEY (document_id, category_id),
            FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create concordance tables
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS concordance_tables (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            keywords_json TEXT NOT NULL,
            document_ids_json TEXT NOT NULL,
            settings_json TEXT NOT NULL,
            tags_json TEXT NOT NULL DEFAULT '[]',
            created_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create concordance entries; cascade so dropping a table removes its rows
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS concordance_entries (
            id TEXT PRIMARY KEY,
            table_id TEXT NOT NULL,
            entry_index INTEGER NOT NULL,
            keyword TEXT NOT NULL,
            matched_text TEXT NOT NULL,
            left_context TEXT NOT NULL,
            right_context TEXT NOT NULL,
            position INTEGER NOT NULL,
            line_number INTEGER NOT NULL,
            paragraph_number INTEGER NOT NULL,
            document_id TEXT NOT NULL,
            document_name TEXT NOT NULL,
            created_at INTEGER NOT NULL,
            UNIQUE(table_id, entry_index),
            FOREIGN KEY (table_id) REFERENCES concordance_tables(id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(&pool)
    .await?;

    // Create FTS5 virtual table over documents
    // FTS5 CREATE is not idempotent natively, so we check first
    let fts_exists: bool = sqlx::query_scalar(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='documents_fts'",
    )
    .fetch_one(&pool)
    .await?;

    if !fts_exists {
        sqlx::query(
            r#"
            CREATE VIRTUAL TABLE documents_fts USING fts5(
                document_id UNINDEXED,
                name,
                body
            )
            "#,
        )
        .execute(&pool)
        .await?;
    }

    // Create indexes
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_entries_table_id ON concordance_entries(table_id)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_updated_at ON documents(updated_at DESC)",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_doc_categories_category ON document_categories(category_id)",
    )
    .execute(&pool)
    .await?;

    pool.close().await;
    Ok(())
}
