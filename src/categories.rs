//! Category management and document assignment.

use anyhow::{bail, Result};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::config::Config;
use crate::db;
use crate::models::Category;

pub async fn category_id_by_name(pool: &SqlitePool, name: &str) -> Result<Option<String>> {
    let id: Option<String> = sqlx::query_scalar("SELECT id FROM categories WHERE name = ?")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

/// Link a document to a category. Linking twice is a no-op.
pub async fn link_document(pool: &SqlitePool, document_id: &str, category_id: &str) -> Result<()> {
    sqlx::query(
        "INSERT OR IGNORE INTO document_categories (document_id, category_id) VALUES (?, ?)",
    )
    .bind(document_id)
    .bind(category_id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn run_add(config: &Config, name: &str, description: Option<String>) -> Result<()> {
    let pool = db::connect(config).await?;

    if category_id_by_name(&pool, name).await?.is_some() {
        pool.close().await;
        bail!("category already exists: {}", name);
    }

    let id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO categories (id, name, description, created_at) VALUES (?, ?, ?, ?)")
        .bind(&id)
        .bind(name)
        .bind(&description)
        .bind(chrono::Utc::now().timestamp())
        .execute(&pool)
        .await?;

    println!("Created category '{}' ({})", name, id);
    pool.close().await;
    Ok(())
}

pub async fn run_list(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;

    let rows = sqlx::query(
        r#"
        SELECT c.id, c.name, c.description, c.created_at, COUNT(dc.document_id) AS doc_count
        FROM categories c
        LEFT JOIN document_categories dc ON dc.category_id = c.id
        GROUP BY c.id
        ORDER BY c.name ASC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    if rows.is_empty() {
        println!("No categories.");
        pool.close().await;
        return Ok(());
    }

    println!("{:<24} {:>6}   {}", "CATEGORY", "DOCS", "DESCRIPTION");
    for row in &rows {
        let category = Category {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            created_at: row.get("created_at"),
        };
        let doc_count: i64 = row.get("doc_count");
        println!(
            "{:<24} {:>6}   {}",
            category.name,
            doc_count,
            category.description.as_deref().unwrap_or("")
        );
    }

    pool.close().await;
    Ok(())
}

/// Delete a category. Link rows cascade; documents themselves are untouched.
pub async fn run_rm(config: &Config, name: &str) -> Result<()> {
    let pool = db::connect(config).await?;

    let result = sqlx::query("DELETE FROM categories WHERE name = ?")
        .bind(name)
        .execute(&pool)
        .await?;
    if result.rows_affected() == 0 {
        pool.close().await;
        bail!("category not found: {}", name);
    }

    println!("Removed category '{}'", name);
    pool.close().await;
    Ok(())
}

pub async fn run_assign(config: &Config, document_id: &str, category_name: &str) -> Result<()> {
    let pool = db::connect(config).await?;

    let doc_exists: bool = sqlx::query_scalar("SELECT COUNT(*) > 0 FROM documents WHERE id = ?")
        .bind(document_id)
        .fetch_one(&pool)
        .await?;
    if !doc_exists {
        pool.close().await;
        bail!("document not found: {}", document_id);
    }

    let category_id = match category_id_by_name(&pool, category_name).await? {
        Some(id) => id,
        None => {
            pool.close().await;
            bail!("category not found: {}", category_name);
        }
    };

    link_document(&pool, document_id, &category_id).await?;
    println!("Assigned {} to '{}'", document_id, category_name);

    pool.close().await;
    Ok(())
}

pub async fn run_unassign(config: &Config, document_id: &str, category_name: &str) -> Result<()> {
    let pool = db::connect(config).await?;

    let category_id = match category_id_by_name(&pool, category_name).await? {
        Some(id) => id,
        None => {
            pool.close().await;
            bail!("category not found: {}", category_name);
        }
    };

    sqlx::query("DELETE FROM document_categories WHERE document_id = ? AND category_id = ?")
        .bind(document_id)
        .bind(&category_id)
        .execute(&pool)
        .await?;

    println!("Unassigned {} from '{}'", document_id, category_name);
    pool.close().await;
    Ok(())
}
