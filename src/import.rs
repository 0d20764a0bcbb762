//! Filesystem import pipeline.
//!
//! Walks a directory, filters files through include/exclude glob sets,
//! extracts plaintext, and upserts documents keyed by source path. Unchanged
//! files (same path, same content hash) are skipped. Per-file failures are
//! logged and counted; they never abort the run.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;
use walkdir::WalkDir;

use crate::categories;
use crate::config::Config;
use crate::db;
use crate::extract;

enum UpsertOutcome {
    Inserted { id: String },
    Updated { id: String },
    Unchanged,
}

pub async fn run_import(
    config: &Config,
    path: Option<PathBuf>,
    category: Option<String>,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    let root = path.unwrap_or_else(|| config.import.root.clone());
    if !root.exists() {
        bail!("import root does not exist: {}", root.display());
    }

    let mut files = collect_files(config, &root)?;
    if let Some(lim) = limit {
        files.truncate(lim);
    }

    let pool = db::connect(config).await?;

    let category_id = match &category {
        Some(name) => match categories::category_id_by_name(&pool, name).await? {
            Some(id) => Some(id),
            None => {
                pool.close().await;
                bail!("category not found: {} (create it with 'ccd category add')", name);
            }
        },
        None => None,
    };

    let mut imported = 0u64;
    let mut updated = 0u64;
    let mut unchanged = 0u64;
    let mut skipped = 0u64;

    for file in &files {
        let bytes = match std::fs::read(file) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("skipping {}: {}", file.display(), e);
                skipped += 1;
                continue;
            }
        };
        if bytes.len() as u64 > config.import.max_file_bytes {
            warn!(
                "skipping {}: {} bytes exceeds import.max_file_bytes",
                file.display(),
                bytes.len()
            );
            skipped += 1;
            continue;
        }

        let (format, body) = match extract::extract_from_path(file, &bytes) {
            Ok(extracted) => extracted,
            Err(e) => {
                warn!("skipping {}: {}", file.display(), e);
                skipped += 1;
                continue;
            }
        };

        let outcome = upsert_document(&pool, file, format, &body, bytes.len() as i64, dry_run).await?;
        match outcome {
            UpsertOutcome::Inserted { id } => {
                imported += 1;
                if let (Some(cat_id), false) = (&category_id, dry_run) {
                    categories::link_document(&pool, &id, cat_id).await?;
                }
            }
            UpsertOutcome::Updated { id } => {
                updated += 1;
                if let (Some(cat_id), false) = (&category_id, dry_run) {
                    categories::link_document(&pool, &id, cat_id).await?;
                }
            }
            UpsertOutcome::Unchanged => {
                debug!("unchanged: {}", file.display());
                unchanged += 1;
            }
        }
    }

    if dry_run {
        println!("import {} (dry-run)", root.display());
    } else {
        println!("import {}", root.display());
    }
    println!("  files matched: {}", files.len());
    println!("  imported: {}", imported);
    println!("  updated: {}", updated);
    println!("  unchanged: {}", unchanged);
    println!("  skipped: {}", skipped);
    println!("ok");

    pool.close().await;
    Ok(())
}

/// Walk the root and apply include/exclude globs. Results are sorted by
/// path for deterministic output.
fn collect_files(config: &Config, root: &Path) -> Result<Vec<PathBuf>> {
    let include_set = build_globset(&config.import.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.import.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut files = Vec::new();
    let walker = WalkDir::new(root).follow_links(config.import.follow_symlinks);
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

async fn upsert_document(
    pool: &SqlitePool,
    path: &Path,
    format: extract::DocumentFormat,
    body: &str,
    byte_size: i64,
    dry_run: bool,
) -> Result<UpsertOutcome> {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    let sha256 = format!("{:x}", hasher.finalize());

    let path_str = path.to_string_lossy().to_string();
    let existing: Option<(String, String)> =
        sqlx::query_as("SELECT id, sha256 FROM documents WHERE path = ?")
            .bind(&path_str)
            .fetch_optional(pool)
            .await?;

    let (doc_id, is_update) = match existing {
        Some((id, old_hash)) => {
            if old_hash == sha256 {
                return Ok(UpsertOutcome::Unchanged);
            }
            (id, true)
        }
        None => (Uuid::new_v4().to_string(), false),
    };

    if dry_run {
        return Ok(if is_update {
            UpsertOutcome::Updated { id: doc_id }
        } else {
            UpsertOutcome::Inserted { id: doc_id }
        });
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path_str.clone());
    let word_count = body.split_whitespace().count() as i64;
    let now = chrono::Utc::now().timestamp();

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO documents (id, name, path, content_type, body, word_count, byte_size, sha256, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(path) DO UPDATE SET
            name = excluded.name,
            content_type = excluded.content_type,
            body = excluded.body,
            word_count = excluded.word_count,
            byte_size = excluded.byte_size,
            sha256 = excluded.sha256,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&doc_id)
    .bind(&name)
    .bind(&path_str)
    .bind(format.content_type())
    .bind(body)
    .bind(word_count)
    .bind(byte_size)
    .bind(&sha256)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    // Keep the FTS row in step with the document
    sqlx::query("DELETE FROM documents_fts WHERE document_id = ?")
        .bind(&doc_id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("INSERT INTO documents_fts (document_id, name, body) VALUES (?, ?, ?)")
        .bind(&doc_id)
        .bind(&name)
        .bind(body)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(if is_update {
        UpsertOutcome::Updated { id: doc_id }
    } else {
        UpsertOutcome::Inserted { id: doc_id }
    })
}
