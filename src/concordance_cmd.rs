//! Concordance CLI commands: generate, show, export, import, tag, remove.
//!
//! Thin orchestration over [`crate::concordance`] (generation),
//! [`crate::table_store`] (persistence), and [`crate::export`] (rendering).

use anyhow::{bail, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::concordance;
use crate::config::Config;
use crate::db;
use crate::documents;
use crate::export::{self, ExportFormat};
use crate::models::{ConcordanceSettings, ConcordanceTable, SortOrder};
use crate::table_store::{self, TableSummary};

/// Per-run overrides for the configured concordance defaults. Flags that
/// were not given leave the config value in place.
#[derive(Debug, Default)]
pub struct SettingsOverrides {
    pub window: Option<usize>,
    pub case_sensitive: bool,
    pub partial: bool,
    pub no_punctuation: bool,
    pub sort: Option<SortOrder>,
    pub group_by_keyword: bool,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

impl SettingsOverrides {
    fn apply(&self, mut settings: ConcordanceSettings) -> Result<ConcordanceSettings> {
        if let Some(window) = self.window {
            if window == 0 {
                bail!("--window must be >= 1");
            }
            settings.context_window = window;
        }
        if self.case_sensitive {
            settings.case_sensitive = true;
        }
        if self.partial {
            settings.whole_word = false;
        }
        if self.no_punctuation {
            settings.include_punctuation = false;
        }
        if let Some(sort) = self.sort {
            settings.sort_order = sort;
        }
        if self.group_by_keyword {
            settings.group_by_keyword = true;
        }
        if let Some(min) = self.min_length {
            if min == 0 {
                bail!("--min-length must be >= 1");
            }
            settings.min_keyword_length = min;
        }
        if let Some(max) = self.max_length {
            settings.max_keyword_length = max;
        }
        if settings.max_keyword_length != 0
            && settings.max_keyword_length < settings.min_keyword_length
        {
            bail!("--max-length must be 0 (unbounded) or >= --min-length");
        }
        Ok(settings)
    }
}

pub async fn run_generate(
    config: &Config,
    name: &str,
    keywords: Vec<String>,
    doc_ids: Vec<String>,
    overrides: SettingsOverrides,
    tags: Vec<String>,
) -> Result<()> {
    let settings = overrides.apply(config.concordance.clone())?;

    let pool = db::connect(config).await?;

    let existing: Option<String> =
        sqlx::query_scalar("SELECT id FROM concordance_tables WHERE name = ?")
            .bind(name)
            .fetch_optional(&pool)
            .await?;
    if existing.is_some() {
        pool.close().await;
        bail!(
            "a concordance table named '{}' already exists (remove it first)",
            name
        );
    }

    let docs = documents::load_documents(&pool, &doc_ids).await?;
    if docs.is_empty() {
        pool.close().await;
        bail!("no documents in the corpus — run 'ccd import' first");
    }

    let table = concordance::generate(name, &keywords, &docs, &settings, tags)?;
    table_store::save_table(&pool, &table).await?;

    let mut per_keyword: HashMap<&str, usize> = HashMap::new();
    for entry in &table.entries {
        *per_keyword.entry(entry.keyword.as_str()).or_default() += 1;
    }

    println!("concordance '{}'", table.name);
    println!("  id: {}", table.id);
    println!(
        "  window: {} chars, sort: {}",
        table.settings.context_window, table.settings.sort_order
    );
    println!("  documents scanned: {}", docs.len());
    println!("  entries: {}", table.entries.len());
    for keyword in &table.keywords {
        println!(
            "    {}: {}",
            keyword,
            per_keyword.get(keyword.as_str()).copied().unwrap_or(0)
        );
    }
    println!("ok");

    pool.close().await;
    Ok(())
}

pub async fn run_list(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    let summaries: Vec<TableSummary> = table_store::list_tables(&pool).await?;

    if summaries.is_empty() {
        println!("No concordance tables.");
        pool.close().await;
        return Ok(());
    }

    println!(
        "{:<36}  {:>8}  {:>7}  {:<10}  {}",
        "ID", "KEYWORDS", "ENTRIES", "CREATED", "NAME"
    );
    for s in &summaries {
        let date = chrono::DateTime::from_timestamp(s.created_at, 0)
            .map(|dt| dt.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        let name = if s.tags.is_empty() {
            s.name.clone()
        } else {
            format!("{} [{}]", s.name, s.tags.join(", "))
        };
        println!(
            "{:<36}  {:>8}  {:>7}  {:<10}  {}",
            s.id, s.keyword_count, s.entry_count, date, name
        );
    }

    pool.close().await;
    Ok(())
}

/// Print a table as an aligned KWIC listing.
pub async fn run_show(config: &Config, id_or_name: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let table = table_store::load_table(&pool, id_or_name).await?;
    pool.close().await;

    print!("{}", export::render(&table, ExportFormat::Txt)?);
    Ok(())
}

pub async fn run_rm(config: &Config, id_or_name: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    table_store::delete_table(&pool, id_or_name).await?;
    println!("Removed concordance table {}", id_or_name);
    pool.close().await;
    Ok(())
}

pub async fn run_export(
    config: &Config,
    id_or_name: &str,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let table = table_store::load_table(&pool, id_or_name).await?;
    pool.close().await;

    let content = export::render(&table, format)?;
    export::write_output(&content, output.as_deref())?;
    Ok(())
}

/// Load a JSON export and save it as a new table (fresh id, same name).
pub async fn run_import(config: &Config, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))?;
    let mut table: ConcordanceTable = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("not a concordance table export: {}", e))?;

    let pool = db::connect(config).await?;

    let existing: Option<String> =
        sqlx::query_scalar("SELECT id FROM concordance_tables WHERE name = ?")
            .bind(&table.name)
            .fetch_optional(&pool)
            .await?;
    if existing.is_some() {
        pool.close().await;
        bail!(
            "a concordance table named '{}' already exists (remove it first)",
            table.name
        );
    }

    table.id = Uuid::new_v4().to_string();
    table_store::save_table(&pool, &table).await?;

    println!(
        "Imported '{}' ({} entries, {} keywords) as {}",
        table.name,
        table.entries.len(),
        table.keywords.len(),
        table.id
    );

    pool.close().await;
    Ok(())
}

pub async fn run_tag(
    config: &Config,
    id_or_name: &str,
    add: Vec<String>,
    remove: Vec<String>,
) -> Result<()> {
    if add.is_empty() && remove.is_empty() {
        bail!("nothing to do: pass --add and/or --remove");
    }

    let pool = db::connect(config).await?;
    for tag in &add {
        table_store::add_tag(&pool, id_or_name, tag).await?;
    }
    for tag in &remove {
        table_store::remove_tag(&pool, id_or_name, tag).await?;
    }

    let table = table_store::load_table(&pool, id_or_name).await?;
    println!("tags: {}", table.tags.join(", "));

    pool.close().await;
    Ok(())
}
