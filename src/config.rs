use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::models::ConcordanceSettings;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub concordance: ConcordanceSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImportConfig {
    /// Default directory scanned by `ccd import` when no path is given.
    #[serde(default = "default_import_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub follow_symlinks: bool,
    /// Files larger than this are skipped with a warning.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            root: default_import_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            follow_symlinks: false,
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

fn default_import_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.txt".to_string(), "**/*.md".to_string()]
}

fn default_max_file_bytes() -> u64 {
    50 * 1024 * 1024
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate import
    if config.import.max_file_bytes == 0 {
        anyhow::bail!("import.max_file_bytes must be > 0");
    }

    // Validate concordance defaults
    let c = &config.concordance;
    if c.context_window == 0 {
        anyhow::bail!("concordance.context_window must be >= 1");
    }
    if c.min_keyword_length == 0 {
        anyhow::bail!("concordance.min_keyword_length must be >= 1");
    }
    if c.max_keyword_length != 0 && c.max_keyword_length < c.min_keyword_length {
        anyhow::bail!(
            "concordance.max_keyword_length must be 0 (unbounded) or >= min_keyword_length"
        );
    }

    Ok(config)
}
