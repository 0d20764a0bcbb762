//! Core data models used throughout Concord.
//!
//! These types represent the documents, categories, and concordance records
//! that flow through the import and concordance pipeline.

use serde::{Deserialize, Serialize};

/// Normalized document stored in SQLite.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub path: String,
    pub content_type: String,
    pub body: String,
    pub word_count: i64,
    pub byte_size: i64,
    pub sha256: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// User-defined label that documents can be filed under. Documents and
/// categories are many-to-many.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_at: i64,
}

/// Ordering applied to the entries of a concordance table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Document name, then match position.
    Position,
    /// Keyword, then document name, then match position.
    Keyword,
    /// Document name, then keyword, then match position.
    Document,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Position => "position",
            SortOrder::Keyword => "keyword",
            SortOrder::Document => "document",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "position" => Ok(SortOrder::Position),
            "keyword" => Ok(SortOrder::Keyword),
            "document" => Ok(SortOrder::Document),
            other => Err(format!(
                "unknown sort order: '{}'. Use position, keyword, or document.",
                other
            )),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matching and layout configuration for concordance generation.
///
/// Pure configuration — no state transitions. Defaults come from the
/// `[concordance]` section of the config file and individual fields can be
/// overridden per run from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcordanceSettings {
    /// Context window on each side of a match, in characters.
    #[serde(default = "default_context_window")]
    pub context_window: usize,
    #[serde(default)]
    pub case_sensitive: bool,
    /// Match whole words only (`\b`-anchored) instead of raw substrings.
    #[serde(default = "default_true")]
    pub whole_word: bool,
    /// Keep punctuation in context strings. When false, punctuation is
    /// stripped and whitespace re-collapsed.
    #[serde(default = "default_true")]
    pub include_punctuation: bool,
    /// Keywords shorter than this (in chars) are dropped before scanning.
    #[serde(default = "default_min_keyword_length")]
    pub min_keyword_length: usize,
    /// Keywords longer than this are dropped. 0 means unbounded.
    #[serde(default)]
    pub max_keyword_length: usize,
    #[serde(default = "default_sort_order")]
    pub sort_order: SortOrder,
    /// Force keyword as the primary ordering key regardless of sort_order.
    #[serde(default)]
    pub group_by_keyword: bool,
}

fn default_context_window() -> usize {
    50
}
fn default_true() -> bool {
    true
}
fn default_min_keyword_length() -> usize {
    1
}
fn default_sort_order() -> SortOrder {
    SortOrder::Position
}

impl Default for ConcordanceSettings {
    fn default() -> Self {
        Self {
            context_window: default_context_window(),
            case_sensitive: false,
            whole_word: true,
            include_punctuation: true,
            min_keyword_length: default_min_keyword_length(),
            max_keyword_length: 0,
            sort_order: default_sort_order(),
            group_by_keyword: false,
        }
    }
}

/// One keyword occurrence with its surrounding context.
///
/// Immutable once created; owned by a [`ConcordanceTable`]. The document id
/// and name are snapshots taken at generation time — deleting the document
/// later does not invalidate the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcordanceEntry {
    /// The keyword as configured.
    pub keyword: String,
    /// The exact text matched in the document (differs from `keyword` in
    /// case-insensitive mode).
    pub matched_text: String,
    pub left_context: String,
    pub right_context: String,
    /// Character offset of the match start within the document body.
    pub position: usize,
    /// 1-based line number of the match.
    pub line_number: usize,
    /// 1-based paragraph number of the match.
    pub paragraph_number: usize,
    pub document_id: String,
    pub document_name: String,
    pub created_at: i64,
}

/// A named collection of concordance entries generated from one or more
/// documents for a set of keywords.
///
/// Persisted wholesale: every save replaces the full entry set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConcordanceTable {
    pub id: String,
    pub name: String,
    pub keywords: Vec<String>,
    pub document_ids: Vec<String>,
    pub entries: Vec<ConcordanceEntry>,
    pub settings: ConcordanceSettings,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: i64,
}
