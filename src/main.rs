//! # Concord CLI (`ccd`)
//!
//! The `ccd` binary is the interface to Concord. It provides commands for
//! database initialization, document import, corpus browsing, category
//! management, and concordance generation and export.
//!
//! ## Usage
//!
//! ```bash
//! ccd --config ./config/ccd.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `ccd init` | Create the SQLite database and run schema migrations |
//! | `ccd import [path]` | Import documents from a directory |
//! | `ccd list` | List documents in the corpus |
//! | `ccd get <id>` | Print a document's metadata and body |
//! | `ccd rm <id>` | Remove a document |
//! | `ccd category <cmd>` | Manage categories and assignments |
//! | `ccd search "<query>"` | Keyword search over the corpus |
//! | `ccd concordance <cmd>` | Generate, inspect, and export concordances |
//! | `ccd stats` | Corpus overview |
//!
//! ## Examples
//!
//! ```bash
//! # Initialize the database
//! ccd init --config ./config/ccd.toml
//!
//! # Import a directory of text files into a category
//! ccd category add fables
//! ccd import ./corpus/fables --category fables
//!
//! # Generate a whole-word, case-insensitive concordance
//! ccd concordance generate animals --keyword fox --keyword badger --window 40
//!
//! # Export it
//! ccd concordance export animals --format html --output animals.html
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use concord::models::SortOrder;
use concord::{
    categories, concordance_cmd, config, documents, export::ExportFormat, import, migrate, search,
    stats,
};

/// Concord CLI — a local-first document corpus manager and KWIC
/// concordance generator.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/ccd.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "ccd",
    about = "Concord — a local-first document corpus manager and KWIC concordance generator",
    version,
    long_about = "Concord imports documents from the filesystem (plain text, Markdown, HTML, PDF, \
    DOCX), extracts their plaintext into SQLite, and generates Key-Word-In-Context concordance \
    tables exportable as CSV, TSV, JSON, HTML, or aligned text."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/ccd.toml`. Database, import, and concordance
    /// defaults are read from this file.
    #[arg(long, global = true, default_value = "./config/ccd.toml")]
    config: PathBuf,

    /// Enable debug logging on stderr.
    #[arg(long, global = true)]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file and all required tables (documents,
    /// categories, concordance tables/entries, documents_fts). This command
    /// is idempotent — running it multiple times is safe.
    Init,

    /// Import documents from a directory.
    ///
    /// Walks the directory, filters files through the configured
    /// include/exclude globs, extracts plaintext, and upserts documents
    /// keyed by path. Unchanged files are skipped; files that fail
    /// extraction are logged and skipped without aborting the run.
    Import {
        /// Directory to import. Defaults to `import.root` from the config.
        path: Option<PathBuf>,

        /// Assign every imported document to this category (must exist).
        #[arg(long)]
        category: Option<String>,

        /// Show what would be imported without writing to the database.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of files to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List documents in the corpus.
    List {
        /// Only list documents in this category.
        #[arg(long)]
        category: Option<String>,
    },

    /// Print a document's metadata and full body.
    Get {
        /// Document UUID.
        id: String,
    },

    /// Remove a document from the corpus.
    ///
    /// Concordance tables generated earlier keep their entries; they
    /// snapshot the document id and name at generation time.
    Rm {
        /// Document UUID.
        id: String,
    },

    /// Manage categories and document assignments.
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Keyword search over the document corpus.
    ///
    /// Queries the FTS5 index and prints ranked results with snippets.
    Search {
        /// The search query string (FTS5 syntax).
        query: String,

        /// Only return documents in this category.
        #[arg(long)]
        category: Option<String>,

        /// Only return documents updated on or after this date (YYYY-MM-DD).
        #[arg(long)]
        since: Option<String>,

        /// Maximum number of results to return.
        #[arg(long)]
        limit: Option<i64>,
    },

    /// Generate, inspect, and export concordance tables.
    Concordance {
        #[command(subcommand)]
        action: ConcordanceAction,
    },

    /// Print corpus statistics.
    Stats,
}

/// Category management subcommands.
#[derive(Subcommand)]
enum CategoryAction {
    /// Create a category.
    Add {
        /// Category name (unique).
        name: String,
        /// Optional free-form description.
        #[arg(long)]
        description: Option<String>,
    },
    /// List categories with document counts.
    List,
    /// Delete a category. Documents themselves are untouched.
    Rm {
        /// Category name.
        name: String,
    },
    /// File a document under a category.
    Assign {
        /// Document UUID.
        document_id: String,
        /// Category name.
        category: String,
    },
    /// Remove a document from a category.
    Unassign {
        /// Document UUID.
        document_id: String,
        /// Category name.
        category: String,
    },
}

/// Concordance subcommands.
#[derive(Subcommand)]
enum ConcordanceAction {
    /// Generate a concordance table and save it.
    ///
    /// Scans the given documents (the whole corpus when no --doc is passed)
    /// for every keyword and stores one entry per occurrence with its
    /// context window and line/paragraph position. Matching defaults come
    /// from the `[concordance]` config section; flags override per run.
    Generate {
        /// Name for the new table (unique).
        name: String,

        /// Keyword to scan for. Repeatable.
        #[arg(long = "keyword", required = true)]
        keywords: Vec<String>,

        /// Restrict the scan to this document UUID. Repeatable.
        #[arg(long = "doc")]
        docs: Vec<String>,

        /// Context window size in characters, on each side of the match.
        #[arg(long)]
        window: Option<usize>,

        /// Match case-sensitively.
        #[arg(long)]
        case_sensitive: bool,

        /// Match raw substrings instead of whole words.
        #[arg(long)]
        partial: bool,

        /// Strip punctuation from context strings.
        #[arg(long)]
        no_punctuation: bool,

        /// Entry order: position, keyword, or document.
        #[arg(long)]
        sort: Option<SortOrder>,

        /// Group entries by keyword regardless of sort order.
        #[arg(long)]
        group_by_keyword: bool,

        /// Drop keywords shorter than this many characters.
        #[arg(long)]
        min_length: Option<usize>,

        /// Drop keywords longer than this many characters (0 = unbounded).
        #[arg(long)]
        max_length: Option<usize>,

        /// Tag to attach to the table. Repeatable.
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// List saved concordance tables.
    List,

    /// Print a table as an aligned KWIC listing.
    Show {
        /// Table UUID or name.
        id: String,
    },

    /// Delete a concordance table and its entries.
    Rm {
        /// Table UUID or name.
        id: String,
    },

    /// Export a table to CSV, TSV, JSON, HTML, or aligned text.
    Export {
        /// Table UUID or name.
        id: String,

        /// Output format: csv, tsv, json, html, or txt.
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Write to this file instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Import a table from a JSON export.
    ///
    /// The table is saved under a fresh id with its name, keywords,
    /// entries, settings, and tags preserved.
    Import {
        /// Path to a JSON file produced by `ccd concordance export --format json`.
        path: PathBuf,
    },

    /// Add or remove tags on a table.
    Tag {
        /// Table UUID or name.
        id: String,

        /// Tag to add. Repeatable.
        #[arg(long = "add")]
        add: Vec<String>,

        /// Tag to remove. Repeatable.
        #[arg(long = "remove")]
        remove: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Import {
            path,
            category,
            dry_run,
            limit,
        } => {
            import::run_import(&cfg, path, category, dry_run, limit).await?;
        }
        Commands::List { category } => {
            documents::run_list(&cfg, category).await?;
        }
        Commands::Get { id } => {
            documents::run_get(&cfg, &id).await?;
        }
        Commands::Rm { id } => {
            documents::run_rm(&cfg, &id).await?;
        }
        Commands::Category { action } => match action {
            CategoryAction::Add { name, description } => {
                categories::run_add(&cfg, &name, description).await?;
            }
            CategoryAction::List => {
                categories::run_list(&cfg).await?;
            }
            CategoryAction::Rm { name } => {
                categories::run_rm(&cfg, &name).await?;
            }
            CategoryAction::Assign {
                document_id,
                category,
            } => {
                categories::run_assign(&cfg, &document_id, &category).await?;
            }
            CategoryAction::Unassign {
                document_id,
                category,
            } => {
                categories::run_unassign(&cfg, &document_id, &category).await?;
            }
        },
        Commands::Search {
            query,
            category,
            since,
            limit,
        } => {
            search::run_search(&cfg, &query, category, since, limit).await?;
        }
        Commands::Concordance { action } => match action {
            ConcordanceAction::Generate {
                name,
                keywords,
                docs,
                window,
                case_sensitive,
                partial,
                no_punctuation,
                sort,
                group_by_keyword,
                min_length,
                max_length,
                tags,
            } => {
                let overrides = concordance_cmd::SettingsOverrides {
                    window,
                    case_sensitive,
                    partial,
                    no_punctuation,
                    sort,
                    group_by_keyword,
                    min_length,
                    max_length,
                };
                concordance_cmd::run_generate(&cfg, &name, keywords, docs, overrides, tags).await?;
            }
            ConcordanceAction::List => {
                concordance_cmd::run_list(&cfg).await?;
            }
            ConcordanceAction::Show { id } => {
                concordance_cmd::run_show(&cfg, &id).await?;
            }
            ConcordanceAction::Rm { id } => {
                concordance_cmd::run_rm(&cfg, &id).await?;
            }
            ConcordanceAction::Export { id, format, output } => {
                concordance_cmd::run_export(&cfg, &id, format, output).await?;
            }
            ConcordanceAction::Import { path } => {
                concordance_cmd::run_import(&cfg, &path).await?;
            }
            ConcordanceAction::Tag { id, add, remove } => {
                concordance_cmd::run_tag(&cfg, &id, add, remove).await?;
            }
        },
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
