//! # Concord
//!
//! A local-first document corpus manager and KWIC concordance generator.
//!
//! Concord imports documents from the filesystem (plain text, Markdown,
//! HTML, PDF, DOCX), extracts their plaintext into SQLite, and generates
//! Key-Word-In-Context concordance tables: every keyword occurrence with its
//! surrounding context, line and paragraph position, exportable as CSV, TSV,
//! JSON, HTML, or aligned text.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────┐
//! │ Filesystem  │──▶│   Import      │──▶│  SQLite   │
//! │ txt/md/html │   │ Extract+Hash │   │ FTS5      │
//! │ pdf/docx    │   └──────────────┘   └────┬─────┘
//! └─────────────┘                           │
//!                          ┌────────────────┤
//!                          ▼                ▼
//!                    ┌──────────┐    ┌────────────┐
//!                    │  Search  │    │ Concordance │
//!                    │  (FTS5)  │    │ KWIC scan   │
//!                    └──────────┘    └─────┬──────┘
//!                                          ▼
//!                                 CSV/TSV/JSON/HTML/TXT
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! ccd init                          # create database
//! ccd import ./corpus               # ingest local files
//! ccd search "deployment"           # browse the corpus
//! ccd concordance generate nouns --keyword fox --keyword badger
//! ccd concordance export nouns --format csv --output nouns.csv
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | Plaintext extraction (txt, md, html, pdf, docx) |
//! | [`import`] | Filesystem import pipeline |
//! | [`documents`] | Document retrieval and removal |
//! | [`categories`] | Category management |
//! | [`search`] | FTS5 keyword search |
//! | [`concordance`] | KWIC concordance generation |
//! | [`table_store`] | Concordance table persistence |
//! | [`export`] | Concordance serialization |
//! | [`stats`] | Corpus statistics |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod categories;
pub mod concordance;
pub mod concordance_cmd;
pub mod config;
pub mod db;
pub mod documents;
pub mod export;
pub mod extract;
pub mod import;
pub mod migrate;
pub mod models;
pub mod search;
pub mod stats;
pub mod table_store;
