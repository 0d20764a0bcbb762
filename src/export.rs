//! Concordance table serialization.
//!
//! Renders a [`ConcordanceTable`] as CSV, TSV, JSON, HTML, or an aligned
//! plain-text KWIC listing, writing to a file or stdout. The JSON form is
//! the full table and can be re-imported with `ccd concordance import`.

use anyhow::Result;
use std::path::Path;

use crate::models::ConcordanceTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Tsv,
    Json,
    Html,
    Txt,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "tsv" => Ok(ExportFormat::Tsv),
            "json" => Ok(ExportFormat::Json),
            "html" => Ok(ExportFormat::Html),
            "txt" | "text" => Ok(ExportFormat::Txt),
            other => Err(format!(
                "unknown export format: '{}'. Use csv, tsv, json, html, or txt.",
                other
            )),
        }
    }
}

/// Render the table in the requested format.
pub fn render(table: &ConcordanceTable, format: ExportFormat) -> Result<String> {
    Ok(match format {
        ExportFormat::Csv => render_delimited(table, ','),
        ExportFormat::Tsv => render_delimited(table, '\t'),
        ExportFormat::Json => serde_json::to_string_pretty(table)?,
        ExportFormat::Html => render_html(table),
        ExportFormat::Txt => render_txt(table),
    })
}

/// Write rendered output to a file, or stdout when no path is given.
pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, content)?;
            eprintln!("Exported to {}", path.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

const COLUMNS: [&str; 9] = [
    "keyword",
    "matched_text",
    "left_context",
    "right_context",
    "position",
    "line",
    "paragraph",
    "document_id",
    "document_name",
];

fn render_delimited(table: &ConcordanceTable, delimiter: char) -> String {
    let mut out = String::new();
    out.push_str(&COLUMNS.join(&delimiter.to_string()));
    out.push('\n');
    for entry in &table.entries {
        let fields = [
            entry.keyword.clone(),
            entry.matched_text.clone(),
            entry.left_context.clone(),
            entry.right_context.clone(),
            entry.position.to_string(),
            entry.line_number.to_string(),
            entry.paragraph_number.to_string(),
            entry.document_id.clone(),
            entry.document_name.clone(),
        ];
        let row: Vec<String> = fields
            .iter()
            .map(|f| delimited_field(f, delimiter))
            .collect();
        out.push_str(&row.join(&delimiter.to_string()));
        out.push('\n');
    }
    out
}

/// RFC 4180-style quoting: fields containing the delimiter, a quote, or a
/// newline are wrapped in double quotes with inner quotes doubled.
fn delimited_field(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render_html(table: &ConcordanceTable) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n");
    out.push_str(&format!(
        "<meta charset=\"utf-8\">\n<title>{}</title>\n",
        html_escape(&table.name)
    ));
    out.push_str("<style>table { border-collapse: collapse; } td, th { border: 1px solid #999; padding: 2px 8px; } .kw { font-weight: bold; text-align: center; } .left { text-align: right; }</style>\n");
    out.push_str("</head>\n<body>\n");
    out.push_str(&format!("<h1>{}</h1>\n", html_escape(&table.name)));
    out.push_str(&format!(
        "<p>{} entries for keywords: {}</p>\n",
        table.entries.len(),
        html_escape(&table.keywords.join(", "))
    ));
    out.push_str("<table>\n<tr><th>Left</th><th>Keyword</th><th>Right</th><th>Pos</th><th>Line</th><th>Para</th><th>Document</th></tr>\n");
    for entry in &table.entries {
        out.push_str(&format!(
            "<tr><td class=\"left\">{}</td><td class=\"kw\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            html_escape(&entry.left_context),
            html_escape(&entry.matched_text),
            html_escape(&entry.right_context),
            entry.position,
            entry.line_number,
            entry.paragraph_number,
            html_escape(&entry.document_name),
        ));
    }
    out.push_str("</table>\n</body>\n</html>\n");
    out
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Classic aligned KWIC layout: left context right-aligned in a fixed
/// gutter, keyword column, right context.
fn render_txt(table: &ConcordanceTable) -> String {
    let left_width = table
        .entries
        .iter()
        .map(|e| e.left_context.chars().count())
        .max()
        .unwrap_or(0);
    let kw_width = table
        .entries
        .iter()
        .map(|e| e.matched_text.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    out.push_str(&format!("{}\n", table.name));
    out.push_str(&format!(
        "keywords: {}  ({} entries)\n\n",
        table.keywords.join(", "),
        table.entries.len()
    ));
    for entry in &table.entries {
        out.push_str(&format!(
            "{:>lw$}  {:<kw$}  {}    [{} {}:{}]\n",
            entry.left_context,
            entry.matched_text,
            entry.right_context,
            entry.document_name,
            entry.line_number,
            entry.paragraph_number,
            lw = left_width,
            kw = kw_width,
        ));
    }
    out
}
