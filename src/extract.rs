//! Plaintext extraction for imported files.
//!
//! The import pipeline hands this module raw bytes plus the source path; it
//! returns UTF-8 text ready for indexing and concordance scanning. Line
//! structure is preserved where the format has one (DOCX paragraphs and HTML
//! block elements become newlines) so that line and paragraph numbers in
//! concordance entries stay meaningful.

use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Maximum decompressed bytes read from a single archive entry.
const MAX_ARCHIVE_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction failure. The importer logs these and skips the file; they
/// never abort a run.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("HTML extraction failed: {0}")]
    Html(String),
}

/// File formats the importer understands, keyed on file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Html,
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detect the format from the file extension. Returns `None` for
    /// extensions the importer does not handle.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "txt" | "text" => Some(DocumentFormat::PlainText),
            "md" | "markdown" => Some(DocumentFormat::Markdown),
            "html" | "htm" => Some(DocumentFormat::Html),
            "pdf" => Some(DocumentFormat::Pdf),
            "docx" => Some(DocumentFormat::Docx),
            _ => None,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "text/plain",
            DocumentFormat::Markdown => "text/markdown",
            DocumentFormat::Html => "text/html",
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}

/// Extracts plain text from file content.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
    match format {
        DocumentFormat::PlainText | DocumentFormat::Markdown => {
            Ok(String::from_utf8_lossy(bytes).into_owned())
        }
        DocumentFormat::Html => extract_html(bytes),
        DocumentFormat::Pdf => extract_pdf(bytes),
        DocumentFormat::Docx => extract_docx(bytes),
    }
}

/// Convenience wrapper: detect the format from the path, then extract.
pub fn extract_from_path(path: &Path, bytes: &[u8]) -> Result<(DocumentFormat, String), ExtractError> {
    let format = DocumentFormat::from_path(path).ok_or_else(|| {
        ExtractError::UnsupportedExtension(
            path.extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_else(|| "(none)".to_string()),
        )
    })?;
    let text = extract_text(bytes, format)?;
    Ok((format, text))
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

/// Strip markup from an HTML page, keeping text content. Script and style
/// bodies are dropped; block-level boundaries become newlines.
fn extract_html(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);
    // HTML in the wild is not well-formed XML; tolerate mismatched end tags.
    reader.config_mut().check_end_names = false;
    let mut buf = Vec::new();
    let mut skip_depth = 0usize;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                let name = e.local_name();
                if matches!(name.as_ref(), b"script" | b"style") {
                    skip_depth += 1;
                } else if name.as_ref() == b"br" {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Empty(e)) => {
                if e.local_name().as_ref() == b"br" {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                let name = e.local_name();
                if matches!(name.as_ref(), b"script" | b"style") {
                    skip_depth = skip_depth.saturating_sub(1);
                } else if is_block_element(name.as_ref()) && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if skip_depth == 0 => {
                let text = te
                    .unescape()
                    .map(|c| c.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(te.as_ref()).into_owned());
                if !text.is_empty() {
                    if !out.is_empty() && !out.ends_with(char::is_whitespace) {
                        out.push(' ');
                    }
                    out.push_str(&text);
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Html(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim().to_string())
}

fn is_block_element(name: &[u8]) -> bool {
    matches!(
        name,
        b"p" | b"div"
            | b"li"
            | b"tr"
            | b"h1"
            | b"h2"
            | b"h3"
            | b"h4"
            | b"h5"
            | b"h6"
            | b"blockquote"
            | b"pre"
    )
}

/// Pull the `<w:t>` text runs out of `word/document.xml`, turning paragraph
/// ends (`</w:p>`) into newlines.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let doc_xml = {
        let entry = archive
            .by_name("word/document.xml")
            .map_err(|_| ExtractError::Docx("word/document.xml not found".to_string()))?;
        let mut xml = Vec::new();
        entry
            .take(MAX_ARCHIVE_ENTRY_BYTES)
            .read_to_end(&mut xml)
            .map_err(|e| ExtractError::Docx(e.to_string()))?;
        if xml.len() as u64 >= MAX_ARCHIVE_ENTRY_BYTES {
            return Err(ExtractError::Docx(
                "word/document.xml exceeds size limit".to_string(),
            ));
        }
        xml
    };

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(doc_xml.as_slice());
    let mut buf = Vec::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = true;
                }
            }
            Ok(quick_xml::events::Event::Text(te)) if in_text_run => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => {
                let name = e.local_name();
                if name.as_ref() == b"t" {
                    in_text_run = false;
                } else if name.as_ref() == b"p" {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim_end().to_string())
}
