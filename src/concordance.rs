//! KWIC concordance generation.
//!
//! Scans document plaintext for keyword occurrences and produces
//! context-windowed [`ConcordanceEntry`]s with line and paragraph positions.
//! Matching rules (case sensitivity, whole-word anchoring, window size,
//! punctuation handling) come from [`ConcordanceSettings`].
//!
//! Context windows are measured in characters. A window boundary that lands
//! in the middle of a word drops the partial word, so a window of 10 around
//! `fox` in `The quick brown fox jumps` yields left `brown`, right `jumps`.
//! At document edges the context is truncated, never padded.

use anyhow::{bail, Context, Result};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use uuid::Uuid;

use crate::models::{ConcordanceEntry, ConcordanceSettings, ConcordanceTable, Document, SortOrder};

/// Generate a concordance table over the given documents.
///
/// Keywords are deduplicated and filtered by the configured length bounds
/// before scanning; generation fails if none survive. Every non-overlapping
/// match of a surviving keyword produces exactly one entry. Entries are
/// ordered per the settings before the table is returned.
pub fn generate(
    name: &str,
    keywords: &[String],
    documents: &[Document],
    settings: &ConcordanceSettings,
    tags: Vec<String>,
) -> Result<ConcordanceTable> {
    let kept = filter_keywords(keywords, settings);
    if kept.is_empty() {
        bail!("no keywords left after applying length bounds");
    }

    let created_at = chrono::Utc::now().timestamp();
    let mut entries = Vec::new();
    for doc in documents {
        for keyword in &kept {
            entries.extend(scan_document(doc, keyword, settings, created_at)?);
        }
    }
    apply_ordering(&mut entries, settings);

    Ok(ConcordanceTable {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        keywords: kept,
        document_ids: documents.iter().map(|d| d.id.clone()).collect(),
        entries,
        settings: settings.clone(),
        tags,
        created_at,
    })
}

/// Drop blank keywords, keywords outside the length bounds, and duplicates.
/// Dedup is case-insensitive when matching is, so a keyword list can never
/// produce two entries for the same occurrence.
pub fn filter_keywords(keywords: &[String], settings: &ConcordanceSettings) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for raw in keywords {
        let keyword = raw.trim();
        if keyword.is_empty() {
            continue;
        }
        let len = keyword.chars().count();
        if len < settings.min_keyword_length {
            continue;
        }
        if settings.max_keyword_length != 0 && len > settings.max_keyword_length {
            continue;
        }
        let dedup_key = if settings.case_sensitive {
            keyword.to_string()
        } else {
            keyword.to_lowercase()
        };
        if seen.insert(dedup_key) {
            kept.push(keyword.to_string());
        }
    }
    kept
}

/// Scan one document for one keyword.
pub fn scan_document(
    doc: &Document,
    keyword: &str,
    settings: &ConcordanceSettings,
    created_at: i64,
) -> Result<Vec<ConcordanceEntry>> {
    let pattern = keyword_pattern(keyword, settings)?;
    let index = LineIndex::new(&doc.body);

    let mut entries = Vec::new();
    // Running byte -> char cursor; matches come back in document order, so
    // positions are computed in one pass over the body.
    let mut cursor_byte = 0usize;
    let mut cursor_char = 0usize;
    for m in pattern.find_iter(&doc.body) {
        cursor_char += doc.body[cursor_byte..m.start()].chars().count();
        cursor_byte = m.start();

        let (line_number, paragraph_number) = index.locate(m.start());
        let mut left = left_context(&doc.body, m.start(), settings.context_window).to_string();
        let mut right = right_context(&doc.body, m.end(), settings.context_window).to_string();
        if !settings.include_punctuation {
            left = strip_punctuation(&left);
            right = strip_punctuation(&right);
        }

        entries.push(ConcordanceEntry {
            keyword: keyword.to_string(),
            matched_text: m.as_str().to_string(),
            left_context: left,
            right_context: right,
            position: cursor_char,
            line_number,
            paragraph_number,
            document_id: doc.id.clone(),
            document_name: doc.name.clone(),
            created_at,
        });
    }
    Ok(entries)
}

/// Sort entries in place per the configured order. The ordering is total:
/// ties fall through to document id and position, so output is
/// deterministic across runs.
pub fn apply_ordering(entries: &mut [ConcordanceEntry], settings: &ConcordanceSettings) {
    let keyword_first = settings.group_by_keyword || settings.sort_order == SortOrder::Keyword;
    entries.sort_by(|a, b| {
        let primary = if keyword_first {
            a.keyword
                .cmp(&b.keyword)
                .then_with(|| a.document_name.cmp(&b.document_name))
        } else {
            match settings.sort_order {
                SortOrder::Document => a
                    .document_name
                    .cmp(&b.document_name)
                    .then_with(|| a.keyword.cmp(&b.keyword)),
                // Position (and Keyword, handled above)
                _ => a.document_name.cmp(&b.document_name),
            }
        };
        primary
            .then_with(|| a.document_id.cmp(&b.document_id))
            .then_with(|| a.position.cmp(&b.position))
            .then_with(|| a.keyword.cmp(&b.keyword))
    });
}

fn keyword_pattern(keyword: &str, settings: &ConcordanceSettings) -> Result<Regex> {
    let escaped = regex::escape(keyword);
    let pattern = if settings.whole_word {
        format!(r"\b{}\b", escaped)
    } else {
        escaped
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!settings.case_sensitive)
        .build()
        .with_context(|| format!("invalid match pattern for keyword '{}'", keyword))
}

/// The `window` chars preceding the match, trimmed to a word boundary.
fn left_context(text: &str, match_start: usize, window: usize) -> &str {
    let mut w_start = match_start;
    let mut taken = 0usize;
    while taken < window {
        match text[..w_start].chars().next_back() {
            Some(c) => {
                w_start -= c.len_utf8();
                taken += 1;
            }
            None => break,
        }
    }
    let mut raw = &text[w_start..match_start];
    if w_start > 0 {
        let cut_mid_word = !text[..w_start]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_whitespace())
            && !raw.chars().next().is_some_and(|c| c.is_whitespace());
        if cut_mid_word {
            raw = match raw.find(char::is_whitespace) {
                Some(i) => &raw[i..],
                None => "",
            };
        }
    }
    raw.trim()
}

/// The `window` chars following the match, trimmed to a word boundary.
fn right_context(text: &str, match_end: usize, window: usize) -> &str {
    let mut w_end = match_end;
    let mut taken = 0usize;
    let mut chars = text[match_end..].chars();
    while taken < window {
        match chars.next() {
            Some(c) => {
                w_end += c.len_utf8();
                taken += 1;
            }
            None => break,
        }
    }
    let mut raw = &text[match_end..w_end];
    if w_end < text.len() {
        let cut_mid_word = !text[w_end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_whitespace())
            && !raw.chars().next_back().is_some_and(|c| c.is_whitespace());
        if cut_mid_word {
            raw = match raw.rfind(char::is_whitespace) {
                Some(i) => &raw[..i],
                None => "",
            };
        }
    }
    raw.trim()
}

fn strip_punctuation(s: &str) -> String {
    let filtered: String = s.chars().filter(|c| !c.is_ascii_punctuation()).collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Byte-offset line index over a document body. Lines are `\n`-delimited;
/// paragraphs are maximal runs of non-blank lines.
struct LineIndex {
    line_starts: Vec<usize>,
    line_paragraphs: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut line_starts = vec![0usize];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }

        let mut line_paragraphs = Vec::with_capacity(line_starts.len());
        let mut paragraph = 0usize;
        let mut in_paragraph = false;
        for (idx, &start) in line_starts.iter().enumerate() {
            let end = match line_starts.get(idx + 1) {
                Some(&next) => next - 1, // exclude the newline byte
                None => text.len(),
            };
            if text[start..end].trim().is_empty() {
                in_paragraph = false;
            } else if !in_paragraph {
                paragraph += 1;
                in_paragraph = true;
            }
            line_paragraphs.push(paragraph.max(1));
        }

        Self {
            line_starts,
            line_paragraphs,
        }
    }

    /// (line, paragraph) for a byte offset, both 1-based.
    fn locate(&self, byte_pos: usize) -> (usize, usize) {
        let line = self.line_starts.partition_point(|&s| s <= byte_pos);
        (line, self.line_paragraphs[line - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        Document {
            id: "d1".to_string(),
            name: "doc-one".to_string(),
            path: "/tmp/doc-one.txt".to_string(),
            content_type: "text/plain".to_string(),
            body: body.to_string(),
            word_count: body.split_whitespace().count() as i64,
            byte_size: body.len() as i64,
            sha256: String::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    fn settings() -> ConcordanceSettings {
        ConcordanceSettings::default()
    }

    #[test]
    fn context_window_trims_partial_words() {
        let d = doc("The quick brown fox jumps");
        let mut s = settings();
        s.context_window = 10;
        let entries = scan_document(&d, "fox", &s, 0).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].left_context, "brown");
        assert_eq!(entries[0].right_context, "jumps");
    }

    #[test]
    fn window_at_word_start_keeps_whole_word() {
        // 5 chars left of "gamma" is exactly "beta " — no partial word to drop
        let d = doc("alpha beta gamma");
        let mut s = settings();
        s.context_window = 5;
        let entries = scan_document(&d, "gamma", &s, 0).unwrap();
        assert_eq!(entries[0].left_context, "beta");
    }

    #[test]
    fn match_at_document_start_has_empty_left_context() {
        let d = doc("fox jumps over the fence");
        let entries = scan_document(&d, "fox", &settings(), 0).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].position, 0);
        assert_eq!(entries[0].left_context, "");
        assert!(!entries[0].right_context.is_empty());
    }

    #[test]
    fn match_at_document_end_has_empty_right_context() {
        let d = doc("the quick brown fox");
        let entries = scan_document(&d, "fox", &settings(), 0).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].right_context, "");
    }

    #[test]
    fn every_occurrence_yields_exactly_one_entry() {
        let d = doc("fox and fox and fox");
        let entries = scan_document(&d, "fox", &settings(), 0).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].position, 0);
        assert_eq!(entries[1].position, 8);
        assert_eq!(entries[2].position, 16);
    }

    #[test]
    fn case_insensitive_preserves_matched_text() {
        let d = doc("Fox chased the fox");
        let entries = scan_document(&d, "fox", &settings(), 0).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].matched_text, "Fox");
        assert_eq!(entries[1].matched_text, "fox");
        assert_eq!(entries[0].keyword, "fox");
    }

    #[test]
    fn case_sensitive_skips_other_cases() {
        let d = doc("Fox chased the fox");
        let mut s = settings();
        s.case_sensitive = true;
        let entries = scan_document(&d, "fox", &s, 0).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].matched_text, "fox");
    }

    #[test]
    fn whole_word_rejects_substrings() {
        let d = doc("the foxes and the fox");
        let entries = scan_document(&d, "fox", &settings(), 0).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].position, 18);
    }

    #[test]
    fn partial_matching_finds_substrings() {
        let d = doc("concatenate the cat");
        let mut s = settings();
        s.whole_word = false;
        let entries = scan_document(&d, "cat", &s, 0).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].position, 3);
    }

    #[test]
    fn line_and_paragraph_numbers() {
        let d = doc("first line\nsecond line with fox\n\nnew paragraph\nwith fox again");
        let entries = scan_document(&d, "fox", &settings(), 0).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].line_number, 2);
        assert_eq!(entries[0].paragraph_number, 1);
        assert_eq!(entries[1].line_number, 5);
        assert_eq!(entries[1].paragraph_number, 2);
    }

    #[test]
    fn document_without_blank_lines_is_one_paragraph() {
        let d = doc("one\ntwo\nthree fox");
        let entries = scan_document(&d, "fox", &settings(), 0).unwrap();
        assert_eq!(entries[0].paragraph_number, 1);
    }

    #[test]
    fn punctuation_stripping() {
        let d = doc("well, the fox (quickly) ran.");
        let mut s = settings();
        s.include_punctuation = false;
        let entries = scan_document(&d, "fox", &s, 0).unwrap();
        assert_eq!(entries[0].left_context, "well the");
        assert_eq!(entries[0].right_context, "quickly ran");
    }

    #[test]
    fn positions_are_char_offsets() {
        // "über" is 5 bytes but 4 chars; the match position must count chars
        let d = doc("über den fox");
        let entries = scan_document(&d, "fox", &settings(), 0).unwrap();
        assert_eq!(entries[0].position, 9);
    }

    #[test]
    fn regex_metacharacters_in_keywords_are_literal() {
        let d = doc("cost is 3.50 here");
        let mut s = settings();
        s.whole_word = false;
        let entries = scan_document(&d, "3.50", &s, 0).unwrap();
        assert_eq!(entries.len(), 1);
        // A dot treated as regex "any" would also match "3x50"
        let d2 = doc("cost is 3x50 here");
        assert!(scan_document(&d2, "3.50", &s, 0).unwrap().is_empty());
    }

    #[test]
    fn filter_keywords_applies_bounds_and_dedup() {
        let mut s = settings();
        s.min_keyword_length = 3;
        s.max_keyword_length = 5;
        let keywords = vec![
            "fox".to_string(),
            "FOX".to_string(),
            "ox".to_string(),
            "elephant".to_string(),
            "  wolf ".to_string(),
            "".to_string(),
        ];
        let kept = filter_keywords(&keywords, &s);
        assert_eq!(kept, vec!["fox".to_string(), "wolf".to_string()]);
    }

    #[test]
    fn case_sensitive_dedup_keeps_distinct_cases() {
        let mut s = settings();
        s.case_sensitive = true;
        let keywords = vec!["fox".to_string(), "Fox".to_string()];
        assert_eq!(filter_keywords(&keywords, &s).len(), 2);
    }

    #[test]
    fn generate_fails_when_no_keyword_survives() {
        let mut s = settings();
        s.min_keyword_length = 10;
        let err = generate("t", &["fox".to_string()], &[doc("fox")], &s, Vec::new()).unwrap_err();
        assert!(err.to_string().contains("no keywords"));
    }

    #[test]
    fn generate_records_inputs_and_orders_entries() {
        let mut d2 = doc("a fox met a badger");
        d2.id = "d2".to_string();
        d2.name = "doc-two".to_string();
        let docs = vec![doc("badger badger fox"), d2];
        let keywords = vec!["badger".to_string(), "fox".to_string()];
        let table = generate("animals", &keywords, &docs, &settings(), Vec::new()).unwrap();
        assert_eq!(table.keywords, keywords);
        assert_eq!(table.document_ids, vec!["d1".to_string(), "d2".to_string()]);
        assert_eq!(table.entries.len(), 5);
        // position order: doc-one entries (by position) before doc-two's
        assert!(table
            .entries
            .windows(2)
            .all(|w| (w[0].document_name.as_str(), w[0].position)
                <= (w[1].document_name.as_str(), w[1].position)));
    }

    #[test]
    fn keyword_sort_groups_by_keyword() {
        let d = doc("fox badger fox badger");
        let mut s = settings();
        s.sort_order = SortOrder::Keyword;
        let table = generate(
            "t",
            &["fox".to_string(), "badger".to_string()],
            &[d],
            &s,
            Vec::new(),
        )
        .unwrap();
        let keywords: Vec<&str> = table.entries.iter().map(|e| e.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["badger", "badger", "fox", "fox"]);
    }

    #[test]
    fn group_by_keyword_overrides_position_order() {
        let d = doc("fox badger fox");
        let mut s = settings();
        s.group_by_keyword = true;
        let table = generate(
            "t",
            &["fox".to_string(), "badger".to_string()],
            &[d],
            &s,
            Vec::new(),
        )
        .unwrap();
        let keywords: Vec<&str> = table.entries.iter().map(|e| e.keyword.as_str()).collect();
        assert_eq!(keywords, vec!["badger", "fox", "fox"]);
    }

    #[test]
    fn empty_document_yields_no_entries() {
        let entries = scan_document(&doc(""), "fox", &settings(), 0).unwrap();
        assert!(entries.is_empty());
    }
}
