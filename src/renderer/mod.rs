pub mod markdown;
pub mod terminal;

use crate::document::{format_metadata_key, Document};
use crate::snippet::{MARK_CLOSE, MARK_OPEN};

/// Metadata values longer than this are cut for display
pub const METADATA_PREVIEW_CHARS: usize = 200;

/// Metadata rows worth showing: non-empty, not the file link, keys title-cased
pub fn metadata_rows(doc: &Document) -> Vec<(String, String)> {
    doc.metadata
        .iter()
        .filter(|(key, _)| key.as_str() != "file_url")
        .filter_map(|(key, value)| {
            value
                .display()
                .map(|v| (format_metadata_key(key), preview(&v, METADATA_PREVIEW_CHARS)))
        })
        .collect()
}

/// First `max_chars` characters, with an ellipsis when cut
pub fn preview(text: &str, max_chars: usize) -> String {
    let cleaned = text.replace('\n', " ");
    let cleaned = cleaned.trim();
    match cleaned.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &cleaned[..cut]),
        None => cleaned.to_string(),
    }
}

/// Split a highlighted snippet into `(text, is_match)` runs. Run text is still
/// HTML-escaped.
pub fn snippet_runs(snippet: &str) -> Vec<(&str, bool)> {
    let mut runs = Vec::new();
    let mut rest = snippet;
    while let Some(start) = rest.find(MARK_OPEN) {
        if start > 0 {
            runs.push((&rest[..start], false));
        }
        let after = &rest[start + MARK_OPEN.len()..];
        match after.find(MARK_CLOSE) {
            Some(end) => {
                runs.push((&after[..end], true));
                rest = &after[end + MARK_CLOSE.len()..];
            }
            None => {
                runs.push((after, true));
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        runs.push((rest, false));
    }
    runs
}
