use colored::{ColoredString, Colorize};

use super::{metadata_rows, snippet_runs};
use crate::document::SearchResult;
use crate::snippet::unescape_html;

/// Badge color follows the score: green from 80, yellow from 60, red below
fn score_badge(score: u8) -> ColoredString {
    let label = format!("{}%", score);
    if score >= 80 {
        label.green().bold()
    } else if score >= 60 {
        label.yellow().bold()
    } else {
        label.red().bold()
    }
}

/// Render ranked results for a terminal
pub fn render_results(query: &str, results: &[SearchResult]) -> String {
    let mut out = String::new();

    if results.is_empty() {
        out.push_str(&format!(
            "{} No documents matched '{}'. Try different wording.\n",
            "Search".yellow().bold(),
            query
        ));
        return out;
    }

    out.push_str(&format!(
        "{} {} result(s) for '{}':\n\n",
        "Search".green().bold(),
        results.len(),
        query
    ));

    for (i, result) in results.iter().enumerate() {
        let doc = &result.document;
        out.push_str(&format!(
            "  {} {} [{}] {}\n",
            format!("{}.", i + 1).dimmed(),
            doc.display_title().bold(),
            doc.category.as_str().cyan(),
            score_badge(result.relevance_score)
        ));

        for segment in &result.matched_segments {
            out.push_str("    ");
            for (text, is_match) in snippet_runs(segment) {
                let text = unescape_html(text).replace('\n', " ");
                if is_match {
                    out.push_str(&text.black().on_yellow().to_string());
                } else {
                    out.push_str(&text);
                }
            }
            out.push('\n');
        }

        for (key, value) in metadata_rows(doc) {
            out.push_str(&format!("    {} {}\n", format!("{}:", key).dimmed(), value));
        }
        if let Some(url) = doc.download_url() {
            out.push_str(&format!("    {} {}\n", "File:".dimmed(), url.underline()));
        }
        out.push('\n');
    }

    out
}
