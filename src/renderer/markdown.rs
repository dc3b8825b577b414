use super::{metadata_rows, snippet_runs};
use crate::document::SearchResult;

/// Render ranked results as markdown, matches in bold
pub fn render_results(query: &str, results: &[SearchResult]) -> String {
    let mut out = String::with_capacity(1024 * results.len().max(1));

    out.push_str(&format!("# Results for \"{}\"\n\n", query));
    if results.is_empty() {
        out.push_str("*No matching documents.*\n");
        return out;
    }

    for (i, result) in results.iter().enumerate() {
        let doc = &result.document;
        out.push_str(&format!("## {}. {}\n\n", i + 1, doc.display_title()));
        out.push_str(&format!(
            "**Category:** {} | **Relevance:** {}% | **Added:** {}\n",
            doc.category.as_str(),
            result.relevance_score,
            doc.date_added.format("%Y-%m-%d")
        ));
        if !doc.tags.is_empty() {
            out.push_str(&format!("**Tags:** {}\n", doc.tags.join(", ")));
        }
        out.push('\n');

        for segment in &result.matched_segments {
            out.push_str("> ");
            for (text, is_match) in snippet_runs(segment) {
                let text = text.replace('\n', " ");
                if is_match {
                    out.push_str(&format!("**{}**", text));
                } else {
                    out.push_str(&text);
                }
            }
            out.push_str("\n\n");
        }

        for (key, value) in metadata_rows(doc) {
            out.push_str(&format!("- **{}:** {}\n", key, value));
        }
        if let Some(url) = doc.download_url() {
            out.push_str(&format!("- [Download]({})\n", url));
        }

        out.push_str("\n---\n\n");
    }

    out
}
