//! Snippet selection and highlighting.
//!
//! A fixed-width window slides over the document; the window holding the most
//! query-term occurrences becomes the snippet, and every term occurrence in it
//! is wrapped in a highlight marker. Positions and widths count characters,
//! not bytes.
//!
//! Snippets are HTML: document text is escaped, so the only tags in a snippet
//! are the highlight markers.

use regex::{Regex, RegexBuilder};

use crate::config::{SNIPPET_STEP, SNIPPET_WINDOW};

pub const MARK_OPEN: &str = "<mark>";
pub const MARK_CLOSE: &str = "</mark>";
/// Appended when the window stops before the end of the document
pub const CONTINUATION: &str = "...";

/// Terms of this many characters or fewer are ignored
const MIN_TERM_CHARS: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct SnippetExtractor {
    window: usize,
    step: usize,
}

impl Default for SnippetExtractor {
    fn default() -> Self {
        Self::new(SNIPPET_WINDOW, SNIPPET_STEP)
    }
}

impl SnippetExtractor {
    pub fn new(window: usize, step: usize) -> Self {
        Self {
            window: window.max(1),
            step: step.max(1),
        }
    }

    /// Best window of `content` for `query`, highlighted. Always one snippet.
    pub fn extract(&self, content: &str, query: &str) -> Vec<String> {
        let terms = query_terms(query);
        let matchers: Vec<Regex> = terms.iter().filter_map(|t| literal_matcher(t)).collect();

        // Byte offset of every char boundary, plus the end of the string
        let bounds: Vec<usize> = content
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(content.len()))
            .collect();
        let char_len = bounds.len() - 1;
        let slice = |start: usize| {
            let end = (start + self.window).min(char_len);
            &content[bounds[start]..bounds[end]]
        };

        let mut best_pos = 0;
        let mut best_score = 0;
        let mut pos = 0;
        while pos + self.window < char_len {
            let window = slice(pos);
            let score: usize = matchers.iter().map(|re| re.find_iter(window).count()).sum();
            if score > best_score {
                best_score = score;
                best_pos = pos;
            }
            pos += self.step;
        }

        let mut snippet = highlight(slice(best_pos), &terms);
        if best_pos + self.window < char_len {
            snippet.push_str(CONTINUATION);
        }
        vec![snippet]
    }
}

/// Lower-cased, de-duplicated query terms longer than two characters
pub fn query_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for term in query.split_whitespace().map(str::to_lowercase) {
        if term.chars().count() > MIN_TERM_CHARS && !terms.contains(&term) {
            terms.push(term);
        }
    }
    terms
}

fn literal_matcher(term: &str) -> Option<Regex> {
    RegexBuilder::new(&regex::escape(term))
        .case_insensitive(true)
        .build()
        .ok()
}

/// Escape `text` and wrap every case-insensitive occurrence of any term in
/// `<mark>` tags.
///
/// A single alternation pass (longest terms first) means overlapping terms
/// never nest markers and marker text is never matched again. Terms match the
/// raw text; only the output is escaped.
pub fn highlight(text: &str, terms: &[String]) -> String {
    let Some(re) = alternation(terms) else {
        return escape_html(text);
    };

    let mut out = String::with_capacity(text.len() + 32);
    let mut last = 0;
    for m in re.find_iter(text) {
        out.push_str(&escape_html(&text[last..m.start()]));
        out.push_str(MARK_OPEN);
        out.push_str(&escape_html(m.as_str()));
        out.push_str(MARK_CLOSE);
        last = m.end();
    }
    out.push_str(&escape_html(&text[last..]));
    out
}

fn alternation(terms: &[String]) -> Option<Regex> {
    if terms.is_empty() {
        return None;
    }
    let mut sorted: Vec<&String> = terms.iter().collect();
    sorted.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    let pattern = sorted
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&pattern).case_insensitive(true).build().ok()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape_html`], for plain-text output
pub fn unescape_html(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Convenience wrapper with the default window and step
pub fn extract(content: &str, query: &str) -> Vec<String> {
    SnippetExtractor::default().extract(content, query)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERDICT: &str =
        "The court found the defendant guilty under Article 5. The defendant appealed.";

    #[test]
    fn short_content_is_returned_whole() {
        let snippets = extract(VERDICT, "defendant appeal");
        assert_eq!(snippets.len(), 1);
        assert_eq!(
            snippets[0],
            "The court found the <mark>defendant</mark> guilty under Article 5. \
             The <mark>defendant</mark> <mark>appeal</mark>ed."
        );
    }

    #[test]
    fn short_terms_are_ignored() {
        assert_eq!(query_terms("of the UU no 31"), vec!["the".to_string()]);
        let snippets = extract("an ox at bay", "an ox");
        assert_eq!(snippets, vec!["an ox at bay".to_string()]);
    }

    #[test]
    fn terms_are_lowercased_and_deduplicated() {
        assert_eq!(
            query_terms("Korupsi korupsi DANA"),
            vec!["korupsi".to_string(), "dana".to_string()]
        );
    }

    #[test]
    fn best_window_wins() {
        let filler = "lorem ipsum dolor sit amet ".repeat(20); // 540 chars
        let content = format!("{}bribery bribery bribery{}", filler, filler);
        let snippets = SnippetExtractor::new(100, 50).extract(&content, "bribery");
        assert_eq!(snippets.len(), 1);
        assert_eq!(snippets[0].matches("<mark>bribery</mark>").count(), 3);
    }

    #[test]
    fn no_match_falls_back_to_start() {
        let content = "a".repeat(1000);
        let snippets = SnippetExtractor::new(300, 50).extract(&content, "zzz");
        assert_eq!(snippets[0], format!("{}...", "a".repeat(300)));
    }

    #[test]
    fn ties_keep_earliest_window() {
        // Two separated single hits; both windows score 1.
        let content = format!("match{}match{}", "x".repeat(195), "y".repeat(400));
        let snippets = SnippetExtractor::new(100, 50).extract(&content, "match");
        assert!(snippets[0].starts_with("<mark>match</mark>"));
    }

    #[test]
    fn window_is_cut_from_original_case() {
        let content = format!("{}FRAUD Case{}", "z".repeat(400), "z".repeat(100));
        let snippets = SnippetExtractor::new(50, 50).extract(&content, "fraud");
        assert!(snippets[0].contains("<mark>FRAUD</mark> Case"));
    }

    #[test]
    fn highlight_is_single_pass_per_occurrence() {
        let text = "Defendant DEFENDANT defendant";
        let out = highlight(text, &["defendant".to_string()]);
        assert_eq!(out.matches(MARK_OPEN).count(), 3);
        assert_eq!(out.matches(MARK_CLOSE).count(), 3);
        assert!(!out.contains("<mark><mark>"));
    }

    #[test]
    fn overlapping_terms_do_not_nest_markers() {
        let out = highlight("the defendant", &["def".to_string(), "defendant".to_string()]);
        assert_eq!(out, "the <mark>defendant</mark>");
    }

    #[test]
    fn term_matching_marker_text_is_harmless() {
        let out = highlight("mark the markdown", &["mark".to_string()]);
        assert_eq!(out, "<mark>mark</mark> the <mark>mark</mark>down");
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        let content = "abbbc and a.b*c appear here";
        let snippets = extract(content, "a.b*c");
        assert_eq!(snippets[0], "abbbc and <mark>a.b*c</mark> appear here");
    }

    #[test]
    fn multibyte_content_is_sliced_on_char_boundaries() {
        let content = format!("{}é suap é{}", "ü".repeat(320), "ö".repeat(320));
        let snippets = SnippetExtractor::new(100, 50).extract(&content, "suap");
        assert!(snippets[0].contains("<mark>suap</mark>"));
        assert!(snippets[0].ends_with(CONTINUATION));
        assert_eq!(
            snippets[0]
                .trim_end_matches(CONTINUATION)
                .replace(MARK_OPEN, "")
                .replace(MARK_CLOSE, "")
                .chars()
                .count(),
            100
        );
    }

    #[test]
    fn content_filling_one_window_has_no_continuation() {
        let content = format!("{}bribery", "x".repeat(93));
        let snippets = SnippetExtractor::new(100, 50).extract(&content, "bribery");
        assert!(snippets[0].ends_with("<mark>bribery</mark>"), "{}", snippets[0]);
    }

    #[test]
    fn window_cut_mid_document_gets_continuation() {
        let content = format!("bribery{}", "x".repeat(500));
        let snippets = SnippetExtractor::new(100, 50).extract(&content, "bribery");
        assert!(snippets[0].starts_with("<mark>bribery</mark>"));
        assert!(snippets[0].ends_with(CONTINUATION));
    }

    #[test]
    fn document_markup_is_escaped() {
        let content = "Pasal <mark>5</mark> & <b>suap</b> > denda";
        let snippets = extract(content, "suap");
        assert_eq!(
            snippets[0],
            "Pasal &lt;mark&gt;5&lt;/mark&gt; &amp; &lt;b&gt;<mark>suap</mark>&lt;/b&gt; &gt; denda"
        );
        assert_eq!(snippets[0].matches(MARK_OPEN).count(), 1);
    }

    #[test]
    fn terms_with_markup_characters_still_match() {
        let out = highlight("PT A&B Tbk", &["a&b".to_string()]);
        assert_eq!(out, "PT <mark>A&amp;B</mark> Tbk");
        assert_eq!(unescape_html("&lt;b&gt; &amp;amp;"), "<b> &amp;");
    }

    #[test]
    fn empty_content_yields_empty_snippet() {
        assert_eq!(extract("", "anything"), vec![String::new()]);
    }
}
