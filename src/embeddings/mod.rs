pub mod provider;

use async_trait::async_trait;

use crate::error::{Result, SearchError};

pub use provider::OpenAiEmbedder;

/// Text -> vector. Implementations call out to an embedding provider.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed text exactly as given
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, vectors returned in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Embed a user query after normalization
    async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let normalized = normalize_query(query);
        if normalized.is_empty() {
            return Err(SearchError::Provider(
                "Query has no searchable characters".into(),
            ));
        }
        self.embed(&normalized).await
    }

    /// Output vector length
    fn dimensions(&self) -> usize;
}

/// Lower-case, drop punctuation, collapse whitespace.
///
/// Only used for the embedding request; highlighting works on the raw query.
pub fn normalize_query(query: &str) -> String {
    let stripped: String = query
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_and_collapses() {
        assert_eq!(
            normalize_query("  Korupsi   Dana, DESA!!  "),
            "korupsi dana desa"
        );
    }

    #[test]
    fn normalize_keeps_digits_and_underscores() {
        assert_eq!(normalize_query("Pasal 2 ayat (1) UU_31"), "pasal 2 ayat 1 uu_31");
    }

    #[test]
    fn normalize_punctuation_only_is_empty() {
        assert_eq!(normalize_query(" ?! ... "), "");
    }

    #[test]
    fn normalize_keeps_non_ascii_letters() {
        assert_eq!(normalize_query("Straße-Verkehr"), "straßeverkehr");
    }
}
