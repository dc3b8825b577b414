use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::document::SearchResult;
use crate::embeddings::{Embedder, OpenAiEmbedder};
use crate::error::Result;
use crate::rank;
use crate::snippet::SnippetExtractor;
use crate::store::{self, search_with_fallback, FallbackPolicy, VectorStore};

/// query -> embedding -> similarity search (with fallback) -> rank -> snippets
///
/// Holds its collaborators explicitly so one instance can be shared across
/// requests; the store handle initializes its collection lazily.
#[derive(Clone)]
pub struct SearchPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    policy: FallbackPolicy,
    snippets: SnippetExtractor,
}

impl SearchPipeline {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            policy: FallbackPolicy::default(),
            snippets: SnippetExtractor::default(),
        }
    }

    /// Wire up the OpenAI embedder and the configured store
    pub fn from_config(config: &Config) -> Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(&config.embedding));
        let store = store::from_config(config)?;
        Ok(Self::new(embedder, store))
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_snippets(mut self, snippets: SnippetExtractor) -> Self {
        self.snippets = snippets;
        self
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Ranked, highlighted results for `query`.
    ///
    /// Blank queries return an empty list without calling the embedder or the
    /// store. Zero matches after the fallback is also an empty list.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        if query.trim().is_empty() {
            debug!("blank query, skipping search");
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed_query(query).await?;
        debug!(dimensions = vector.len(), "query embedded");

        let outcome = search_with_fallback(self.store.as_ref(), &vector, self.policy).await?;
        let hits = outcome.matches.len();

        let snippets = self.snippets;
        let results = rank::rank(outcome.matches, |doc| snippets.extract(&doc.content, query));

        info!(
            backend = self.store.backend(),
            query_len = query.len(),
            hits,
            fallback = outcome.used_fallback,
            results = results.len(),
            "search complete"
        );
        Ok(results)
    }
}
