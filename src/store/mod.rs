//! Vector store access: a backend-neutral trait plus the threshold fallback.

pub mod qdrant;
pub mod supabase;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::{
    Config, StoreConfig, FALLBACK_LIMIT, FALLBACK_THRESHOLD, PRIMARY_LIMIT, PRIMARY_THRESHOLD,
};
use crate::document::{Document, Match};
use crate::error::Result;

pub use qdrant::QdrantStore;
pub use supabase::SupabaseStore;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    /// Minimum similarity for a hit
    pub threshold: f32,
    /// Maximum number of hits
    pub limit: usize,
}

/// One precise attempt, then at most one looser retry when it comes back empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackPolicy {
    pub primary: SearchParams,
    pub fallback: SearchParams,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            primary: SearchParams {
                threshold: PRIMARY_THRESHOLD,
                limit: PRIMARY_LIMIT,
            },
            fallback: SearchParams {
                threshold: FALLBACK_THRESHOLD,
                limit: FALLBACK_LIMIT,
            },
        }
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend name for logs and errors
    fn backend(&self) -> &'static str;

    /// Make sure the collection exists. Safe to call repeatedly and concurrently.
    async fn ensure_collection(&self) -> Result<()>;

    /// Similarity search, hits ordered as the store returns them
    async fn search(&self, vector: &[f32], params: SearchParams) -> Result<Vec<Match>>;

    /// Insert or replace documents with their embeddings
    async fn upsert(&self, docs: &[(Document, Vec<f32>)]) -> Result<()>;
}

/// Result of [`search_with_fallback`]
#[derive(Debug)]
pub struct FallbackOutcome {
    pub matches: Vec<Match>,
    pub used_fallback: bool,
}

/// Run the primary search and, only if it is empty, a single fallback search.
///
/// An empty fallback is a final, successful answer. Errors are never turned
/// into an empty result.
pub async fn search_with_fallback(
    store: &dyn VectorStore,
    vector: &[f32],
    policy: FallbackPolicy,
) -> Result<FallbackOutcome> {
    store.ensure_collection().await?;

    let matches = store.search(vector, policy.primary).await?;
    debug!(
        backend = store.backend(),
        threshold = policy.primary.threshold,
        hits = matches.len(),
        "primary search"
    );
    if !matches.is_empty() {
        return Ok(FallbackOutcome {
            matches,
            used_fallback: false,
        });
    }

    warn!(
        backend = store.backend(),
        threshold = policy.fallback.threshold,
        "no hits above primary threshold, retrying with fallback"
    );
    let matches = store.search(vector, policy.fallback).await?;
    debug!(backend = store.backend(), hits = matches.len(), "fallback search");
    Ok(FallbackOutcome {
        matches,
        used_fallback: true,
    })
}

/// Construct the configured backend
pub fn from_config(config: &Config) -> Result<Arc<dyn VectorStore>> {
    Ok(match &config.store {
        StoreConfig::Supabase(cfg) => Arc::new(SupabaseStore::new(cfg)),
        StoreConfig::Qdrant(cfg) => Arc::new(QdrantStore::new(cfg, config.embedding.dimensions)?),
    })
}
