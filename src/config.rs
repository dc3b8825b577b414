use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SearchError};

/// Maximum number of results returned for one query
pub const RESULT_LIMIT: usize = 5;
/// Snippet window width, in characters
pub const SNIPPET_WINDOW: usize = 300;
/// Distance between consecutive snippet windows, in characters
pub const SNIPPET_STEP: usize = 50;
/// Precision-first similarity search
pub const PRIMARY_THRESHOLD: f32 = 0.6;
pub const PRIMARY_LIMIT: usize = 10;
/// Recall-first retry used only when the primary search is empty
pub const FALLBACK_THRESHOLD: f32 = 0.4;
pub const FALLBACK_LIMIT: usize = 5;
/// Embedding input cap used when indexing documents
pub const MAX_EMBED_CHARS: usize = 6000;

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
pub const DEFAULT_COLLECTION: &str = "legal_documents";
pub const DEFAULT_MATCH_FUNCTION: &str = "match_documents";
pub const DEFAULT_TABLE: &str = "documents";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Backend {
    Supabase,
    Qdrant,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Supabase => write!(f, "supabase"),
            Backend::Qdrant => write!(f, "qdrant"),
        }
    }
}

impl FromStr for Backend {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "supabase" => Ok(Backend::Supabase),
            "qdrant" => Ok(Backend::Qdrant),
            other => Err(SearchError::Config(format!(
                "Unknown backend '{}' (expected supabase or qdrant)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    /// Postgres function called through `/rest/v1/rpc/`
    pub match_function: String,
    pub table: String,
}

#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
}

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Supabase(SupabaseConfig),
    Qdrant(QdrantConfig),
}

impl StoreConfig {
    pub fn backend(&self) -> Backend {
        match self {
            StoreConfig::Supabase(_) => Backend::Supabase,
            StoreConfig::Qdrant(_) => Backend::Qdrant,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
    /// Port for `lexsearch serve` when no address is given
    pub port: u16,
}

impl Config {
    /// Load from the process environment
    pub fn from_env(backend_override: Option<Backend>) -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), backend_override)
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F, backend_override: Option<Backend>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| SearchError::Config(format!("Missing {} environment variable", key)))
        };

        let base_url = get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string());
        validate_url("OPENAI_BASE_URL", &base_url)?;

        let dimensions = match get("EMBEDDING_DIMENSIONS") {
            Some(raw) => raw
                .parse::<usize>()
                .ok()
                .filter(|d| *d > 0)
                .ok_or_else(|| {
                    SearchError::Config(format!(
                        "EMBEDDING_DIMENSIONS must be a positive integer, got '{}'",
                        raw
                    ))
                })?,
            None => DEFAULT_EMBEDDING_DIMENSIONS,
        };

        let embedding = EmbeddingConfig {
            api_key: require("OPENAI_API_KEY")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: get("EMBEDDING_MODEL").unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
            dimensions,
        };

        let backend = match backend_override {
            Some(b) => b,
            None => match get("LEXSEARCH_BACKEND") {
                Some(name) => name.parse()?,
                None if get("QDRANT_URL").is_some() => Backend::Qdrant,
                None => Backend::Supabase,
            },
        };

        let store = match backend {
            Backend::Supabase => {
                let url = require("SUPABASE_URL")?;
                validate_url("SUPABASE_URL", &url)?;
                StoreConfig::Supabase(SupabaseConfig {
                    url: url.trim_end_matches('/').to_string(),
                    anon_key: require("SUPABASE_ANON_KEY")?,
                    match_function: get("SUPABASE_MATCH_FUNCTION")
                        .unwrap_or_else(|| DEFAULT_MATCH_FUNCTION.to_string()),
                    table: get("SUPABASE_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
                })
            }
            Backend::Qdrant => {
                let url = require("QDRANT_URL")?;
                validate_url("QDRANT_URL", &url)?;
                StoreConfig::Qdrant(QdrantConfig {
                    url,
                    api_key: get("QDRANT_API_KEY"),
                    collection: get("QDRANT_COLLECTION")
                        .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
                })
            }
        };

        let port = match get("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .map_err(|_| SearchError::Config(format!("PORT must be a port number, got '{}'", raw)))?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            embedding,
            store,
            port,
        })
    }
}

fn validate_url(key: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(SearchError::Config(format!(
            "{} must start with http:// or https://, got '{}'",
            key, url
        )))
    }
}
