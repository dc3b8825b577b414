// Library interface for lexsearch

pub mod cli;
pub mod config;
pub mod document;
pub mod embeddings;
pub mod error;
pub mod indexing;
pub mod rank;
pub mod renderer;
pub mod search;
pub mod server;
pub mod snippet;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use document::{Document, Match, SearchResult};
pub use error::{ErrorKind, Result, SearchError};
pub use search::SearchPipeline;
