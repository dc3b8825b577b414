use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Embedding provider error: {0}")]
    Provider(String),

    #[error("Vector store error ({backend}): {message}")]
    Store {
        backend: &'static str,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse error classification for callers that only branch on the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Provider,
    Store,
    Io,
    Json,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Provider => "provider",
            ErrorKind::Store => "store",
            ErrorKind::Io => "io",
            ErrorKind::Json => "json",
        }
    }
}

impl SearchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::Config(_) => ErrorKind::Config,
            SearchError::Provider(_) => ErrorKind::Provider,
            SearchError::Store { .. } => ErrorKind::Store,
            SearchError::Io(_) => ErrorKind::Io,
            SearchError::Json(_) => ErrorKind::Json,
        }
    }

    pub fn store(backend: &'static str, message: impl Into<String>) -> Self {
        SearchError::Store {
            backend,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(SearchError::Config("x".into()).kind(), ErrorKind::Config);
        assert_eq!(SearchError::Provider("x".into()).kind(), ErrorKind::Provider);
        assert_eq!(SearchError::store("qdrant", "down").kind(), ErrorKind::Store);
    }

    #[test]
    fn store_error_names_backend() {
        let err = SearchError::store("supabase", "relation does not exist");
        assert_eq!(
            err.to_string(),
            "Vector store error (supabase): relation does not exist"
        );
    }
}
