use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::Backend;

#[derive(Parser)]
#[command(
    name = "lexsearch",
    about = "Semantic search over legal documents",
    version
)]
pub struct Cli {
    /// Enable verbose output
    #[arg(global = true, long, short)]
    pub verbose: bool,

    /// Vector store backend (defaults to qdrant when QDRANT_URL is set)
    #[arg(global = true, long, value_enum)]
    pub backend: Option<Backend>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Markdown,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search indexed documents by meaning
    Search {
        /// Natural-language query
        query: String,

        /// Print results as JSON (same shape as the HTTP API)
        #[arg(long, conflicts_with = "format")]
        json: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Serve the JSON search API
    Serve {
        /// Listen address (default 0.0.0.0:$PORT)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Embed and store documents from a JSON file or directory
    Index {
        /// JSON file, or directory searched recursively for *.json
        path: PathBuf,

        /// Load and validate documents without calling any service
        #[arg(long)]
        dry_run: bool,

        /// Documents per embedding request
        #[arg(long, default_value = "16")]
        batch_size: usize,
    },

    /// Create the vector collection if it does not exist
    Init,

    /// Check a running server
    Health {
        /// Base URL of the server
        #[arg(long, default_value = "http://localhost:3000")]
        endpoint: String,
    },
}

impl Commands {
    /// Output format after folding `--json` into `--format`
    pub fn search_format(json: bool, format: OutputFormat) -> OutputFormat {
        if json {
            OutputFormat::Json
        } else {
            format
        }
    }
}
