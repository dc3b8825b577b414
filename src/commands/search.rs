use colored::Colorize;
use lexsearch::cli::OutputFormat;
use lexsearch::config::{Backend, Config};
use lexsearch::error::Result;
use lexsearch::renderer::{markdown, terminal};
use lexsearch::SearchPipeline;
use tracing::info;

use super::runtime;

pub fn cmd_search(query: &str, format: OutputFormat, backend: Option<Backend>) -> Result<()> {
    let config = Config::from_env(backend)?;
    let pipeline = SearchPipeline::from_config(&config)?;

    let rt = runtime()?;
    let results = rt.block_on(async {
        tokio::select! {
            results = pipeline.search(query) => results.map(Some),
            _ = tokio::signal::ctrl_c() => Ok(None),
        }
    })?;

    let Some(results) = results else {
        eprintln!("{}", "Search cancelled".yellow());
        return Ok(());
    };
    info!(results = results.len(), "search finished");

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
        OutputFormat::Markdown => print!("{}", markdown::render_results(query, &results)),
        OutputFormat::Text => print!("{}", terminal::render_results(query, &results)),
    }
    Ok(())
}
