use std::path::Path;
use std::sync::Arc;

use colored::Colorize;
use lexsearch::config::{Backend, Config};
use lexsearch::embeddings::{Embedder, OpenAiEmbedder};
use lexsearch::error::Result;
use lexsearch::indexing::{index_documents, load_documents};
use lexsearch::store;

use super::runtime;

pub fn cmd_index(
    path: &Path,
    dry_run: bool,
    batch_size: usize,
    backend: Option<Backend>,
) -> Result<()> {
    let (docs, report) = load_documents(path)?;

    println!(
        "{} {} document(s) from {} file(s)",
        "Loaded".green().bold(),
        report.documents,
        report.files
    );
    for (file, reason) in &report.skipped_files {
        println!("  {} {}: {}", "skipped".yellow(), file.display(), reason);
    }

    if dry_run {
        for doc in &docs {
            println!(
                "  {} {} [{}]",
                ">".green(),
                doc.display_title(),
                doc.category.as_str().cyan()
            );
        }
        println!("{}", "Dry run, nothing written.".dimmed());
        return Ok(());
    }
    if docs.is_empty() {
        return Ok(());
    }

    let config = Config::from_env(backend)?;
    let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(&config.embedding));
    let store = store::from_config(&config)?;

    let rt = runtime()?;
    let written = rt.block_on(index_documents(
        embedder.as_ref(),
        store.as_ref(),
        docs,
        batch_size,
        true,
    ))?;

    println!(
        "{} Indexed {} document(s) into {}",
        "Done!".green().bold(),
        written,
        config.store.backend()
    );
    Ok(())
}
