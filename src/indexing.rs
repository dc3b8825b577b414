use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::MAX_EMBED_CHARS;
use crate::document::Document;
use crate::embeddings::Embedder;
use crate::error::Result;
use crate::store::VectorStore;

/// Sentence ends this close to the cut are used as the cut point
const SENTENCE_SLACK: usize = 100;

#[derive(Debug, Default)]
pub struct IndexReport {
    pub files: usize,
    pub documents: usize,
    pub skipped_files: Vec<(PathBuf, String)>,
}

/// Documents from a `.json` file, or from every `.json` file under a directory.
///
/// A file holds one document object or an array of them. Unreadable or
/// malformed files are reported and skipped. Missing ids stay empty; the
/// store assigns or derives one on upsert.
pub fn load_documents(path: &Path) -> Result<(Vec<Document>, IndexReport)> {
    let mut report = IndexReport::default();
    let mut docs = Vec::new();

    let files: Vec<PathBuf> = if path.is_file() {
        vec![path.to_path_buf()]
    } else {
        let mut files = Vec::new();
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|e| e.to_str()) == Some("json")
            {
                files.push(entry.into_path());
            }
        }
        files
    };

    for file in files {
        match read_file(&file) {
            Ok(mut found) => {
                report.files += 1;
                debug!(file = %file.display(), documents = found.len(), "loaded");
                docs.append(&mut found);
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "skipping file");
                report.skipped_files.push((file, e.to_string()));
            }
        }
    }

    for doc in docs.iter_mut() {
        doc.id = doc.id.trim().to_string();
    }
    report.documents = docs.len();

    Ok((docs, report))
}

fn read_file(path: &Path) -> Result<Vec<Document>> {
    let content = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&content)?;
    Ok(match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Document>, _>>()?,
        other => vec![serde_json::from_value(other)?],
    })
}

/// Cap embedding input at `max_chars`, ending on a full stop when one lies
/// within the last hundred characters of the cut.
pub fn truncate_for_embedding(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };
    let truncated = &text[..cut];
    if let Some(dot) = truncated.rfind('.') {
        let chars_after_dot = truncated[dot..].chars().count();
        if chars_after_dot < SENTENCE_SLACK {
            return text[..=dot].to_string();
        }
    }
    truncated.to_string()
}

/// Embed and upsert `docs` in batches. Returns how many documents were written.
pub async fn index_documents(
    embedder: &dyn Embedder,
    store: &dyn VectorStore,
    docs: Vec<Document>,
    batch_size: usize,
    show_progress: bool,
) -> Result<usize> {
    store.ensure_collection().await?;

    let progress = if show_progress {
        let pb = ProgressBar::new(docs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut written = 0;
    for batch in docs.chunks(batch_size.max(1)) {
        let texts: Vec<String> = batch
            .iter()
            .map(|d| truncate_for_embedding(&d.embedding_text(), MAX_EMBED_CHARS))
            .collect();
        let vectors = embedder.embed_batch(&texts).await?;

        let pairs: Vec<(Document, Vec<f32>)> = batch.iter().cloned().zip(vectors).collect();
        store.upsert(&pairs).await?;

        written += pairs.len();
        progress.set_message(batch.last().map(|d| d.display_title()).unwrap_or_default());
        progress.inc(batch.len() as u64);
    }
    progress.finish_and_clear();

    Ok(written)
}
