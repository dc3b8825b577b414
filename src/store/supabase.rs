use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use super::{SearchParams, VectorStore};
use crate::config::SupabaseConfig;
use crate::document::{Document, Match, MetadataValue};
use crate::error::{Result, SearchError};

const BACKEND: &str = "supabase";

/// Similarity search through a PostgREST RPC (`match_documents` by default)
pub struct SupabaseStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    rpc_endpoint: String,
    table_endpoint: String,
}

#[derive(Serialize)]
struct MatchRequest<'a> {
    query_embedding: &'a [f32],
    match_threshold: f32,
    match_count: usize,
}

#[derive(Deserialize)]
struct PostgrestError {
    message: String,
}

impl SupabaseStore {
    pub fn new(config: &SupabaseConfig) -> Self {
        let base_url = config.url.trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            rpc_endpoint: format!("{}/rest/v1/rpc/{}", base_url, config.match_function),
            table_endpoint: format!("{}/rest/v1/{}", base_url, config.table),
            base_url,
            api_key: config.anon_key.clone(),
        }
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn check(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<PostgrestError>(&text)
            .map(|e| e.message)
            .unwrap_or(text);
        error!(%status, what, "supabase request failed");
        Err(SearchError::store(
            BACKEND,
            format!("{} returned {}: {}", what, status, detail),
        ))
    }

    /// Turn one RPC row into a match, resolving storage-relative file links.
    fn row_to_match(&self, mut row: Value) -> Result<Match> {
        let similarity = row
            .get("similarity")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        if let Some(obj) = row.as_object_mut() {
            obj.remove("similarity");
            obj.remove("embedding");
        }
        let mut document: Document = serde_json::from_value(row)
            .map_err(|e| SearchError::store(BACKEND, format!("Malformed row: {}", e)))?;

        if let Some(raw) = document.file_url.as_deref().filter(|s| !s.is_empty()) {
            let resolved = resolve_file_url(raw, &self.base_url);
            document
                .metadata
                .insert("file_url".to_string(), MetadataValue::Text(resolved.clone()));
            document.file_url = Some(resolved);
        }

        Ok(Match {
            document,
            similarity,
        })
    }
}

#[async_trait]
impl VectorStore for SupabaseStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    /// The table and RPC function are provisioned with the database.
    async fn ensure_collection(&self) -> Result<()> {
        Ok(())
    }

    async fn search(&self, vector: &[f32], params: SearchParams) -> Result<Vec<Match>> {
        let body = MatchRequest {
            query_embedding: vector,
            match_threshold: params.threshold,
            match_count: params.limit,
        };

        let response = self
            .authed(self.client.post(&self.rpc_endpoint))
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::store(BACKEND, format!("RPC request failed: {}", e)))?;
        let response = Self::check(response, "match RPC").await?;

        let rows: Option<Vec<Value>> = response
            .json()
            .await
            .map_err(|e| SearchError::store(BACKEND, format!("Invalid RPC response: {}", e)))?;
        let rows = rows.unwrap_or_default();
        debug!(rows = rows.len(), "match RPC returned");

        rows.into_iter().map(|row| self.row_to_match(row)).collect()
    }

    async fn upsert(&self, docs: &[(Document, Vec<f32>)]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }

        let rows = docs
            .iter()
            .map(|(doc, embedding)| to_row(doc, embedding))
            .collect::<Result<Vec<_>>>()?;

        let response = self
            .authed(self.client.post(&self.table_endpoint))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&rows)
            .send()
            .await
            .map_err(|e| SearchError::store(BACKEND, format!("Insert request failed: {}", e)))?;
        Self::check(response, "insert").await?;

        debug!(count = docs.len(), "upserted documents");
        Ok(())
    }
}

/// Table row for a document: snake_case date column, embedding attached,
/// id left to the database when the document has none.
fn to_row(doc: &Document, embedding: &[f32]) -> Result<Value> {
    let mut row = serde_json::to_value(doc)?;
    if let Some(obj) = row.as_object_mut() {
        if let Some(date) = obj.remove("dateAdded") {
            obj.insert("date_added".to_string(), date);
        }
        if doc.id.is_empty() {
            obj.remove("id");
        }
        obj.insert("embedding".to_string(), serde_json::to_value(embedding)?);
    }
    Ok(row)
}

/// Absolute URLs pass through; anything else is a path in public storage.
pub fn resolve_file_url(raw: &str, base_url: &str) -> String {
    if raw.starts_with("http://") || raw.starts_with("https://") {
        raw.to_string()
    } else {
        format!(
            "{}/storage/v1/object/public/{}",
            base_url.trim_end_matches('/'),
            raw.trim_start_matches('/')
        )
    }
}
