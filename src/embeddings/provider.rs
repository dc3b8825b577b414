use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::Embedder;
use crate::config::EmbeddingConfig;
use crate::error::{Result, SearchError};

/// OpenAI-compatible `/embeddings` client
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
    model: String,
    dimensions: usize,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a, I: Serialize> {
    model: &'a str,
    input: I,
    encoding_format: &'static str,
    dimensions: usize,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl OpenAiEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.api_key.clone(),
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            dimensions: config.dimensions,
        }
    }

    async fn request<I: Serialize + Send + Sync>(&self, input: I) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input,
            encoding_format: "float",
            dimensions: self.dimensions,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "embedding request failed");
                SearchError::Provider(format!("Failed to generate embedding: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&text)
                .map(|e| e.error.message)
                .unwrap_or(text);
            error!(%status, "embedding provider returned an error");
            return Err(SearchError::Provider(format!(
                "Failed to generate embedding ({}): {}",
                status, detail
            )));
        }

        let mut parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            SearchError::Provider(format!("Invalid embedding response: {}", e))
        })?;
        parsed.data.sort_by_key(|d| d.index.unwrap_or(usize::MAX));

        let vectors: Vec<Vec<f32>> = parsed.data.into_iter().map(|d| d.embedding).collect();
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(SearchError::Provider(format!(
                "Embedding has {} dimensions, expected {}",
                bad.len(),
                self.dimensions
            )));
        }
        Ok(vectors)
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(model = %self.model, text_len = text.len(), "embedding text");
        self.request(text)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::Provider("No embedding returned".into()))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        debug!(model = %self.model, batch = texts.len(), "embedding batch");
        let vectors = self.request(texts).await?;
        if vectors.len() != texts.len() {
            return Err(SearchError::Provider(format!(
                "Provider returned {} embeddings for {} inputs",
                vectors.len(),
                texts.len()
            )));
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
