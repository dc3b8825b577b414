use std::future::Future;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointId, PointStruct, ScoredPoint, SearchPointsBuilder,
    UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant, QdrantError};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{SearchParams, VectorStore};
use crate::config::QdrantConfig;
use crate::document::{Document, Match};
use crate::error::{Result, SearchError};

const BACKEND: &str = "qdrant";

/// Collection search against Qdrant. The collection is created on first use.
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    dimensions: usize,
    ready: InitOnce,
}

/// Runs an async initializer at most once to success.
///
/// Concurrent first callers wait on the same attempt. A failed attempt leaves
/// the cell empty, so the next caller runs the initializer again.
#[derive(Default)]
struct InitOnce {
    cell: OnceCell<()>,
}

impl InitOnce {
    async fn run<F, Fut>(&self, init: F) -> Result<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        self.cell.get_or_try_init(init).await.map(|_| ())
    }
}

fn map_err(e: QdrantError) -> SearchError {
    SearchError::store(BACKEND, e.to_string())
}

impl QdrantStore {
    pub fn new(config: &QdrantConfig, dimensions: usize) -> Result<Self> {
        let mut builder = Qdrant::from_url(&config.url);
        if let Some(key) = &config.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().map_err(|e| {
            SearchError::Config(format!("Failed to initialize Qdrant client: {}", e))
        })?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            dimensions,
            ready: InitOnce::default(),
        })
    }

    async fn create_if_missing(&self) -> Result<()> {
        let collections = self.client.list_collections().await.map_err(map_err)?;
        if collections
            .collections
            .iter()
            .any(|c| c.name == self.collection)
        {
            debug!(collection = %self.collection, "collection exists");
            return Ok(());
        }

        let created = self
            .client
            .create_collection(
                CreateCollectionBuilder::new(self.collection.as_str()).vectors_config(
                    VectorParamsBuilder::new(self.dimensions as u64, Distance::Cosine),
                ),
            )
            .await;

        match created {
            Ok(_) => {
                info!(collection = %self.collection, dimensions = self.dimensions, "created collection");
                Ok(())
            }
            // Another process won the race between list and create
            Err(e) if e.to_string().contains("already exists") => {
                warn!(collection = %self.collection, "collection created concurrently");
                Ok(())
            }
            Err(e) => Err(SearchError::store(
                BACKEND,
                format!("Failed to initialize collection '{}': {}", self.collection, e),
            )),
        }
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    async fn ensure_collection(&self) -> Result<()> {
        self.ready.run(|| self.create_if_missing()).await
    }

    async fn search(&self, vector: &[f32], params: SearchParams) -> Result<Vec<Match>> {
        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(
                    self.collection.as_str(),
                    vector.to_vec(),
                    params.limit as u64,
                )
                .score_threshold(params.threshold)
                .with_payload(true),
            )
            .await
            .map_err(map_err)?;

        response.result.into_iter().map(to_match).collect()
    }

    async fn upsert(&self, docs: &[(Document, Vec<f32>)]) -> Result<()> {
        if docs.is_empty() {
            return Ok(());
        }
        self.ensure_collection().await?;

        let points = docs
            .iter()
            .map(|(doc, embedding)| -> Result<PointStruct> {
                let payload = Payload::try_from(serde_json::to_value(doc)?).map_err(map_err)?;
                let key = if doc.id.is_empty() {
                    PointKey::derived(&doc.embedding_text())
                } else {
                    PointKey::for_id(&doc.id)
                };
                Ok(PointStruct::new(PointId::from(key), embedding.clone(), payload))
            })
            .collect::<Result<Vec<_>>>()?;

        self.client
            .upsert_points(UpsertPointsBuilder::new(self.collection.as_str(), points).wait(true))
            .await
            .map_err(map_err)?;

        debug!(collection = %self.collection, count = docs.len(), "upserted points");
        Ok(())
    }
}

/// Qdrant only accepts unsigned integers and UUIDs as point ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointKey {
    Num(u64),
    Uuid(String),
}

impl PointKey {
    pub fn for_id(id: &str) -> Self {
        if let Ok(n) = id.parse::<u64>() {
            return PointKey::Num(n);
        }
        if is_uuid(id) {
            return PointKey::Uuid(id.to_lowercase());
        }
        Self::derived(id)
    }

    /// Stable UUID-shaped key from the SHA-256 of `seed`
    pub fn derived(seed: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        let hex = format!("{:x}", hasher.finalize());
        PointKey::Uuid(format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        ))
    }
}

impl From<PointKey> for PointId {
    fn from(key: PointKey) -> Self {
        match key {
            PointKey::Num(n) => PointId::from(n),
            PointKey::Uuid(s) => PointId::from(s),
        }
    }
}

/// Search hit to `Match`. The point id stands in for a missing or empty
/// payload id.
fn to_match(scored: ScoredPoint) -> Result<Match> {
    let mut payload: serde_json::Map<String, Value> = scored
        .payload
        .into_iter()
        .map(|(k, v)| (k, to_json(v)))
        .collect();

    let has_id = match payload.get("id") {
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Null) | None => false,
        Some(_) => true,
    };
    if !has_id {
        if let Some(id) = scored.id.and_then(|p| p.point_id_options) {
            let id = match id {
                PointIdOptions::Num(n) => n.to_string(),
                PointIdOptions::Uuid(s) => s,
            };
            payload.insert("id".to_string(), Value::String(id));
        }
    }

    let document: Document = serde_json::from_value(Value::Object(payload))
        .map_err(|e| SearchError::store(BACKEND, format!("Malformed payload: {}", e)))?;
    Ok(Match {
        document,
        similarity: f64::from(scored.score),
    })
}

fn is_uuid(s: &str) -> bool {
    s.len() == 36
        && s.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}

fn to_json(value: QdrantValue) -> Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::from(i),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => Value::Array(list.values.into_iter().map(to_json).collect()),
        Some(Kind::StructValue(s)) => Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, to_json(v)))
                .collect(),
        ),
    }
}
