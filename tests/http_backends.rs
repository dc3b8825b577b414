//! OpenAI-compatible embeddings and Supabase RPC clients against a local stub.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use lexsearch::config::{EmbeddingConfig, SupabaseConfig};
use lexsearch::document::Document;
use lexsearch::embeddings::{Embedder, OpenAiEmbedder};
use lexsearch::error::ErrorKind;
use lexsearch::indexing::{index_documents, load_documents};
use lexsearch::store::{SearchParams, SupabaseStore, VectorStore};
use lexsearch::SearchPipeline;
use serde_json::{json, Value};

const DIMS: usize = 4;

#[derive(Debug, Clone)]
struct Recorded {
    path: &'static str,
    auth: Option<String>,
    apikey: Option<String>,
    prefer: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct Stub {
    requests: Arc<Mutex<Vec<Recorded>>>,
    /// When set, every route answers with this status and body
    failure: Option<(StatusCode, Value)>,
    /// Rows returned by the match RPC for thresholds below the primary one
    fallback_rows: Vec<Value>,
}

impl Stub {
    fn record(&self, path: &'static str, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().unwrap().push(Recorded {
            path,
            auth: header("authorization"),
            apikey: header("apikey"),
            prefer: header("prefer"),
            body,
        });
    }

    fn recorded(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn embeddings(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.record("embeddings", &headers, body.clone());
    if let Some((status, err)) = stub.failure.clone() {
        return (status, Json(err));
    }
    let inputs = match &body["input"] {
        Value::Array(items) => items.len(),
        _ => 1,
    };
    // Reversed on purpose: the client must restore input order from `index`
    let data: Vec<Value> = (0..inputs)
        .rev()
        .map(|i| json!({ "index": i, "embedding": vec![i as f32; DIMS] }))
        .collect();
    (StatusCode::OK, Json(json!({ "data": data })))
}

async fn match_documents(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.record("rpc", &headers, body.clone());
    if let Some((status, err)) = stub.failure.clone() {
        return (status, Json(err));
    }
    let threshold = body["match_threshold"].as_f64().unwrap_or(1.0);
    if threshold >= 0.6 {
        (StatusCode::OK, Json(json!([])))
    } else {
        (StatusCode::OK, Json(Value::Array(stub.fallback_rows.clone())))
    }
}

async fn insert(
    State(stub): State<Stub>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    stub.record("insert", &headers, body);
    match stub.failure {
        Some((status, _)) => status,
        None => StatusCode::CREATED,
    }
}

/// Serve the stub on an ephemeral port and return its base URL
async fn spawn(stub: Stub) -> String {
    let app = Router::new()
        .route("/v1/embeddings", post(embeddings))
        .route("/rest/v1/rpc/match_documents", post(match_documents))
        .route("/rest/v1/documents", post(insert))
        .with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn embedder(base: &str) -> OpenAiEmbedder {
    OpenAiEmbedder::new(&EmbeddingConfig {
        api_key: "sk-test".into(),
        base_url: format!("{}/v1", base),
        model: "text-embedding-3-small".into(),
        dimensions: DIMS,
    })
}

fn supabase(base: &str) -> SupabaseStore {
    SupabaseStore::new(&SupabaseConfig {
        url: base.to_string(),
        anon_key: "anon-key".into(),
        match_function: "match_documents".into(),
        table: "documents".into(),
    })
}

// ── Embeddings ───────────────────────────────────────────────────────────

#[tokio::test]
async fn embedding_request_has_expected_shape() {
    let stub = Stub::default();
    let base = spawn(stub.clone()).await;

    let vector = embedder(&base).embed("korupsi dana desa").await.unwrap();
    assert_eq!(vector.len(), DIMS);

    let req = &stub.recorded()[0];
    assert_eq!(req.auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(req.body["model"], "text-embedding-3-small");
    assert_eq!(req.body["input"], "korupsi dana desa");
    assert_eq!(req.body["encoding_format"], "float");
    assert_eq!(req.body["dimensions"], DIMS);
}

#[tokio::test]
async fn batch_embeddings_come_back_in_input_order() {
    let stub = Stub::default();
    let base = spawn(stub.clone()).await;

    let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let vectors = embedder(&base).embed_batch(&texts).await.unwrap();
    let firsts: Vec<f32> = vectors.iter().map(|v| v[0]).collect();
    assert_eq!(firsts, vec![0.0, 1.0, 2.0]);
    assert_eq!(stub.recorded().len(), 1);
}

#[tokio::test]
async fn provider_error_message_is_surfaced() {
    let stub = Stub {
        failure: Some((
            StatusCode::UNAUTHORIZED,
            json!({ "error": { "message": "Incorrect API key provided", "type": "invalid_request_error" } }),
        )),
        ..Default::default()
    };
    let base = spawn(stub).await;

    let err = embedder(&base).embed("x").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Provider);
    let msg = err.to_string();
    assert!(msg.contains("401"), "{msg}");
    assert!(msg.contains("Incorrect API key provided"), "{msg}");
}

#[tokio::test]
async fn wrong_dimension_is_rejected() {
    let stub = Stub::default();
    let base = spawn(stub).await;

    let mut config = EmbeddingConfig {
        api_key: "sk-test".into(),
        base_url: format!("{}/v1", base),
        model: "m".into(),
        dimensions: DIMS + 1,
    };
    let err = OpenAiEmbedder::new(&config).embed("x").await.unwrap_err();
    assert!(err.to_string().contains("expected 5"), "{err}");

    config.dimensions = DIMS;
    assert!(OpenAiEmbedder::new(&config).embed("x").await.is_ok());
}

// ── Supabase ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn rpc_request_carries_params_and_keys() {
    let stub = Stub::default();
    let base = spawn(stub.clone()).await;

    let hits = supabase(&base)
        .search(
            &[0.5; DIMS],
            SearchParams {
                threshold: 0.6,
                limit: 10,
            },
        )
        .await
        .unwrap();
    assert!(hits.is_empty());

    let req = &stub.recorded()[0];
    assert_eq!(req.path, "rpc");
    assert_eq!(req.apikey.as_deref(), Some("anon-key"));
    assert_eq!(req.auth.as_deref(), Some("Bearer anon-key"));
    assert_eq!(req.body["match_count"], 10);
    assert_eq!(req.body["query_embedding"].as_array().unwrap().len(), DIMS);
    let threshold = req.body["match_threshold"].as_f64().unwrap();
    assert!((threshold - 0.6).abs() < 1e-6);
}

#[tokio::test]
async fn postgrest_error_is_a_store_error() {
    let stub = Stub {
        failure: Some((
            StatusCode::NOT_FOUND,
            json!({ "message": "Could not find the function public.match_documents" }),
        )),
        ..Default::default()
    };
    let base = spawn(stub).await;

    let err = supabase(&base)
        .search(
            &[0.0; DIMS],
            SearchParams {
                threshold: 0.6,
                limit: 10,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Store);
    assert!(err.to_string().contains("Could not find the function"), "{err}");
}

#[tokio::test]
async fn upsert_posts_rows_with_embeddings() {
    let stub = Stub::default();
    let base = spawn(stub.clone()).await;

    let doc: Document = serde_json::from_value(json!({
        "id": "putusan-1",
        "title": "Putusan 1",
        "content": "isi",
        "dateAdded": "2024-01-02T03:04:05Z"
    }))
    .unwrap();
    supabase(&base)
        .upsert(&[(doc, vec![0.25; DIMS])])
        .await
        .unwrap();

    let req = &stub.recorded()[0];
    assert_eq!(req.path, "insert");
    assert!(req
        .prefer
        .as_deref()
        .unwrap_or_default()
        .contains("merge-duplicates"));
    let row = &req.body[0];
    assert_eq!(row["id"], "putusan-1");
    assert!(row.get("date_added").is_some());
    assert!(row.get("dateAdded").is_none());
    assert_eq!(row["embedding"].as_array().unwrap().len(), DIMS);
}

#[tokio::test]
async fn indexing_leaves_missing_ids_to_the_database() {
    let stub = Stub::default();
    let base = spawn(stub.clone()).await;

    let dir = tempfile::TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("docs.json"),
        r#"[
            {"title": "Putusan", "content": "isi"},
            {"id": "putusan-2", "title": "Putusan 2", "content": "isi dua"}
        ]"#,
    )
    .unwrap();
    let (docs, _) = load_documents(dir.path()).unwrap();

    let written = index_documents(&embedder(&base), &supabase(&base), docs, 10, false)
        .await
        .unwrap();
    assert_eq!(written, 2);

    let insert = stub
        .recorded()
        .into_iter()
        .find(|r| r.path == "insert")
        .unwrap();
    let rows = insert.body.as_array().unwrap();
    assert!(rows[0].get("id").is_none(), "row: {}", rows[0]);
    assert_eq!(rows[1]["id"], "putusan-2");
    assert_eq!(rows[0]["embedding"].as_array().unwrap().len(), DIMS);
}

// ── End to end ───────────────────────────────────────────────────────────

#[tokio::test]
async fn pipeline_falls_back_and_resolves_file_links() {
    let stub = Stub {
        fallback_rows: vec![json!({
            "id": 7,
            "title": null,
            "content": "Terdakwa terbukti menyalahgunakan dana desa.",
            "category": "regulation",
            "date_added": "2024-03-01T00:00:00+00:00",
            "tags": null,
            "file_url": "putusan/7.pdf",
            "metadata": { "nomor_putusan": "7/Pid.Sus-TPK/2024" },
            "similarity": 0.47,
            "embedding": [0.1, 0.2]
        })],
        ..Default::default()
    };
    let base = spawn(stub.clone()).await;

    let pipeline = SearchPipeline::new(Arc::new(embedder(&base)), Arc::new(supabase(&base)));
    let results = pipeline.search("Dana Desa").await.unwrap();

    assert_eq!(results.len(), 1);
    let hit = &results[0];
    assert_eq!(hit.relevance_score, 47);
    assert_eq!(hit.document.id, "7");
    assert_eq!(hit.document.display_title(), "7/Pid.Sus-TPK/2024");
    assert_eq!(
        hit.document.download_url(),
        Some(format!("{}/storage/v1/object/public/putusan/7.pdf", base).as_str())
    );
    assert!(hit.matched_segments[0].contains("<mark>dana</mark>"));

    let paths: Vec<&str> = stub.recorded().iter().map(|r| r.path).collect();
    assert_eq!(paths, vec!["embeddings", "rpc", "rpc"]);
    assert_eq!(stub.recorded()[0].body["input"], "dana desa");
}
