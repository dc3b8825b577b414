//! JSON HTTP surface: `POST /api/search` and `GET /api/health`.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::error::Result;
use crate::search::SearchPipeline;

pub fn router(pipeline: Arc<SearchPipeline>) -> Router {
    Router::new()
        .route("/api/search", post(search))
        .route("/api/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(pipeline)
}

/// Bind and serve until Ctrl-C
pub async fn serve(addr: &str, pipeline: Arc<SearchPipeline>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "server listening");
    axum::serve(listener, router(pipeline))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn search(State(pipeline): State<Arc<SearchPipeline>>, body: Bytes) -> Response {
    let query = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("query").and_then(Value::as_str).map(str::to_string))
        .filter(|q| !q.is_empty());

    let Some(query) = query else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Query is required" })),
        )
            .into_response();
    };

    match pipeline.search(&query).await {
        Ok(results) => Json(results).into_response(),
        Err(e) => {
            error!(error = %e, "search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "Search failed",
                    "details": e.to_string(),
                    "kind": e.kind().as_str(),
                })),
            )
                .into_response()
        }
    }
}
