//! JSON boundary: `POST /search` and `GET /health`.
//!
//! Searches run on the blocking pool; the first request (or `/health`) pays
//! for the index build.
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use shopsearch_core::Error;
use shopsearch_hybrid::{SearchRequest, SearchResponse, SearchService};

#[derive(Clone)]
pub struct AppState {
    service: Arc<SearchService>,
}

/// Request body. Flags accept both the dashed and the underscored spelling;
/// `null` means the default.
#[derive(Debug, Deserialize)]
pub struct SearchBody {
    pub query: String,
    #[serde(default)]
    pub rows: Option<i64>,
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default, rename = "use-dense", alias = "use_dense")]
    pub use_dense: Option<bool>,
    #[serde(default, rename = "use-sparse", alias = "use_sparse")]
    pub use_sparse: Option<bool>,
    #[serde(default, alias = "use-rerank")]
    pub use_rerank: Option<bool>,
    #[serde(default)]
    pub rrf_alpha: Option<f32>,
}

impl From<SearchBody> for SearchRequest {
    fn from(body: SearchBody) -> Self {
        SearchRequest {
            query: body.query,
            rows: body.rows,
            use_sparse: body.use_sparse.unwrap_or(true),
            use_dense: body.use_dense.unwrap_or(true),
            use_rerank: body.use_rerank.unwrap_or(true),
            alpha: body.rrf_alpha,
            dataset_id: body.dataset_id,
        }
    }
}

/// One result row: rank and score followed by the item's own fields.
#[derive(Debug, Serialize)]
pub struct SearchResult {
    pub rank: usize,
    pub score: f32,
    pub id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub image_url: String,
}

#[derive(Debug, Serialize)]
pub struct SearchReply {
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_id: Option<String>,
}

impl From<SearchResponse> for SearchReply {
    fn from(response: SearchResponse) -> Self {
        let results = response
            .results
            .into_iter()
            .map(|hit| SearchResult {
                rank: hit.rank,
                score: hit.score,
                id: hit.item.id.clone(),
                title: hit.item.title.clone(),
                description: hit.item.description.clone(),
                price: hit.item.price,
                image_url: hit.item.image_url.clone(),
            })
            .collect();
        SearchReply { query: response.query, count: response.count, results, notes: response.notes, dataset_id: response.dataset_id }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub catalog_items: usize,
    pub sparse_available: bool,
    pub dense_available: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, body: ErrorBody { error: message.into(), kind: "internal" } }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = if err.is_client_error() { StatusCode::BAD_REQUEST } else { StatusCode::INTERNAL_SERVER_ERROR };
        Self { status, body: ErrorBody { error: err.to_string(), kind: err.kind() } }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self { status: StatusCode::BAD_REQUEST, body: ErrorBody { error: rejection.body_text(), kind: "invalid_request" } }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(kind = self.body.kind, error = %self.body.error, "request failed");
        }
        (self.status, Json(self.body)).into_response()
    }
}

pub fn router(service: Arc<SearchService>) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { service })
}

async fn search(State(state): State<AppState>, body: Result<Json<SearchBody>, JsonRejection>) -> Result<Json<SearchReply>, ApiError> {
    let Json(body) = body?;
    let request = SearchRequest::from(body);
    let service = state.service.clone();
    let response = tokio::task::spawn_blocking(move || service.search(&request))
        .await
        .map_err(|e| ApiError::internal(format!("search task failed: {e}")))??;
    Ok(Json(SearchReply::from(response)))
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    let service = state.service.clone();
    let caps = tokio::task::spawn_blocking(move || service.capabilities())
        .await
        .map_err(|e| ApiError::internal(format!("index build failed: {e}")))?;
    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        catalog_items: state.service.catalog().len(),
        sparse_available: caps.sparse_available,
        dense_available: caps.dense_available,
    }))
}

/// Bind and serve until Ctrl-C.
pub async fn serve(service: Arc<SearchService>, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, router(service))
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "failed to install Ctrl-C handler");
            }
            tracing::info!("shutting down");
        })
        .await?;
    Ok(())
}
