use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use irab_client::IrabPipeline;
use irab_core::{
    Analysis, AnalysisError, RoleCategory, SummaryRow, WordAnalysis, EXAMPLE_SENTENCES,
};
use irab_text::FeatureRecord;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{net::TcpListener, task::JoinHandle};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

/// One sentence is small; anything larger is rejected before parsing.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[derive(Clone)]
struct AppState {
    pipeline: Arc<IrabPipeline>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Analysis(err) => match err {
                AnalysisError::Extraction(_) | AnalysisError::EmptyInput => StatusCode::BAD_REQUEST,
                AnalysisError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                AnalysisError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
                AnalysisError::MalformedResponse(_)
                | AnalysisError::TokenCountMismatch { .. }
                | AnalysisError::MissingField { .. }
                | AnalysisError::WordMismatch { .. } => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Analysis(err) => err.kind(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, ApiError::Analysis(err) if err.is_retryable())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(%status, kind = self.kind(), error = %self, "analysis request failed");
        }
        (
            status,
            Json(serde_json::json!({
                "error": self.to_string(),
                "kind": self.kind(),
                "retryable": self.retryable(),
            })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SentenceRequest {
    pub sentence: String,
}

#[derive(Debug, Serialize)]
pub struct FeaturesResponse {
    pub sentence: String,
    pub token_count: usize,
    pub features: Vec<FeatureRecord>,
}

/// A word analysis with its display category attached.
#[derive(Debug, Serialize)]
pub struct WordView {
    #[serde(flatten)]
    pub analysis: WordAnalysis,
    pub category: RoleCategory,
    pub color: &'static str,
}

impl From<&WordAnalysis> for WordView {
    fn from(word: &WordAnalysis) -> Self {
        let category = RoleCategory::classify(&word.role);
        Self {
            analysis: word.clone(),
            category,
            color: category.color(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub sentence: String,
    pub prompt_version: String,
    pub features: Vec<FeatureRecord>,
    pub words: Vec<WordView>,
    pub summary: Vec<SummaryRow>,
}

impl From<Analysis> for AnalyzeResponse {
    fn from(analysis: Analysis) -> Self {
        let words = analysis.result.iter().map(WordView::from).collect();
        let summary = analysis.summary();
        Self {
            sentence: analysis.sentence,
            prompt_version: analysis.prompt_version,
            features: analysis.features,
            words,
            summary,
        }
    }
}

pub fn build_router(pipeline: IrabPipeline) -> Router {
    let state = AppState {
        pipeline: Arc::new(pipeline),
    };

    Router::new()
        .route("/health", get(health))
        .route("/examples", get(examples))
        .route("/features", post(features))
        .route("/analyze", post(analyze))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(
    listener: TcpListener,
    pipeline: IrabPipeline,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> JoinHandle<Result<(), std::io::Error>> {
    let app = build_router(pipeline);
    tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
    })
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn examples() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "examples": EXAMPLE_SENTENCES }))
}

async fn features(
    State(state): State<AppState>,
    payload: Result<Json<SentenceRequest>, JsonRejection>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let Json(request) = payload?;
    let sentence = request.sentence.trim().to_string();
    let features = state.pipeline.features(&sentence)?;
    Ok(Json(FeaturesResponse {
        sentence,
        token_count: features.len(),
        features,
    }))
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<SentenceRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let Json(request) = payload?;
    let analysis = state.pipeline.analyze(&request.sentence).await?;
    Ok(Json(AnalyzeResponse::from(analysis)))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
