//! HTTP API over a single [`Session`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/memes` | All stored memes |
//! | `POST` | `/memes` | Add a meme: `{text, image_desc, likes?, retweets?}` |
//! | `GET`  | `/trends` | Virality scores and per-category means |
//! | `GET`  | `/chart.png` | Redraw and return the virality chart |
//! | `GET`  | `/index` | Persisted index status |
//! | `POST` | `/index` | Rebuild and persist the index |
//! | `POST` | `/insights` | Ask a trend question: `{query, rebuild?}` |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "index_not_ready", "message": "..." } }
//! ```
//!
//! Error codes: `bad_request` (400), `no_data` (404), `index_not_ready` (409),
//! `storage_unavailable` (500), `index_unavailable` (500),
//! `charting_failed` (500), `generation_failed` (502), `timeout` (504).
//!
//! Requests are serialized through one session mutex; a slow question
//! blocks other requests until it finishes.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use memetrend_core::models::{MemeRecord, NarrativeReport};
use memetrend_core::MemeError;

use crate::config::Config;
use crate::index_store::IndexInfo;
use crate::session::{IndexStatus, NewMeme, Session, TrendReport};

#[derive(Clone)]
struct AppState {
    session: Arc<Mutex<Session>>,
}

/// Start the server on `[server].bind` and run until the process exits.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let session = Session::from_config(config)?;
    let bind_addr = config.server.bind.clone();

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(bind = %bind_addr, "server started");
    println!("MemeTrend server listening on http://{}", bind_addr);

    axum::serve(listener, router(session)).await?;
    Ok(())
}

/// All routes with CORS, backed by `session`.
pub fn router(session: Session) -> Router {
    let state = AppState {
        session: Arc::new(Mutex::new(session)),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/memes", get(handle_list_memes).post(handle_add_meme))
        .route("/trends", get(handle_trends))
        .route("/chart.png", get(handle_chart))
        .route("/index", get(handle_index_status).post(handle_index_build))
        .route("/insights", post(handle_insights))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<MemeError> for AppError {
    fn from(err: MemeError) -> Self {
        let status = match &err {
            MemeError::EmptyCorpus => StatusCode::NOT_FOUND,
            MemeError::IndexNotReady => StatusCode::CONFLICT,
            MemeError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
            MemeError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            MemeError::StorageUnavailable { .. }
            | MemeError::IndexUnavailable(_)
            | MemeError::ChartingFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(code = err.code(), error = %err, "request failed");
        }
        AppError {
            status,
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /memes ============

async fn handle_list_memes(State(state): State<AppState>) -> Result<Json<Vec<MemeRecord>>, AppError> {
    let session = state.session.lock().await;
    Ok(Json(session.memes()?))
}

async fn handle_add_meme(
    State(state): State<AppState>,
    payload: Result<Json<NewMeme>, JsonRejection>,
) -> Result<(StatusCode, Json<MemeRecord>), AppError> {
    let Json(meme) = payload?;
    meme.validate().map_err(bad_request)?;

    let session = state.session.lock().await;
    let record = session.add_meme(meme)?;
    Ok((StatusCode::CREATED, Json(record)))
}

// ============ GET /trends, GET /chart.png ============

async fn handle_trends(State(state): State<AppState>) -> Result<Json<TrendReport>, AppError> {
    let session = state.session.lock().await;
    Ok(Json(session.trends(Utc::now())?))
}

async fn handle_chart(State(state): State<AppState>) -> Result<Response, AppError> {
    let report = {
        let session = state.session.lock().await;
        session.trends(Utc::now())?
    };

    if report.memes.is_empty() {
        return Err(MemeError::EmptyCorpus.into());
    }
    let path = report
        .chart
        .ok_or_else(|| MemeError::ChartingFailed("chart could not be rendered".to_string()))?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| MemeError::ChartingFailed(format!("cannot read {}: {}", path.display(), e)))?;

    Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
}

// ============ /index ============

async fn handle_index_status(State(state): State<AppState>) -> Result<Json<IndexStatus>, AppError> {
    let session = state.session.lock().await;
    Ok(Json(session.index_status()?))
}

async fn handle_index_build(State(state): State<AppState>) -> Result<Json<IndexInfo>, AppError> {
    let mut session = state.session.lock().await;
    Ok(Json(session.build_index().await?))
}

// ============ POST /insights ============

#[derive(Deserialize)]
struct InsightRequest {
    query: String,
    #[serde(default)]
    rebuild: bool,
}

async fn handle_insights(
    State(state): State<AppState>,
    payload: Result<Json<InsightRequest>, JsonRejection>,
) -> Result<Json<NarrativeReport>, AppError> {
    let Json(req) = payload?;
    if req.query.trim().is_empty() {
        return Err(bad_request("query must not be empty"));
    }

    let mut session = state.session.lock().await;
    Ok(Json(session.ask(&req.query, req.rebuild).await?))
}
