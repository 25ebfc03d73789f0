//! Web server module.
//!
//! Read-only HTTP API over the latest sample.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use crate::query::QueryService;
use crate::storage::StoreError;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub query: QueryService,
}

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    db: Option<String>,
}

/// Error body for store failures.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Store failure surfaced to the caller as a 5xx with a JSON body.
struct ApiError(StoreError);

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            StoreError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            StoreError::Invalid(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::error!(error = %self.0, "Query failed");
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/", get(index_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .route("/metrics", get(metrics_handler))
        .route("/api/blockchain_metrics", get(metrics_handler))
        .route("/block_height", get(block_height_handler))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

async fn index_handler() -> &'static str {
    "blockwatch: blockchain metrics service\n"
}

/// Liveness probe.
async fn healthz_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        db: None,
    })
}

/// Readiness probe that checks database availability.
async fn readyz_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.query.ping().await {
        Ok(()) => Json(HealthResponse {
            status: "ok".to_string(),
            db: Some("ready".to_string()),
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "not_ready".to_string(),
                    db: Some(err.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// Latest metrics as JSON, `null` for unknown values.
async fn metrics_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let metrics = state.query.latest_metrics().await?;
    Ok(Json(metrics).into_response())
}

/// Latest block height and when it was observed.
async fn block_height_handler(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let height = state.query.latest_block_height().await?;
    Ok(Json(height).into_response())
}
