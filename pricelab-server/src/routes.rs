// =============================================================================
// REST API Endpoints: Axum 0.8
// =============================================================================
//
// All endpoints live under `/api/` and take their parameters from the query
// string. Pipeline calls are blocking (HTTP client, retry sleeps) and run on
// the blocking pool so a slow ticker never stalls the executor. Each pipeline
// call is bounded by the configured request timeout.
// =============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use pricelab_core::reference::TickerMatch;
use pricelab_core::service::{
    ForecastRequest, ForecastResponse, MarketService, SeriesRequest, SeriesResponse, ServiceError,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::error::ApiError;

#[derive(Clone)]
struct AppState {
    service: Arc<MarketService>,
    request_timeout: Duration,
}

impl AppState {
    /// Run a blocking pipeline call on the blocking pool, bounded by the
    /// request timeout.
    async fn run_pipeline<T, F>(&self, call: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&MarketService) -> Result<T, ServiceError> + Send + 'static,
    {
        let service = Arc::clone(&self.service);
        let task = tokio::task::spawn_blocking(move || call(&service));
        match tokio::time::timeout(self.request_timeout, task).await {
            Ok(joined) => Ok(joined??),
            Err(_) => Err(ApiError::Timeout(self.request_timeout)),
        }
    }
}

// =============================================================================
// Router construction
// =============================================================================

/// Build the full API router with middleware and shared state.
pub fn router(service: Arc<MarketService>, request_timeout: Duration) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/data", get(get_data))
        .route("/api/forecast", get(get_forecast))
        .route("/api/search_tickers", get(search_tickers))
        .route("/api/languages", get(languages))
        .route("/api/timezones", get(timezones))
        // ── Middleware & State ───────────────────────────────────────
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState {
            service,
            request_timeout,
        })
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "source": state.service.source_name(),
        "forecast": state.service.forecast_available(),
    }))
}

// =============================================================================
// Pipeline
// =============================================================================

async fn get_data(
    State(state): State<AppState>,
    Query(request): Query<SeriesRequest>,
) -> Result<Json<SeriesResponse>, ApiError> {
    let response = state
        .run_pipeline(move |service| service.get_series(&request))
        .await?;
    Ok(Json(response))
}

async fn get_forecast(
    State(state): State<AppState>,
    Query(request): Query<ForecastRequest>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let response = state
        .run_pipeline(move |service| service.get_forecast(&request))
        .await?;
    Ok(Json(response))
}

// =============================================================================
// Reference data
// =============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchQuery {
    q: String,
}

async fn search_tickers(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<Vec<TickerMatch>> {
    Json(state.service.search_tickers(&query.q))
}

async fn languages(State(state): State<AppState>) -> Json<BTreeMap<String, String>> {
    Json(state.service.languages().clone())
}

async fn timezones(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.service.timezones().to_vec())
}
