//! Mapping of service errors onto HTTP responses.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pricelab_core::ServiceError;
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    /// The blocking pipeline task panicked or was cancelled.
    Worker(String),
    /// The pipeline did not finish within the request timeout.
    Timeout(Duration),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Service(ServiceError::TickerRequired) => StatusCode::BAD_REQUEST,
            Self::Service(ServiceError::FetchFailed) => StatusCode::NOT_FOUND,
            Self::Service(ServiceError::ForecastUnavailable) | Self::Worker(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Service(error) => error.to_string(),
            Self::Worker(_) => "internal error".to_owned(),
            Self::Timeout(_) => "request timed out".to_owned(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(error: ServiceError) -> Self {
        Self::Service(error)
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(error: tokio::task::JoinError) -> Self {
        Self::Worker(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            Self::Worker(detail) => error!(%detail, "pipeline task failed"),
            Self::Timeout(limit) => warn!(?limit, "pipeline call timed out"),
            Self::Service(_) => {}
        }
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}
