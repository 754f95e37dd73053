use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::app_state::AppState;
use crate::config::ALLOWED_MIME_TYPES;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: DateTime<Utc>,
    uptime_seconds: u64,
    tracing_enabled: bool,
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        tracing_enabled: state.tracing_enabled(),
    })
}

#[derive(Serialize, ToSchema)]
pub struct ServiceInfoResponse {
    supported_file_types: Vec<String>,
    max_file_size: usize,
    max_file_size_mb: usize,
    version: String,
    features: ServiceFeatures,
}

#[derive(Serialize, ToSchema)]
pub struct ServiceFeatures {
    trace_observability: bool,
    ai_classification: bool,
    vision_ai_support: bool,
    url_processing: bool,
}

#[utoipa::path(
    get,
    path = "/info",
    tag = "health",
    responses(
        (status = 200, description = "Service capabilities", body = ServiceInfoResponse)
    )
)]
pub async fn service_info(State(state): State<AppState>) -> Json<ServiceInfoResponse> {
    let max_file_size = state.config.max_file_size();
    Json(ServiceInfoResponse {
        supported_file_types: ALLOWED_MIME_TYPES.iter().map(|m| m.to_string()).collect(),
        max_file_size,
        max_file_size_mb: max_file_size / (1024 * 1024),
        version: env!("CARGO_PKG_VERSION").to_string(),
        features: ServiceFeatures {
            trace_observability: state.tracing_enabled(),
            ai_classification: !state.config.openai_api_key().is_empty(),
            vision_ai_support: true,
            url_processing: true,
        },
    })
}
