use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{agent, app_state::AppState, documents, health};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::service_info,
        documents::handlers::process_document,
    ),
    components(schemas(
        agent::AnalysisMetadata,
        agent::ClassificationResult,
        agent::Confidence,
        agent::ImportantDetails,
        agent::SummaryResult,
        agent::Urgency,
        documents::dtos::AnalysisData,
        documents::dtos::ProcessResponse,
        documents::dtos::ProcessingErrorResponse,
        documents::dtos::ResponseMetadata,
        documents::dtos::SourceInfo,
        documents::dtos::UrlRequest,
        documents::dtos::ValidationErrorResponse,
        health::HealthResponse,
        health::ServiceFeatures,
        health::ServiceInfoResponse,
    )),
    tags(
        (name = "documents", description = "Document processing"),
        (name = "health", description = "Liveness and capability reporting"),
    )
)]
pub struct ApiDoc;

/// Allowance on top of the configured file size for multipart framing and
/// the other form fields.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_file_size() + MULTIPART_OVERHEAD;
    Router::new()
        .route("/health", get(health::health_check))
        .route("/info", get(health::service_info))
        .route(
            "/process-document",
            post(documents::handlers::process_document),
        )
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent::prompts::NoopPromptOverrides, config::Config, llm::MockChatClient,
        observability::NoopTraceSink,
    };
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_router() -> Router {
        let state = AppState::with_collaborators(
            Arc::new(Config::new("127.0.0.1:0", "sk-test")),
            Arc::new(MockChatClient::new()),
            Arc::new(NoopPromptOverrides),
            Arc::new(NoopTraceSink),
        );
        router(state)
    }

    #[tokio::test]
    async fn openapi_document_covers_every_route() {
        let request = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), 200);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        for path in ["/health", "/info", "/process-document"] {
            assert!(doc["paths"][path].is_object(), "missing path: {path}");
        }
    }

    #[tokio::test]
    async fn unknown_routes_are_404() {
        let request = Request::builder()
            .uri("/api/unknown")
            .body(Body::empty())
            .unwrap();
        let response = test_router().oneshot(request).await.unwrap();
        assert_eq!(response.status(), 404);
    }
}
