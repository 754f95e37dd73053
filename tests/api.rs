use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::CONTENT_TYPE},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use doctriage::{
    agent::prompts::NoopPromptOverrides,
    app_state::AppState,
    config::Config,
    llm::{ChatClient, ChatOutput, ChatRequest, LlmError, MessageContent},
    observability::NoopTraceSink,
    routes,
};

const CLASSIFICATION_JSON: &str = r#"{
    "category": "Receipt/Invoice",
    "confidence": "high",
    "explanation": "amounts and a vendor name",
    "keywords": ["invoice", "total"]
}"#;

const SUMMARY_JSON: &str = r#"{
    "main_purpose": "bill the customer",
    "key_points": ["total is $120.50"],
    "important_details": { "amounts": ["$120.50"], "parties": ["Acme"] },
    "action_items": [],
    "summary": "An invoice from Acme for $120.50.",
    "urgency_level": "low",
    "requires_follow_up": false
}"#;

/// Completion fake: answers the classification and summary calls with
/// canned JSON and counts how often it was hit.
struct ScriptedChat {
    calls: AtomicUsize,
}

impl ScriptedChat {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn complete(&self, request: ChatRequest) -> Result<ChatOutput, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let system = match &request.messages[0].content {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(_) => String::new(),
        };
        let content = if system.contains("document classification") {
            CLASSIFICATION_JSON
        } else {
            SUMMARY_JSON
        };
        Ok(ChatOutput {
            content: content.to_string(),
            total_tokens: Some(200),
        })
    }
}

fn app_with(chat: Arc<ScriptedChat>, config: Config) -> Router {
    let state = AppState::with_collaborators(
        Arc::new(config),
        chat,
        Arc::new(NoopPromptOverrides),
        Arc::new(NoopTraceSink),
    );
    routes::router(state)
}

fn app(chat: Arc<ScriptedChat>) -> Router {
    app_with(chat, Config::new("127.0.0.1:0", "sk-test"))
}

fn multipart_upload(filename: &str, mime: &str, payload: &[u8]) -> Request<Body> {
    let boundary = "api-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"document\"; \
             filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/process-document")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn uploaded_text_file_gets_classified_and_summarized() {
    let chat = ScriptedChat::new();
    let response = app(chat.clone())
        .oneshot(multipart_upload(
            "invoice.txt",
            "text/plain",
            b"Invoice #42 from Acme, total $120.50",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["classification"]["category"], "Receipt/Invoice");
    assert_eq!(body["data"]["summary"]["urgency_level"], "low");
    assert_eq!(body["data"]["metadata"]["source"]["type"], "file");
    assert_eq!(body["data"]["metadata"]["source"]["name"], "invoice.txt");
    assert!(body["data"]["metadata"]["processing_time_ms"].is_u64());
    // classification and summary are separate completion calls
    assert_eq!(chat.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn empty_json_body_is_rejected_before_any_model_call() {
    let chat = ScriptedChat::new();
    let request = Request::builder()
        .method("POST")
        .uri("/process-document")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from("{}"))
        .unwrap();

    let response = app(chat.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "You must send a file or a URL");
    assert!(body["hint"].as_str().unwrap().contains("url"));
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn disallowed_upload_type_is_a_validation_error() {
    let chat = ScriptedChat::new();
    let response = app(chat.clone())
        .oneshot(multipart_upload("movie.mp4", "video/mp4", b"\x00\x00"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "File type not allowed: video/mp4");
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn oversized_upload_is_a_validation_error() {
    let chat = ScriptedChat::new();
    let app = app_with(
        chat.clone(),
        Config::new("127.0.0.1:0", "sk-test").with_max_file_size(16),
    );
    let response = app
        .oneshot(multipart_upload(
            "big.txt",
            "text/plain",
            "far more than sixteen bytes of text".as_bytes(),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "File too large");
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn extraction_failure_returns_the_processing_envelope() {
    let chat = ScriptedChat::new();
    let response = app(chat.clone())
        .oneshot(multipart_upload("blank.txt", "text/plain", b"   \n\t  "))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Error processing the document");
    assert!(
        body["details"]
            .as_str()
            .unwrap()
            .contains("no text could be extracted")
    );
    assert!(body["processing_time_ms"].is_u64());
    assert!(!body["hint"].as_str().unwrap().is_empty());
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn url_document_is_downloaded_and_processed() {
    let remote = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs/invoice.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("Invoice #42 from Acme, total $120.50".as_bytes())
                .insert_header("Content-Type", "text/plain; charset=utf-8"),
        )
        .mount(&remote)
        .await;

    let url = format!("{}/docs/invoice.txt", remote.uri());
    let chat = ScriptedChat::new();
    let request = Request::builder()
        .method("POST")
        .uri("/process-document")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(format!("{{\"url\":\"{url}\"}}")))
        .unwrap();

    let response = app(chat.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["metadata"]["source"]["type"], "url");
    assert_eq!(body["data"]["metadata"]["source"]["url"], url);
    assert_eq!(chat.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unreachable_url_is_a_processing_error() {
    let remote = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&remote)
        .await;

    let url = format!("{}/gone.pdf", remote.uri());
    let chat = ScriptedChat::new();
    let request = Request::builder()
        .method("POST")
        .uri("/process-document")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(format!("{{\"url\":\"{url}\"}}")))
        .unwrap();

    let response = app(chat.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["details"].as_str().unwrap().contains("404"));
    assert_eq!(chat.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn health_and_info_are_served_by_the_full_router() {
    let chat = ScriptedChat::new();
    let app = app(chat);

    let health = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let body = json_body(health).await;
    assert_eq!(body["status"], "ok");

    let info = app
        .oneshot(
            Request::builder()
                .uri("/info")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(info.status(), StatusCode::OK);
    let body = json_body(info).await;
    assert!(body["supported_file_types"].as_array().unwrap().len() >= 10);
    assert_eq!(body["features"]["vision_ai_support"], true);
}
