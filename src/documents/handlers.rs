use std::time::Instant;

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    agent::AGENT_NAME,
    app_state::AppState,
    documents::dtos::{
        AnalysisData, ProcessResponse, ProcessingErrorResponse, ResponseMetadata, SourceInfo,
        UrlRequest, ValidationErrorResponse,
    },
    extract::{DocumentInput, ExtractError},
    observability::{StepRecord, TraceSession},
};

const MISSING_INPUT_HINT: &str =
    "Use form-data with key \"document\" for files, or JSON with key \"url\" for URLs";
const PROCESSING_HINT: &str =
    "Verify that the file is valid and that your completion API key is configured";

/// What the request body resolved to after parsing.
enum ParsedBody {
    File {
        data: Bytes,
        name: String,
        mime: String,
    },
    Url(String),
    Missing,
}

/// Process one document: multipart upload or JSON URL, extraction, then
/// classification and summary.
#[utoipa::path(
    post,
    path = "/process-document",
    tag = "documents",
    request_body(content = UrlRequest, description = "Document URL; alternatively send the file itself as multipart form-data under the \"document\" key"),
    responses(
        (status = 200, description = "Document classified and summarized", body = ProcessResponse),
        (status = 400, description = "No document provided, unsupported type, or file too large", body = ValidationErrorResponse),
        (status = 500, description = "Extraction or analysis failed", body = ProcessingErrorResponse)
    )
)]
pub async fn process_document(State(state): State<AppState>, request: Request) -> Response {
    let started = Instant::now();
    let session = state.sink.begin(AGENT_NAME).await;

    let parsed = match parse_body(&state, request).await {
        Ok(parsed) => parsed,
        Err(response) => {
            state.sink.end(&session).await;
            return response;
        }
    };

    record_request_start(&state, &session, &parsed).await;

    let (input, source) = match parsed {
        ParsedBody::File { data, name, mime } => {
            if !state.config.is_allowed_mime(&mime) {
                return validation_error(
                    &state,
                    &session,
                    format!("File type not allowed: {mime}"),
                    "See GET /info for the list of supported file types",
                )
                .await;
            }
            if data.len() > state.config.max_file_size() {
                return validation_error(
                    &state,
                    &session,
                    "File too large".to_string(),
                    "Reduce the file size or raise the configured limit",
                )
                .await;
            }
            let source = SourceInfo::File {
                name: name.clone(),
                size: data.len(),
                mime_type: mime.clone(),
            };
            info!(name, mime, size = data.len(), "processing uploaded file");
            (
                DocumentInput::Bytes {
                    data,
                    content_type: Some(mime),
                    filename: Some(name),
                },
                source,
            )
        }
        ParsedBody::Url(url) => {
            info!(url, "processing document from URL");
            (
                DocumentInput::Url(url.clone()),
                SourceInfo::Url { url },
            )
        }
        ParsedBody::Missing => {
            return validation_error(
                &state,
                &session,
                "You must send a file or a URL".to_string(),
                MISSING_INPUT_HINT,
            )
            .await;
        }
    };

    let text = match state.pipeline.extract(input, &session).await {
        Ok(text) => text,
        Err(err) => {
            warn!(%err, "text extraction failed");
            return processing_error(&state, &session, started, err.to_string(), extract_hint(&err))
                .await;
        }
    };

    state
        .sink
        .record(
            &session,
            StepRecord::output(
                "text_extraction_complete",
                json!({ "source": &source }),
                json!({
                    "extracted_length": text.len(),
                    "word_count": text.split_whitespace().count(),
                }),
            ),
        )
        .await;

    let analysis = match state.agent.process(&text, &session).await {
        Ok(analysis) => analysis,
        Err(err) => {
            warn!(%err, "document analysis failed");
            let hint = err.hint();
            return processing_error(&state, &session, started, err.to_string(), hint).await;
        }
    };

    let processing_time_ms = started.elapsed().as_millis() as u64;
    state
        .sink
        .record(
            &session,
            StepRecord::output(
                "api_request_complete",
                json!({ "source": &source }),
                json!({
                    "success": true,
                    "processing_time_ms": processing_time_ms,
                    "category": analysis.classification.category,
                }),
            ),
        )
        .await;
    state.sink.end(&session).await;

    info!(processing_time_ms, "document processed");

    Json(ProcessResponse {
        success: true,
        data: AnalysisData {
            classification: analysis.classification,
            summary: analysis.summary,
            metadata: ResponseMetadata {
                analysis: analysis.metadata,
                source,
                processing_time_ms,
            },
        },
    })
    .into_response()
}

/// Parse the request body by its content type: multipart uploads carry the
/// file under the `document` key, everything else is treated as the JSON
/// URL form.
async fn parse_body(state: &AppState, request: Request) -> Result<ParsedBody, Response> {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, state)
            .await
            .map_err(|err| bad_request(err.to_string(), MISSING_INPUT_HINT))?;

        loop {
            let field = match multipart.next_field().await {
                Ok(Some(field)) => field,
                Ok(None) => return Ok(ParsedBody::Missing),
                Err(err) => return Err(bad_request(err.to_string(), MISSING_INPUT_HINT)),
            };
            if field.name() != Some("document") {
                continue;
            }

            let name = field.file_name().unwrap_or("unnamed").to_string();
            let mime = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|err| bad_request(err.to_string(), MISSING_INPUT_HINT))?;
            return Ok(ParsedBody::File { data, name, mime });
        }
    }

    match Json::<UrlRequest>::from_request(request, state).await {
        Ok(Json(UrlRequest { url: Some(url) })) if !url.trim().is_empty() => {
            Ok(ParsedBody::Url(url))
        }
        _ => Ok(ParsedBody::Missing),
    }
}

async fn record_request_start(state: &AppState, session: &TraceSession, parsed: &ParsedBody) {
    let input = match parsed {
        ParsedBody::File { data, name, mime } => json!({
            "has_file": true,
            "has_url": false,
            "file_info": { "name": name, "mime_type": mime, "size": data.len() },
        }),
        ParsedBody::Url(url) => json!({ "has_file": false, "has_url": true, "url": url }),
        ParsedBody::Missing => json!({ "has_file": false, "has_url": false }),
    };
    state
        .sink
        .record(
            session,
            StepRecord::output("api_request_start", input, json!({})),
        )
        .await;
}

fn extract_hint(err: &ExtractError) -> &'static str {
    match err {
        ExtractError::Empty => "Make sure the document contains extractable text",
        ExtractError::UnsupportedFormat(_) => "See GET /info for the list of supported file types",
        ExtractError::Fetch(_) => "Verify that the URL is reachable and points to a document",
        ExtractError::Extraction { .. } => PROCESSING_HINT,
    }
}

fn bad_request(error: String, hint: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ValidationErrorResponse {
            error,
            hint: hint.to_string(),
        }),
    )
        .into_response()
}

async fn validation_error(
    state: &AppState,
    session: &TraceSession,
    error: String,
    hint: &str,
) -> Response {
    state
        .sink
        .record(
            session,
            StepRecord::error("api_validation_error", json!({}), error.clone()),
        )
        .await;
    state.sink.end(session).await;
    bad_request(error, hint)
}

async fn processing_error(
    state: &AppState,
    session: &TraceSession,
    started: Instant,
    details: String,
    hint: &str,
) -> Response {
    let processing_time_ms = started.elapsed().as_millis() as u64;
    state
        .sink
        .record(
            session,
            StepRecord::error(
                "api_request_error",
                json!({ "processing_time_ms": processing_time_ms }),
                details.clone(),
            ),
        )
        .await;
    state.sink.end(session).await;

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ProcessingErrorResponse {
            success: false,
            error: "Error processing the document".to_string(),
            details,
            processing_time_ms,
            hint: hint.to_string(),
        }),
    )
        .into_response()
}
