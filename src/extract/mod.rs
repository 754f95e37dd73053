//! Text extraction pipeline.
//!
//! One extractor per supported content type, dispatched off the declared
//! MIME type. Whatever the source format, the pipeline's output is a single
//! normalized, non-empty text string; producing no text at all is a hard
//! failure, never a silent empty success.

pub mod csv;
pub mod errors;
pub mod image;
pub mod pdf;
pub mod spreadsheet;
pub mod text;
pub mod word;

pub use errors::ExtractError;

use std::sync::{Arc, LazyLock};

use bytes::Bytes;
use regex::Regex;
use serde_json::json;
use tracing::instrument;

use crate::fetcher;
use crate::llm::ChatClient;
use crate::observability::{StepRecord, TraceSession, TraceSink, preview};

/// Content types the pipeline can extract text from. The mapping from MIME
/// type is closed: anything not explicitly recognized is [`Unknown`] and
/// gets a strict last-resort text decode instead of a guessed extractor.
///
/// [`Unknown`]: ContentType::Unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Pdf,
    Image,
    Word,
    Spreadsheet,
    Csv,
    PlainText,
    Unknown,
}

impl ContentType {
    /// Classify a declared MIME type. Parameters (`; charset=...`) are
    /// ignored; matching is case-insensitive.
    pub fn from_mime(mime: Option<&str>) -> Self {
        let Some(mime) = mime else {
            return Self::Unknown;
        };
        let essence = mime
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match essence.as_str() {
            "application/pdf" => Self::Pdf,
            "image/jpeg" | "image/jpg" | "image/png" => Self::Image,
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            | "application/msword" => Self::Word,
            "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => {
                Self::Spreadsheet
            }
            "text/csv" | "application/csv" => Self::Csv,
            "text/plain" => Self::PlainText,
            other if other.starts_with("image/") => Self::Image,
            other if other.starts_with("text/") => Self::PlainText,
            _ => Self::Unknown,
        }
    }

    fn step_name(self) -> &'static str {
        match self {
            Self::Pdf => "extract_text_pdf",
            Self::Image => "extract_text_vision",
            Self::Word => "extract_text_word",
            Self::Spreadsheet => "extract_text_excel",
            Self::Csv => "extract_text_csv",
            Self::PlainText => "extract_text_plain",
            Self::Unknown => "extract_text_auto_detect",
        }
    }
}

/// A document handed to the pipeline: either bytes that arrived in the
/// request, or a URL still to be downloaded.
#[derive(Debug, Clone)]
pub enum DocumentInput {
    Bytes {
        data: Bytes,
        content_type: Option<String>,
        filename: Option<String>,
    },
    Url(String),
}

static RUNS_OF_SPACES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("valid regex"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("valid regex"));

/// Collapse runs of spaces and stacked blank lines, then trim.
pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = RUNS_OF_SPACES.replace_all(text, " ");
    let collapsed = BLANK_LINES.replace_all(&collapsed, "\n\n");
    collapsed.trim().to_string()
}

/// Dispatches a [`DocumentInput`] to the right extractor and records every
/// step with the trace sink.
pub struct ExtractionPipeline {
    chat: Arc<dyn ChatClient>,
    sink: Arc<dyn TraceSink>,
}

impl ExtractionPipeline {
    pub fn new(chat: Arc<dyn ChatClient>, sink: Arc<dyn TraceSink>) -> Self {
        Self { chat, sink }
    }

    /// Resolve `input` to text.
    ///
    /// For URL inputs the document is downloaded first and the server's
    /// `Content-Type` header drives extractor selection. The returned text
    /// is trimmed and guaranteed non-empty.
    #[instrument(skip_all, fields(execution_id = %session.execution_id))]
    pub async fn extract(
        &self,
        input: DocumentInput,
        session: &TraceSession,
    ) -> Result<String, ExtractError> {
        let (data, mime) = match input {
            DocumentInput::Bytes {
                data, content_type, ..
            } => (data, content_type),
            DocumentInput::Url(url) => self.download(&url, session).await?,
        };

        let kind = ContentType::from_mime(mime.as_deref());
        let step = kind.step_name();
        let step_input = json!({ "content_type": mime, "size": data.len() });

        match self.run_extractor(kind, &data, mime.as_deref()).await {
            Ok(raw) => {
                let text = raw.trim().to_string();
                if text.is_empty() {
                    let err = ExtractError::Empty;
                    self.sink
                        .record(session, StepRecord::error(step, step_input, err.to_string()))
                        .await;
                    return Err(err);
                }
                self.sink
                    .record(
                        session,
                        StepRecord::output(
                            step,
                            step_input,
                            json!({ "chars": text.len(), "preview": preview(&text) }),
                        ),
                    )
                    .await;
                Ok(text)
            }
            Err(err) => {
                self.sink
                    .record(session, StepRecord::error(step, step_input, err.to_string()))
                    .await;
                Err(err)
            }
        }
    }

    async fn download(
        &self,
        url: &str,
        session: &TraceSession,
    ) -> Result<(Bytes, Option<String>), ExtractError> {
        let step_input = json!({ "url": url });
        match fetcher::fetch(url).await {
            Ok(doc) => {
                self.sink
                    .record(
                        session,
                        StepRecord::output(
                            "download_from_url",
                            step_input,
                            json!({
                                "status": doc.status.as_u16(),
                                "size": doc.bytes.len(),
                                "content_type": doc.content_type,
                                "fetched_at": doc.fetched_at.to_rfc3339(),
                            }),
                        ),
                    )
                    .await;
                Ok((doc.bytes, doc.content_type))
            }
            Err(err) => {
                self.sink
                    .record(
                        session,
                        StepRecord::error("download_from_url", step_input, err.to_string()),
                    )
                    .await;
                Err(err.into())
            }
        }
    }

    async fn run_extractor(
        &self,
        kind: ContentType,
        data: &Bytes,
        mime: Option<&str>,
    ) -> Result<String, ExtractError> {
        match kind {
            ContentType::Pdf => {
                let data = data.clone();
                let parsed = tokio::task::spawn_blocking(move || pdf::extract(&data))
                    .await
                    .map_err(|e| ExtractError::extraction("pdf", e.to_string()))??;
                tracing::info!(pages = parsed.pages, "pdf text extracted");
                Ok(parsed.text)
            }
            ContentType::Image => {
                let mime = mime.unwrap_or("image/png");
                image::extract(self.chat.as_ref(), data, mime).await
            }
            ContentType::Word => word::extract(data),
            ContentType::Spreadsheet => {
                let data = data.clone();
                tokio::task::spawn_blocking(move || spreadsheet::extract(&data))
                    .await
                    .map_err(|e| ExtractError::extraction("spreadsheet", e.to_string()))?
            }
            ContentType::Csv => csv::extract(data),
            ContentType::PlainText => text::extract(data),
            ContentType::Unknown => text::extract_unknown(data),
        }
    }
}
