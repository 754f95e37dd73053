//! Document analysis agent: classification plus structured summary.
//!
//! Both calls go through the [`ChatClient`] trait with temperature 0 and a
//! `json_object` response format, and their JSON outputs are parsed into
//! typed results. The two calls are independent, so one document analysis
//! runs them concurrently.

pub mod prompts;
pub mod types;

pub use types::{
    AnalysisMetadata, ClassificationResult, Confidence, DocumentAnalysis, ImportantDetails,
    SummaryResult, Urgency,
};

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;
use tracing::instrument;

use crate::llm::{ChatClient, ChatMessage, ChatRequest, LlmError};
use crate::observability::{StepRecord, TraceSession, TraceSink, preview};
use self::prompts::{
    CATEGORIES, CLASSIFY_PROMPT_ID, PromptOverrides, SUMMARIZE_PROMPT_ID, SUMMARY_SYSTEM_PROMPT,
    classification_system_prompt, resolve_system_prompt,
};

/// Agent name reported to the trace sink.
pub const AGENT_NAME: &str = "document_classification";

/// Document bytes beyond this many are dropped from the classification
/// prompt.
const CLASSIFY_CONTENT_BUDGET: usize = 3000;
/// Document bytes beyond this many are dropped from the summary prompt.
const SUMMARY_CONTENT_BUDGET: usize = 4000;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("the document is empty or does not contain valid text")]
    EmptyDocument,

    #[error("{step} completion failed: {source}")]
    Completion {
        step: &'static str,
        #[source]
        source: LlmError,
    },

    #[error("{step} returned invalid JSON: {message}")]
    InvalidJson { step: &'static str, message: String },
}

impl AgentError {
    /// Actionable hint surfaced to API clients alongside the error.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::EmptyDocument => "Make sure the document contains extractable text",
            Self::Completion {
                source: LlmError::Auth(_),
                ..
            } => "Verify that the completion API key is configured correctly",
            Self::Completion {
                source: LlmError::QuotaExhausted(_),
                ..
            } => "The completion account has reached its usage limit. Check your balance",
            Self::Completion {
                source: LlmError::RateLimited(_),
                ..
            } => "Too many requests too fast. Wait a moment and try again",
            _ => "Try again in a few moments",
        }
    }
}

/// Clip `text` to at most `budget` bytes (respecting char boundaries),
/// marking the cut with an ellipsis.
fn clip_content(text: &str, budget: usize) -> String {
    if text.len() <= budget {
        return text.to_string();
    }
    let mut end = budget;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Prompt construction is pure: the same system prompt and content always
/// produce the same request.
pub(crate) fn build_analysis_request(system_prompt: &str, content: &str, budget: usize) -> ChatRequest {
    ChatRequest {
        messages: vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(clip_content(content, budget)),
        ],
        temperature: 0.0,
        max_tokens: None,
        json_response: true,
    }
}

pub struct DocumentAgent {
    chat: Arc<dyn ChatClient>,
    overrides: Arc<dyn PromptOverrides>,
    sink: Arc<dyn TraceSink>,
}

impl DocumentAgent {
    pub fn new(
        chat: Arc<dyn ChatClient>,
        overrides: Arc<dyn PromptOverrides>,
        sink: Arc<dyn TraceSink>,
    ) -> Self {
        Self {
            chat,
            overrides,
            sink,
        }
    }

    /// Analyze one document: classification and summary, concurrently.
    #[instrument(skip_all, fields(execution_id = %session.execution_id, content_length = content.len()))]
    pub async fn process(
        &self,
        content: &str,
        session: &TraceSession,
    ) -> Result<DocumentAnalysis, AgentError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AgentError::EmptyDocument);
        }

        let metadata = AnalysisMetadata::for_content(content);
        self.sink
            .record(
                session,
                StepRecord::output(
                    "processDocument_start",
                    json!({
                        "content": preview(content),
                        "content_length": metadata.content_length,
                        "word_count": metadata.word_count,
                    }),
                    json!({}),
                ),
            )
            .await;

        let (classification, summary) = tokio::try_join!(
            self.classify(content, session),
            self.summarize(content, session),
        )?;

        let analysis = DocumentAnalysis {
            classification,
            summary,
            metadata,
        };

        self.sink
            .record(
                session,
                StepRecord::output(
                    "processDocument_complete",
                    json!({ "content_length": content.len() }),
                    serde_json::to_value(&analysis).unwrap_or_default(),
                ),
            )
            .await;

        Ok(analysis)
    }

    #[instrument(skip_all)]
    pub async fn classify(
        &self,
        content: &str,
        session: &TraceSession,
    ) -> Result<ClassificationResult, AgentError> {
        let system_prompt = resolve_system_prompt(
            self.overrides.as_ref(),
            CLASSIFY_PROMPT_ID,
            &classification_system_prompt(),
        )
        .await;
        let request = build_analysis_request(&system_prompt, content, CLASSIFY_CONTENT_BUDGET);
        let step_input = json!({
            "document_length": content.len(),
            "categories": CATEGORIES.len(),
        });

        self.run_json_call("classifyDocument", request, step_input, session)
            .await
    }

    #[instrument(skip_all)]
    pub async fn summarize(
        &self,
        content: &str,
        session: &TraceSession,
    ) -> Result<SummaryResult, AgentError> {
        let system_prompt = resolve_system_prompt(
            self.overrides.as_ref(),
            SUMMARIZE_PROMPT_ID,
            SUMMARY_SYSTEM_PROMPT,
        )
        .await;
        let request = build_analysis_request(&system_prompt, content, SUMMARY_CONTENT_BUDGET);
        let step_input = json!({ "document_length": content.len() });

        self.run_json_call("summarizeDocument", request, step_input, session)
            .await
    }

    /// Run one completion call and parse its JSON output into `T`,
    /// recording the step either way.
    async fn run_json_call<T: serde::de::DeserializeOwned + serde::Serialize>(
        &self,
        step: &'static str,
        request: ChatRequest,
        step_input: serde_json::Value,
        session: &TraceSession,
    ) -> Result<T, AgentError> {
        let output = match self.chat.complete(request).await {
            Ok(output) => output,
            Err(source) => {
                let err = AgentError::Completion { step, source };
                self.sink
                    .record(session, StepRecord::error(step, step_input, err.to_string()))
                    .await;
                return Err(err);
            }
        };

        match serde_json::from_str::<T>(&output.content) {
            Ok(parsed) => {
                self.sink
                    .record(
                        session,
                        StepRecord::output(
                            step,
                            step_input,
                            serde_json::to_value(&parsed).unwrap_or_default(),
                        ),
                    )
                    .await;
                Ok(parsed)
            }
            Err(err) => {
                let err = AgentError::InvalidJson {
                    step,
                    message: err.to_string(),
                };
                self.sink
                    .record(session, StepRecord::error(step, step_input, err.to_string()))
                    .await;
                Err(err)
            }
        }
    }
}
