//! Best-effort per-request tracing of pipeline steps.
//!
//! The sink is a capability injected into the pipeline: every step reports
//! its input and either a truncated output preview or an error message.
//! Sink failures are caught inside the trait implementations and logged at
//! `warn`; the primary flow never observes them. That policy lives here, at
//! the sink boundary, not at the call sites.

pub mod http;
pub mod noop;

pub use http::HttpTraceSink;
pub use noop::NoopTraceSink;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Output previews recorded with a step are clipped to this many characters.
pub const PREVIEW_CHARS: usize = 500;

/// Per-request token handed out by [`TraceSink::begin`] and threaded through
/// every pipeline step.
#[derive(Debug, Clone, Serialize)]
pub struct TraceSession {
    pub execution_id: Uuid,
    pub agent: &'static str,
}

impl TraceSession {
    pub fn new(agent: &'static str) -> Self {
        Self {
            execution_id: Uuid::new_v4(),
            agent,
        }
    }
}

/// One recorded pipeline step: input plus output or error, never both.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    pub step: String,
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StepRecord {
    pub fn output(step: impl Into<String>, input: Value, output: Value) -> Self {
        Self {
            step: step.into(),
            input,
            output: Some(output),
            error: None,
        }
    }

    pub fn error(step: impl Into<String>, input: Value, error: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            input,
            output: None,
            error: Some(error.into()),
        }
    }
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait TraceSink: Send + Sync {
    /// Open a tracing session for one request. Never fails; a sink that
    /// cannot reach its backend still hands out a local session token.
    async fn begin(&self, agent: &'static str) -> TraceSession;

    /// Record one step. Fire-and-forget from the pipeline's perspective.
    async fn record(&self, session: &TraceSession, record: StepRecord);

    /// Close the session.
    async fn end(&self, session: &TraceSession);
}

/// Clip `text` to [`PREVIEW_CHARS`] characters for step records.
pub fn preview(text: &str) -> String {
    let mut end = text.len().min(PREVIEW_CHARS);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    if end < text.len() {
        format!("{}...", &text[..end])
    } else {
        text.to_string()
    }
}
