use async_trait::async_trait;

use crate::observability::{StepRecord, TraceSession, TraceSink};

/// Sink used when no trace endpoint is configured. Steps still show up in
/// the local logs at debug level.
pub struct NoopTraceSink;

#[async_trait]
impl TraceSink for NoopTraceSink {
    async fn begin(&self, agent: &'static str) -> TraceSession {
        TraceSession::new(agent)
    }

    async fn record(&self, session: &TraceSession, record: StepRecord) {
        tracing::debug!(
            execution_id = %session.execution_id,
            step = %record.step,
            error = record.error.as_deref().unwrap_or(""),
            "pipeline step"
        );
    }

    async fn end(&self, session: &TraceSession) {
        tracing::debug!(execution_id = %session.execution_id, "tracing session closed");
    }
}
