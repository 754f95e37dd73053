use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::observability::{StepRecord, TraceSession, TraceSink};

const SINK_TIMEOUT: Duration = Duration::from_secs(5);

/// Posts trace events to a remote observability backend.
///
/// Every request failure is swallowed here: the sink exists for later
/// inspection, not for correctness.
pub struct HttpTraceSink {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpTraceSink {
    pub fn new(endpoint: &str, api_key: Option<&str>) -> Self {
        let client = Client::builder()
            .timeout(SINK_TIMEOUT)
            .build()
            .expect("reqwest client build never fails with valid TLS config");
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) {
        let url = format!("{}/{path}", self.endpoint);
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        match request.send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(%url, status = %response.status(), "trace sink rejected event");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(%url, %err, "trace sink request failed");
            }
        }
    }
}

#[async_trait]
impl TraceSink for HttpTraceSink {
    async fn begin(&self, agent: &'static str) -> TraceSession {
        let session = TraceSession::new(agent);
        self.post(
            "tracing/start",
            json!({
                "executionId": session.execution_id,
                "agentName": agent,
            }),
        )
        .await;
        session
    }

    async fn record(&self, session: &TraceSession, record: StepRecord) {
        self.post(
            "tracing/track",
            json!({
                "executionId": session.execution_id,
                "agentName": session.agent,
                "record": record,
            }),
        )
        .await;
    }

    async fn end(&self, session: &TraceSession) {
        self.post(
            "tracing/end",
            json!({
                "executionId": session.execution_id,
                "agentName": session.agent,
            }),
        )
        .await;
    }
}
