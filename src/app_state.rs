use std::sync::Arc;
use std::time::Instant;

use crate::agent::DocumentAgent;
use crate::agent::prompts::{HttpPromptOverrides, NoopPromptOverrides, PromptOverrides};
use crate::config::Config;
use crate::extract::ExtractionPipeline;
use crate::llm::{ChatClient, OpenAiChatClient};
use crate::observability::{HttpTraceSink, NoopTraceSink, TraceSink};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: Arc<ExtractionPipeline>,
    pub agent: Arc<DocumentAgent>,
    pub sink: Arc<dyn TraceSink>,
    pub started_at: Instant,
}

impl AppState {
    /// Wire production collaborators from the configuration. Remote tracing
    /// and prompt overrides are optional; unconfigured, they degrade to
    /// no-ops.
    pub fn new(config: Config) -> Self {
        let chat: Arc<dyn ChatClient> = Arc::new(OpenAiChatClient::from_config(&config));
        let sink: Arc<dyn TraceSink> = match config.trace_endpoint() {
            Some(endpoint) => Arc::new(HttpTraceSink::new(endpoint, config.trace_api_key())),
            None => Arc::new(NoopTraceSink),
        };
        let overrides: Arc<dyn PromptOverrides> = match config.prompt_service_url() {
            Some(url) => Arc::new(HttpPromptOverrides::new(url, config.trace_api_key())),
            None => Arc::new(NoopPromptOverrides),
        };
        Self::with_collaborators(Arc::new(config), chat, overrides, sink)
    }

    /// Wire explicit collaborators. Tests use this to substitute fakes for
    /// the completion client, prompt overrides, and trace sink.
    pub fn with_collaborators(
        config: Arc<Config>,
        chat: Arc<dyn ChatClient>,
        overrides: Arc<dyn PromptOverrides>,
        sink: Arc<dyn TraceSink>,
    ) -> Self {
        Self {
            config,
            pipeline: Arc::new(ExtractionPipeline::new(chat.clone(), sink.clone())),
            agent: Arc::new(DocumentAgent::new(chat, overrides, sink.clone())),
            sink,
            started_at: Instant::now(),
        }
    }

    pub fn tracing_enabled(&self) -> bool {
        self.config.trace_endpoint().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_collaborators_are_wired_when_configured() {
        let state = AppState::new(
            Config::new("127.0.0.1:0", "sk-test")
                .with_trace_endpoint("https://trace.example.com")
                .with_prompt_service_url("https://prompts.example.com"),
        );
        assert!(state.tracing_enabled());
    }

    #[test]
    fn tracing_is_disabled_without_an_endpoint() {
        let state = AppState::new(Config::new("127.0.0.1:0", "sk-test"));
        assert!(!state.tracing_enabled());
    }
}
