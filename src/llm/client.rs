use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::Config;
use crate::llm::{ChatClient, ChatOutput, ChatRequest, LlmError};

/// Generous ceiling; vision calls on large documents can run long.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiChatClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatClient {
    pub fn new(base_url: &str, api_key: &str, model: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client build never fails with valid TLS config");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.openai_base_url(),
            config.openai_api_key(),
            config.openai_model(),
        )
    }

    fn classify_failure(status: StatusCode, body: &str) -> LlmError {
        let detail: Option<ApiErrorBody> = serde_json::from_str(body).ok();
        let code = detail
            .as_ref()
            .and_then(|d| d.error.code.as_deref().map(str::to_string));
        let message = detail
            .map(|d| d.error.message)
            .unwrap_or_else(|| body.trim().to_string());

        match status.as_u16() {
            401 | 403 => LlmError::Auth(message),
            429 if code.as_deref() == Some("insufficient_quota") => {
                LlmError::QuotaExhausted(message)
            }
            429 => LlmError::RateLimited(message),
            _ => LlmError::Api {
                status: status.as_u16(),
                message,
            },
        }
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    #[tracing::instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, request: ChatRequest) -> Result<ChatOutput, LlmError> {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "stream": false,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = max_tokens.into();
        }
        if request.json_response {
            body["response_format"] = serde_json::json!({ "type": "json_object" });
        }

        let url = format!("{}/v1/chat/completions", self.base_url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::classify_failure(status, &text));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(|e| LlmError::MalformedResponse(e.to_string()))?;

        let total_tokens = completion.usage.and_then(|u| u.total_tokens);
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                LlmError::MalformedResponse("no choices in completion response".to_string())
            })?;

        tracing::debug!(chars = content.len(), ?total_tokens, "completion received");

        Ok(ChatOutput {
            content,
            total_tokens,
        })
    }
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failures_classify_from_status() {
        let err = OpenAiChatClient::classify_failure(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"Incorrect API key provided","code":"invalid_api_key"}}"#,
        );
        assert!(matches!(err, LlmError::Auth(_)));
    }

    #[test]
    fn quota_exhaustion_classifies_from_error_code() {
        let err = OpenAiChatClient::classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"You exceeded your current quota","code":"insufficient_quota"}}"#,
        );
        assert!(matches!(err, LlmError::QuotaExhausted(_)));
    }

    #[test]
    fn plain_429_classifies_as_rate_limit() {
        let err = OpenAiChatClient::classify_failure(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"message":"Rate limit reached","code":"rate_limit_exceeded"}}"#,
        );
        assert!(matches!(err, LlmError::RateLimited(_)));
    }

    #[test]
    fn unstructured_body_falls_back_to_raw_text() {
        let err = OpenAiChatClient::classify_failure(StatusCode::BAD_GATEWAY, "upstream down");
        match err {
            LlmError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "upstream down");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
