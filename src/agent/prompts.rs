//! System prompts for the two analysis calls, plus optional remote
//! overrides.
//!
//! A prompt-optimization service can serve tuned replacements for either
//! system prompt, looked up by prompt id on every call. When the service is
//! unconfigured, unreachable, or has no override, the built-in prompt is
//! used; override lookups never fail the request.

use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use serde::Deserialize;

/// Prompt id for the classification system prompt.
pub const CLASSIFY_PROMPT_ID: &str = "classifyDocument";
/// Prompt id for the summarization system prompt.
pub const SUMMARIZE_PROMPT_ID: &str = "summarizeDocument";

/// Categories the classifier may choose from.
pub const CATEGORIES: [&str; 13] = [
    "Receipt/Invoice",
    "Contract/NDA",
    "Report/Document",
    "Email/Letter",
    "CV/Resume",
    "Legal Document",
    "Medical Document",
    "Financial Document",
    "Presentation",
    "Spreadsheet",
    "Technical Document",
    "Manual/Guide",
    "Other",
];

pub fn classification_system_prompt() -> String {
    let category_list = CATEGORIES
        .iter()
        .map(|category| format!("- {category}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are an expert in document classification. Your job is to analyze documents and classify them with precision.

AVAILABLE CATEGORIES:
{category_list}

Instructions:
1. Read the document carefully
2. Identify the document type based on its content, structure and purpose
3. Assign the most appropriate category
4. Indicate your confidence level (high/medium/low)
5. Briefly explain why you chose that category

JSON RESPONSE:
{{
    "category": "main category",
    "subcategory": "specific type if applicable",
    "confidence": "high/medium/low",
    "explanation": "brief explanation of why this is the category",
    "detected_language": "detected language",
    "keywords": ["word1", "word2", "word3"]
}}

Always respond in valid JSON format."#
    )
}

pub const SUMMARY_SYSTEM_PROMPT: &str = r#"You are an expert in document analysis and summarization. Your job is to create complete and structured summaries.

Instructions:
1. Identify the main purpose of the document
2. Extract the most important points
3. Identify relevant dates, numbers and figures
4. Identify people, companies or organizations mentioned
5. Identify any required actions or next steps
6. Create a concise but complete summary

JSON RESPONSE:
{
    "main_purpose": "main purpose of the document in one sentence",
    "key_points": ["important point 1", "important point 2", "important point 3"],
    "important_details": {
        "dates": ["date1", "date2"],
        "amounts": ["amount1", "amount2"],
        "parties": ["person/company1", "person/company2"],
        "locations": ["location1", "location2"]
    },
    "action_items": ["required action 1", "required action 2"],
    "summary": "concise summary of 2-3 sentences",
    "urgency_level": "low/medium/high",
    "requires_follow_up": true/false
}

Always respond in valid JSON format with structured and precise information."#;

/// Source of tuned system-prompt replacements.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PromptOverrides: Send + Sync {
    /// Look up an override for `prompt_id`. `None` means "use the
    /// built-in prompt", whether because there is no override or because
    /// the lookup failed.
    async fn fetch(&self, prompt_id: &str) -> Option<String>;
}

/// Pick the system prompt for a call: the remote override when one exists,
/// otherwise `default`.
pub async fn resolve_system_prompt(
    overrides: &dyn PromptOverrides,
    prompt_id: &str,
    default: &str,
) -> String {
    match overrides.fetch(prompt_id).await {
        Some(prompt) => {
            tracing::debug!(prompt_id, "using optimized prompt override");
            prompt
        }
        None => default.to_string(),
    }
}

const OVERRIDE_TIMEOUT: Duration = Duration::from_secs(5);

/// Fetches prompt overrides from a remote prompt-optimization service.
pub struct HttpPromptOverrides {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct PromptResponse {
    prompt: Option<String>,
}

impl HttpPromptOverrides {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Self {
        let client = Client::builder()
            .timeout(OVERRIDE_TIMEOUT)
            .build()
            .expect("reqwest client build never fails with valid TLS config");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
        }
    }
}

#[async_trait]
impl PromptOverrides for HttpPromptOverrides {
    async fn fetch(&self, prompt_id: &str) -> Option<String> {
        let url = format!("{}/prompts/{prompt_id}", self.base_url);
        let mut request = self.client.get(&url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = match request.send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::warn!(%url, status = %response.status(), "prompt override lookup rejected");
                return None;
            }
            Err(err) => {
                tracing::warn!(%url, %err, "prompt override lookup failed");
                return None;
            }
        };

        match response.json::<PromptResponse>().await {
            Ok(body) => body.prompt,
            Err(err) => {
                tracing::warn!(%url, %err, "prompt override response was not valid JSON");
                None
            }
        }
    }
}

/// Override source that always falls back to the built-in prompts.
pub struct NoopPromptOverrides;

#[async_trait]
impl PromptOverrides for NoopPromptOverrides {
    async fn fetch(&self, _prompt_id: &str) -> Option<String> {
        None
    }
}
