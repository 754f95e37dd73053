//! Configuration handling for the application.
//!
//! Everything is loaded once at startup from environment variables with
//! development defaults where a default is safe. The OpenAI API key has no
//! default; `Config::from_env` fails without it. Tests construct configs
//! explicitly through `Config::new` and the builder-style setters.

use std::env;

/// Environment variable names. Keeping them public lets tests and deployment
/// tooling refer to them directly.
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_OPENAI_MODEL: &str = "OPENAI_MODEL";
pub const ENV_MAX_FILE_SIZE: &str = "MAX_FILE_SIZE";
pub const ENV_TRACE_ENDPOINT: &str = "TRACE_ENDPOINT";
pub const ENV_TRACE_API_KEY: &str = "TRACE_API_KEY";
pub const ENV_PROMPT_SERVICE_URL: &str = "PROMPT_SERVICE_URL";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_FILE_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// MIME types accepted for upload. Anything else is rejected before an
/// extractor runs.
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/jpeg",
    "image/jpg",
    "image/png",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/msword",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/csv",
    "application/csv",
    "application/octet-stream",
    "text/plain",
];

/// Application runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    bind_addr: String,
    openai_api_key: String,
    openai_base_url: String,
    openai_model: String,
    max_file_size: usize,
    trace_endpoint: Option<String>,
    trace_api_key: Option<String>,
    prompt_service_url: Option<String>,
}

impl Config {
    /// Create a new config explicitly with defaults for everything that has
    /// a safe default.
    pub fn new(bind_addr: impl Into<String>, openai_api_key: impl Into<String>) -> Self {
        Self {
            bind_addr: bind_addr.into(),
            openai_api_key: openai_api_key.into(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            trace_endpoint: None,
            trace_api_key: None,
            prompt_service_url: None,
        }
    }

    /// Load from environment variables, falling back to development defaults.
    ///
    /// Fails when `OPENAI_API_KEY` is absent or `MAX_FILE_SIZE` is not a
    /// number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let openai_api_key =
            env::var(ENV_OPENAI_API_KEY).map_err(|_| ConfigError::MissingValue {
                field: ENV_OPENAI_API_KEY,
            })?;

        let max_file_size = match env::var(ENV_MAX_FILE_SIZE) {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_MAX_FILE_SIZE,
                reason: format!("'{raw}' is not a valid byte count"),
            })?,
            Err(_) => DEFAULT_MAX_FILE_SIZE,
        };

        Ok(Self {
            bind_addr: env::var(ENV_BIND_ADDR).unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            openai_api_key,
            openai_base_url: env::var(ENV_OPENAI_BASE_URL)
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_model: env::var(ENV_OPENAI_MODEL)
                .unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string()),
            max_file_size,
            trace_endpoint: env::var(ENV_TRACE_ENDPOINT).ok(),
            trace_api_key: env::var(ENV_TRACE_API_KEY).ok(),
            prompt_service_url: env::var(ENV_PROMPT_SERVICE_URL).ok(),
        })
    }

    pub fn with_openai_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.openai_base_url = base_url.into();
        self
    }

    pub fn with_openai_model(mut self, model: impl Into<String>) -> Self {
        self.openai_model = model.into();
        self
    }

    pub fn with_max_file_size(mut self, max_file_size: usize) -> Self {
        self.max_file_size = max_file_size;
        self
    }

    pub fn with_trace_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.trace_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_prompt_service_url(mut self, url: impl Into<String>) -> Self {
        self.prompt_service_url = Some(url.into());
        self
    }

    /// TCP bind address (host:port) for the HTTP server.
    pub fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    pub fn openai_api_key(&self) -> &str {
        &self.openai_api_key
    }

    pub fn openai_base_url(&self) -> &str {
        &self.openai_base_url
    }

    pub fn openai_model(&self) -> &str {
        &self.openai_model
    }

    /// Maximum accepted upload size in bytes.
    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Observability sink endpoint; `None` disables remote tracing.
    pub fn trace_endpoint(&self) -> Option<&str> {
        self.trace_endpoint.as_deref()
    }

    pub fn trace_api_key(&self) -> Option<&str> {
        self.trace_api_key.as_deref()
    }

    /// Prompt-optimization service base URL; `None` means built-in prompts
    /// are always used.
    pub fn prompt_service_url(&self) -> Option<&str> {
        self.prompt_service_url.as_deref()
    }

    /// Whether a declared MIME type is in the upload allow-list. Parameters
    /// after `;` are ignored.
    pub fn is_allowed_mime(&self, mime: &str) -> bool {
        let essence = mime
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        ALLOWED_MIME_TYPES.contains(&essence.as_str())
    }
}

/// Errors that can occur while building a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable '{field}'")]
    MissingValue { field: &'static str },
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
