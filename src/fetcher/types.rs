use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use url::Url;

/// A document downloaded from a remote URL.
///
/// `content_type` is whatever the server declared in its `Content-Type`
/// response header; it takes precedence over any type the caller guessed.
#[derive(Debug)]
pub struct FetchedDocument {
    pub url_final: Url,
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub bytes: Bytes,
    pub fetched_at: DateTime<Utc>,
}
