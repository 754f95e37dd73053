use crate::fetcher::{errors::FetchError, types::FetchedDocument};
use chrono::Utc;
use once_cell::sync::Lazy;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::instrument;

/// Hard cap on downloaded document size.
pub const MAX_BODY_SIZE: u64 = 50 * 1024 * 1024; // 50MB
/// Total time budget for a remote document download.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = "doctriage/0.1 (+https://github.com/doctriage/doctriage)";

static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    ClientBuilder::new()
        .connect_timeout(Duration::from_secs(10))
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .expect("Failed to build HTTP client")
});

/// Download a document from `url`, enforcing the size cap and timeout.
///
/// The download is attempted exactly once; any failure is terminal for the
/// request.
#[instrument(skip_all, fields(url = %url))]
pub async fn fetch(url: &str) -> Result<FetchedDocument, FetchError> {
    fetch_inner(url, MAX_BODY_SIZE, FETCH_TIMEOUT).await
}

/// Same as [`fetch`] but with an explicit size cap, so the overflow path is
/// testable without a 50MB payload.
pub async fn fetch_with_limit(
    url: &str,
    max_body_size: u64,
) -> Result<FetchedDocument, FetchError> {
    fetch_inner(url, max_body_size, FETCH_TIMEOUT).await
}

/// Same as [`fetch`] but with an explicit deadline, so the timeout path is
/// testable without waiting out the 30s budget.
pub async fn fetch_with_timeout(
    url: &str,
    timeout: Duration,
) -> Result<FetchedDocument, FetchError> {
    fetch_inner(url, MAX_BODY_SIZE, timeout).await
}

async fn fetch_inner(
    url: &str,
    max_body_size: u64,
    timeout: Duration,
) -> Result<FetchedDocument, FetchError> {
    let parsed_url = url::Url::parse(url)?;

    let response = HTTP_CLIENT
        .get(parsed_url)
        .timeout(timeout)
        .send()
        .await
        .map_err(FetchError::from_reqwest_error)?;

    // Check content length before downloading
    if let Some(content_length) = response.content_length()
        && content_length > max_body_size
    {
        return Err(FetchError::BodyTooLarge(content_length));
    }

    let url_final = response.url().clone();
    let status = response.status();

    if !status.is_success() {
        return Err(FetchError::Http { status });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|ct| ct.to_str().ok())
        .map(|ct| ct.to_string());

    let bytes = response
        .bytes()
        .await
        .map_err(|e| FetchError::Io(e.to_string()))?;

    // Check body size after download (in case Content-Length was missing)
    if bytes.len() as u64 > max_body_size {
        return Err(FetchError::BodyTooLarge(bytes.len() as u64));
    }

    tracing::debug!(
        size = bytes.len(),
        content_type = content_type.as_deref().unwrap_or("<none>"),
        "download complete"
    );

    Ok(FetchedDocument {
        url_final,
        status,
        content_type,
        bytes,
        fetched_at: Utc::now(),
    })
}
