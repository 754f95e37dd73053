use std::time::Duration;

use doctriage::fetcher::client::{fetch_with_limit, fetch_with_timeout};
use doctriage::fetcher::{FetchError, fetch};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

#[tokio::test]
async fn fetch_returns_bytes_and_header_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/report.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("Quarterly numbers look good".as_bytes())
                .insert_header("Content-Type", "text/plain; charset=utf-8"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/report.txt", mock_server.uri());
    let result = fetch(&url).await.unwrap();

    assert!(result.status.is_success());
    assert_eq!(result.bytes.as_ref(), b"Quarterly numbers look good");
    assert_eq!(
        result.content_type.as_deref(),
        Some("text/plain; charset=utf-8")
    );
    assert_eq!(result.url_final.as_str(), url);
}

#[tokio::test]
async fn missing_content_type_header_is_preserved_as_none() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"raw".to_vec()))
        .mount(&mock_server)
        .await;

    let url = format!("{}/blob", mock_server.uri());
    let result = fetch(&url).await.unwrap();
    assert!(result.content_type.is_none());
}

#[tokio::test]
async fn http_404_is_a_fetch_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = format!("{}/missing.pdf", mock_server.uri());
    match fetch(&url).await {
        Err(FetchError::Http { status }) => assert_eq!(status.as_u16(), 404),
        other => panic!("expected HTTP 404 error, got {other:?}"),
    }
}

#[tokio::test]
async fn redirects_are_followed_to_the_final_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/current"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("moved here".as_bytes())
                .insert_header("Content-Type", "text/plain"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/old", mock_server.uri());
    let result = fetch(&url).await.unwrap();
    assert_eq!(result.bytes.as_ref(), b"moved here");
    assert!(result.url_final.as_str().ends_with("/current"));
}

#[tokio::test]
async fn declared_oversized_body_is_rejected_before_download() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes("x".repeat(2048).into_bytes())
                .insert_header("Content-Type", "text/plain"),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/large", mock_server.uri());
    match fetch_with_limit(&url, 1024).await {
        Err(FetchError::BodyTooLarge(size)) => assert_eq!(size, 2048),
        other => panic!("expected BodyTooLarge error, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_response_past_the_deadline_is_a_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"eventually".to_vec())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let url = format!("{}/slow.pdf", mock_server.uri());
    match fetch_with_timeout(&url, Duration::from_millis(100)).await {
        Err(FetchError::RequestTimeout) => {}
        other => panic!("expected request timeout error, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_url_fails_without_a_request() {
    match fetch("not-a-valid-url").await {
        Err(FetchError::InvalidUrl(_)) => {}
        other => panic!("expected InvalidUrl error, got {other:?}"),
    }
}
