use url::Url;

use crate::images::extract_images;
use crate::models::PageResult;
use crate::text::extract_visible_text;
use crate::words::analyze;

/// Message reported for any failed fetch. Details go to the log only.
pub const CONNECT_ERROR: &str = "Error connecting to the website.";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Connect(#[source] reqwest::Error),
    #[error("reading body failed: {0}")]
    Body(String),
}

// ── Public API ───────────────────────────────────────────────────────────────

/// Images and word statistics for the page at `url`.
///
/// The page is fetched twice, one pass per extractor, strictly one after the
/// other. A failure on either fetch yields only the error: images found by
/// the first pass are not kept.
pub async fn get_page_info(client: &reqwest::Client, url: &str) -> PageResult {
    match scrape(client, url).await {
        Ok(result) => {
            tracing::info!(
                "{}: {} images, {} words",
                url,
                result.images.len(),
                result.words.total_count
            );
            result
        }
        Err(e) => {
            tracing::warn!("{}: {}", url, e);
            PageResult::failed(CONNECT_ERROR)
        }
    }
}

async fn scrape(client: &reqwest::Client, url: &str) -> Result<PageResult, FetchError> {
    let response = fetch(client, url).await?;
    let host = host_of(response.url());
    let images = extract_images(response, host).await?;

    let response = fetch(client, url).await?;
    let html = response
        .text()
        .await
        .map_err(|e| FetchError::Body(e.to_string()))?;
    let words = analyze(&extract_visible_text(&html));

    Ok(PageResult {
        images,
        words,
        error: String::new(),
    })
}

// ── HTTP fetch ───────────────────────────────────────────────────────────────

/// Any status counts as a page; only transport failures are errors.
async fn fetch(client: &reqwest::Client, url: &str) -> Result<reqwest::Response, FetchError> {
    let response = client.get(url).send().await.map_err(FetchError::Connect)?;
    tracing::debug!("GET {} -> {}", response.url(), response.status());
    Ok(response)
}

/// `host[:port]` of the URL that was finally served, after redirects.
fn host_of(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{ImageRecord, WordCount};
    use axum::{
        http::StatusCode,
        response::{Html, IntoResponse},
        routing::get,
        Router,
    };
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    pub(crate) const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Fixture</title><style>body { color: red }</style></head>
<body>
  <h1>The cat sat</h1>
  <img src="images/cat.png" alt="A cat">
  <p>The cat ran. <img alt="no source"></p>
  <img src="https://cdn.example.org/dog.jpg">
  <script>var words = "hidden hidden hidden";</script>
</body>
</html>"#;

    pub(crate) async fn serve(app: Router) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    /// A loopback address nothing is listening on.
    pub(crate) async fn closed_addr() -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    fn client() -> reqwest::Client {
        reqwest::Client::new()
    }

    #[tokio::test]
    async fn extracts_images_and_words() {
        let addr = serve(Router::new().route("/page", get(|| async { Html(PAGE) }))).await;
        let url = format!("http://{}/page", addr);

        let result = get_page_info(&client(), &url).await;

        assert_eq!(result.error, "");
        assert_eq!(
            result.images,
            vec![
                ImageRecord {
                    name: "cat.png".to_string(),
                    description: "A cat".to_string(),
                    url: format!("//{}/images/cat.png", addr),
                },
                ImageRecord {
                    name: "dog.jpg".to_string(),
                    description: String::new(),
                    url: "https://cdn.example.org/dog.jpg".to_string(),
                },
            ]
        );
        assert_eq!(result.words.total_count, 6);
        assert_eq!(
            result.words.top_words,
            vec![
                WordCount { word: "the".to_string(), count: 2 },
                WordCount { word: "cat".to_string(), count: 2 },
                WordCount { word: "sat".to_string(), count: 1 },
                WordCount { word: "ran".to_string(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn fetches_the_page_twice_in_sequence() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/",
            get(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Html(PAGE)
                }
            }),
        );
        let addr = serve(app).await;

        let result = get_page_info(&client(), &format!("http://{}/", addr)).await;

        assert!(!result.is_error());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_fetch_failure_discards_images() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/",
            get(move || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Html(PAGE).into_response()
                    } else {
                        // Redirect loop on the second pass trips the client.
                        (
                            StatusCode::FOUND,
                            [(axum::http::header::LOCATION, "/")],
                        )
                            .into_response()
                    }
                }
            }),
        );
        let addr = serve(app).await;
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(3))
            .build()
            .unwrap();
        let result = get_page_info(&client, &format!("http://{}/", addr)).await;

        assert_eq!(result, PageResult::failed(CONNECT_ERROR));
        assert!(result.images.is_empty());
    }

    #[tokio::test]
    async fn connection_failure_is_reported() {
        let url = format!("http://{}/", closed_addr().await);
        let result = get_page_info(&client(), &url).await;

        assert_eq!(result.error, CONNECT_ERROR);
        assert!(result.images.is_empty());
        assert_eq!(result.words.total_count, 0);
        assert!(result.words.top_words.is_empty());
    }

    #[tokio::test]
    async fn error_status_pages_are_still_scraped() {
        let app = Router::new().fallback(|| async {
            (
                StatusCode::NOT_FOUND,
                Html(r#"<body><img src="404.png">Not found</body>"#),
            )
        });
        let addr = serve(app).await;

        let result = get_page_info(&client(), &format!("http://{}/missing", addr)).await;

        assert!(!result.is_error());
        assert_eq!(result.images.len(), 1);
        assert_eq!(result.images[0].name, "404.png");
        assert_eq!(result.words.total_count, 2);
    }

    #[tokio::test]
    async fn same_page_gives_same_result() {
        let addr = serve(Router::new().route("/", get(|| async { Html(PAGE) }))).await;
        let url = format!("http://{}/", addr);
        let client = client();

        let first = get_page_info(&client, &url).await;
        let second = get_page_info(&client, &url).await;

        assert_eq!(first, second);
    }

    #[test]
    fn host_keeps_explicit_port() {
        let url = Url::parse("http://127.0.0.1:8080/a/b").unwrap();
        assert_eq!(host_of(&url), "127.0.0.1:8080");
        let url = Url::parse("https://example.com:443/").unwrap();
        assert_eq!(host_of(&url), "example.com");
        let url = Url::parse("https://Example.COM/x").unwrap();
        assert_eq!(host_of(&url), "example.com");
    }
}
