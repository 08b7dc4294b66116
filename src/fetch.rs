//! Outbound HTTP GET used by the search and image proxy paths.

use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::Client;
use reqwest::redirect::Policy;
use std::time::Duration;

use crate::error::FetchError;
use crate::proxy::AllowList;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; artgate/0.1)";
const MAX_REDIRECTS: usize = 5;

/// Performs exactly one GET and returns the whole body on a success status.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::build(timeout, Policy::limited(MAX_REDIRECTS))
    }

    /// Every redirect target must also pass `allow_list`, otherwise the request
    /// fails with `FetchError::Redirect` before the target is contacted.
    pub fn with_allow_list(timeout: Duration, allow_list: AllowList) -> Result<Self, FetchError> {
        let policy = Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                return attempt.error(format!("too many redirects (max {})", MAX_REDIRECTS));
            }
            match allow_list.check(attempt.url()) {
                Ok(()) => attempt.follow(),
                Err(reason) => {
                    tracing::warn!(target_url = %attempt.url(), reason = %reason, "blocked redirect");
                    attempt.error(format!("redirect blocked, {}", reason))
                }
            }
        });
        Self::build(timeout, policy)
    }

    fn build(timeout: Duration, policy: Policy) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .redirect(policy)
            .build()
            .map_err(|e| FetchError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        tracing::debug!(url, "fetching");

        let response = self.client.get(url).send().await.map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16(), url.to_string()));
        }

        let body = response.bytes().await.map_err(|e| classify(url, e))?;
        tracing::debug!(url, bytes = body.len(), "fetched");
        Ok(body)
    }
}

fn classify(url: &str, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout(url.to_string())
    } else if e.is_redirect() {
        FetchError::Redirect(e.to_string())
    } else {
        FetchError::Transport(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let base = serve(Router::new().route("/ok", get(|| async { "hello" }))).await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let body = fetcher.fetch(&format!("{}/ok", base)).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let app = Router::new().route("/missing", get(|| async { (StatusCode::NOT_FOUND, "nope") }));
        let base = serve(app).await;
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        let err = fetcher.fetch(&format!("{}/missing", base)).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(404, _)));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let app = Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        let base = serve(app).await;
        let fetcher = HttpFetcher::new(Duration::from_millis(100)).unwrap();

        let err = fetcher.fetch(&format!("{}/slow", base)).await.unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2)).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:1/nothing").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_) | FetchError::Timeout(_)));
    }
}
