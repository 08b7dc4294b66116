//! Re-serves remote images through this service's origin.

use axum::body::Bytes;
use std::sync::Arc;
use url::Url;

use crate::error::GatewayError;
use crate::fetch::Fetcher;

pub const IMAGE_CONTENT_TYPE: &str = "image/png";

#[derive(Debug)]
pub struct ProxiedImage {
    pub bytes: Bytes,
    pub content_type: &'static str,
}

/// Hosts the proxy may contact. A host matches a domain when it equals it or is a
/// subdomain of it. An empty list allows every http(s) URL.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    domains: Vec<String>,
}

impl AllowList {
    pub fn new(domains: &[String]) -> Self {
        Self {
            domains: domains
                .iter()
                .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn check(&self, url: &Url) -> Result<(), String> {
        if self.domains.is_empty() {
            return Ok(());
        }
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("unsupported scheme: {}", url.scheme()));
        }

        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        let allowed = self
            .domains
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{}", d)));

        if !allowed {
            return Err(format!("host not allowed: {}", host));
        }
        Ok(())
    }
}

pub struct ImageProxy {
    fetcher: Arc<dyn Fetcher>,
    allow_list: AllowList,
}

impl ImageProxy {
    /// The fetcher should apply the same `allow_list` to redirects; see
    /// `HttpFetcher::with_allow_list`.
    pub fn new(fetcher: Arc<dyn Fetcher>, allow_list: AllowList) -> Self {
        Self { fetcher, allow_list }
    }

    pub async fn fetch(&self, image_url: &str) -> Result<ProxiedImage, GatewayError> {
        if image_url.is_empty() {
            return Err(GatewayError::Validation("missing url".to_string()));
        }
        self.check_allowed(image_url)?;

        let bytes = self.fetcher.fetch(image_url).await.map_err(|e| {
            tracing::error!(error = %e, url = image_url, "failed to fetch image");
            GatewayError::from(e)
        })?;

        tracing::debug!(url = image_url, bytes = bytes.len(), "proxied image");
        Ok(ProxiedImage {
            bytes,
            content_type: IMAGE_CONTENT_TYPE,
        })
    }

    fn check_allowed(&self, image_url: &str) -> Result<(), GatewayError> {
        if self.allow_list.is_empty() {
            return Ok(());
        }

        let parsed = Url::parse(image_url).map_err(|e| GatewayError::Validation(format!("invalid url: {}", e)))?;
        self.allow_list.check(&parsed).map_err(|e| {
            tracing::warn!(error = %e, url = image_url, "image url rejected by allow-list");
            GatewayError::Validation(e)
        })
    }
}
