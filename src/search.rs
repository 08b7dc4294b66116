//! Feed search: query -> remote RSS -> display-ready results.

use serde::Deserialize;
use std::sync::Arc;

use crate::error::GatewayError;
use crate::fetch::Fetcher;
use crate::sanitize::sanitize_description;

pub const QUERY_PLACEHOLDER: &str = "{query}";
pub const IMAGE_PROXY_PATH: &str = "/image";

#[derive(Debug, Deserialize, Default)]
struct Rss {
    #[serde(default)]
    channel: Channel,
}

#[derive(Debug, Deserialize, Default)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<FeedItem>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FeedItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "media:thumbnail", alias = "thumbnail", default)]
    thumbnails: Vec<Thumbnail>,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
struct Thumbnail {
    #[serde(rename = "@url", default)]
    url: String,
}

impl FeedItem {
    /// The last thumbnail listed wins.
    pub fn thumbnail_url(&self) -> &str {
        self.thumbnails.last().map(|t| t.url.as_str()).unwrap_or("")
    }
}

/// Decodes an RSS document into its items, in document order.
pub fn parse_feed(body: &str) -> Result<Vec<FeedItem>, GatewayError> {
    let rss: Rss = quick_xml::de::from_str(body).map_err(|e| GatewayError::Parse(e.to_string()))?;
    Ok(rss.channel.items)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub image: String,
    pub description: String,
}

#[derive(Debug)]
pub struct SearchPage {
    pub query: String,
    pub results: Vec<SearchResult>,
}

pub struct SearchAggregator {
    fetcher: Arc<dyn Fetcher>,
    feed_url: String,
    base_url: Option<String>,
}

impl SearchAggregator {
    pub fn new(fetcher: Arc<dyn Fetcher>, feed_url: &str, base_url: Option<&str>) -> Self {
        Self {
            fetcher,
            feed_url: feed_url.to_string(),
            base_url: base_url.map(|u| u.trim_end_matches('/').to_string()),
        }
    }

    pub fn feed_url_for(&self, query: &str) -> String {
        self.feed_url.replace(QUERY_PLACEHOLDER, &urlencoding::encode(query))
    }

    pub fn proxied_image_url(base_url: &str, image_url: &str) -> String {
        format!("{}{}?url={}", base_url, IMAGE_PROXY_PATH, urlencoding::encode(image_url))
    }

    pub async fn search(&self, query: &str) -> Result<SearchPage, GatewayError> {
        if query.is_empty() {
            return Err(GatewayError::MissingQuery);
        }
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| GatewayError::ServerConfig("base_url is not set".to_string()))?;

        let feed_url = self.feed_url_for(query);
        let body = self.fetcher.fetch(&feed_url).await.map_err(|e| {
            tracing::error!(error = %e, url = %feed_url, "failed to fetch feed");
            GatewayError::from(e)
        })?;

        let text = String::from_utf8_lossy(&body);
        let items = parse_feed(&text).map_err(|e| {
            tracing::error!(error = %e, url = %feed_url, "failed to parse feed");
            e
        })?;

        let results: Vec<SearchResult> = items
            .into_iter()
            .map(|item| SearchResult {
                image: Self::proxied_image_url(base_url, item.thumbnail_url()),
                description: sanitize_description(&item.description),
                title: item.title,
                link: item.link,
            })
            .collect();

        tracing::info!(query, results = results.len(), "search complete");
        Ok(SearchPage {
            query: query.to_string(),
            results,
        })
    }
}
