use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde_json::Value;

use crate::api::{ImageParams, SearchParams};
use crate::error::GatewayError;
use crate::proxy::ImageProxy;
use crate::search::SearchAggregator;
use crate::store::{Bookmark, BookmarkStore, LINK_FIELD};
use crate::{bad_request, error_response, good_response, pages, server_error};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<BookmarkStore>,
    pub search: Arc<SearchAggregator>,
    pub proxy: Arc<ImageProxy>,
}

const INVALID_BOOKMARK: &str = "Invalid bookmark data";

pub async fn home() -> Html<String> {
    pages::home()
}

pub async fn about() -> Html<String> {
    pages::about()
}

pub async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> Response {
    let query = params.q.unwrap_or_default();

    match state.search.search(&query).await {
        Ok(page) => pages::results(&page.query, &page.results).into_response(),
        Err(GatewayError::ServerConfig(e)) => {
            tracing::error!(error = %e, "search is misconfigured");
            server_error("Server misconfiguration")
        }
        Err(e) => {
            let message = match e {
                GatewayError::MissingQuery => "No search query provided.",
                GatewayError::Parse(_) => "Failed to parse RSS feed.",
                _ => "Failed to fetch RSS feed.",
            };
            (e.status_code(), pages::search_error(&query, message)).into_response()
        }
    }
}

pub async fn proxy_image(State(state): State<AppState>, Query(params): Query<ImageParams>) -> Response {
    let url = params.url.unwrap_or_default();

    match state.proxy.fetch(&url).await {
        Ok(image) => ([(header::CONTENT_TYPE, image.content_type)], image.bytes).into_response(),
        Err(GatewayError::Validation(e)) => {
            tracing::warn!(error = %e, url = %url, "rejected image request");
            bad_request(&e)
        }
        Err(e) => error_response(e.status_code(), "Failed to fetch image"),
    }
}

pub async fn list_bookmarks(State(state): State<AppState>) -> Html<String> {
    let items = state.store.list().await;
    pages::bookmarks(&items)
}

pub async fn add_bookmark(State(state): State<AppState>, body: Bytes) -> Response {
    match state.store.add_raw(&body).await {
        Ok(()) => good_response("Bookmark added successfully"),
        Err(GatewayError::Validation(e)) => {
            tracing::warn!(error = %e, "rejected bookmark");
            bad_request(INVALID_BOOKMARK)
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to add bookmark");
            server_error("Failed to save bookmark")
        }
    }
}

pub async fn remove_bookmark(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let link = link_from_body(&headers, &body).unwrap_or_default();

    match state.store.remove(&link).await {
        Ok(_) => good_response("Bookmark removed successfully"),
        Err(GatewayError::Validation(e)) => {
            tracing::warn!(error = %e, "rejected bookmark removal");
            bad_request(INVALID_BOOKMARK)
        }
        Err(e) => {
            tracing::error!(error = %e, link = %link, "failed to remove bookmark");
            server_error("Failed to save bookmarks")
        }
    }
}

// Accepts either a urlencoded form or a JSON object carrying `Link`.
fn link_from_body(headers: &HeaderMap, body: &[u8]) -> Option<String> {
    let is_json = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));

    if is_json {
        let record: Bookmark = serde_json::from_slice(body).ok()?;
        return match record.get(LINK_FIELD) {
            Some(Value::String(s)) => Some(s.clone()),
            _ => None,
        };
    }

    url::form_urlencoded::parse(body)
        .find(|(k, _)| k == LINK_FIELD)
        .map(|(_, v)| v.into_owned())
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "not found")
}
