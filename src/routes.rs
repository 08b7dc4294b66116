use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::assets::serve_static;
use crate::handler::{
    AppState, about, add_bookmark, home, list_bookmarks, not_found, proxy_image, remove_bookmark, search,
};

pub fn routes(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/about", get(about))
        .route("/search", get(search))
        .route("/image", get(proxy_image))
        .route("/bookmarks", get(list_bookmarks))
        .route("/addBookmark", post(add_bookmark))
        .route("/removeBookmark", post(remove_bookmark))
        .route("/static/*path", get(serve_static))
        .fallback(not_found)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}
