use std::sync::Arc;

use artgate::config::{Cli, Config};
use artgate::fetch::{Fetcher, HttpFetcher};
use artgate::handler::AppState;
use artgate::proxy::{AllowList, ImageProxy};
use artgate::routes::routes;
use artgate::search::SearchAggregator;
use artgate::store::BookmarkStore;
use artgate::unpack_error;
use clap::Parser;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("failed to read .env: {}", e);
        }
    }

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("artgate.svc starting");

    let cfg = Config::new(&args.config_path).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = %args.config_path, "failed to load config file");
        std::process::exit(1);
    });

    if cfg.app.get_base_url().is_none() {
        tracing::warn!("base_url is not set, search requests will fail until it is configured");
    }

    let store = Arc::new(BookmarkStore::load(&cfg.app.bookmarks_file).await.unwrap_or_else(|e| {
        tracing::error!(error = %unpack_error(&e), path = %cfg.app.bookmarks_file, "failed to load bookmarks");
        std::process::exit(1);
    }));

    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(cfg.app.fetch_timeout()).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup http client");
        std::process::exit(1);
    }));

    let search = Arc::new(SearchAggregator::new(
        fetcher,
        &cfg.app.feed_url,
        cfg.app.get_base_url(),
    ));

    // The proxy gets its own client so redirects are held to the same allow-list.
    let allow_list = AllowList::new(&cfg.app.allowed_domains);
    let proxy_fetcher = HttpFetcher::with_allow_list(cfg.app.fetch_timeout(), allow_list.clone()).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup image proxy http client");
        std::process::exit(1);
    });
    let proxy = Arc::new(ImageProxy::new(Arc::new(proxy_fetcher), allow_list));

    let app = routes(AppState { store, search, proxy });

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("artgate.svc running on {}", &address);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl+c");
            }
            tracing::info!("ctrl+c signal received, preparing to shutdown");
        })
        .await;

    if let Err(err) = result {
        tracing::error!(error = %err, "server error");
        std::process::exit(1);
    }
    tracing::info!("artgate.svc going off, graceful shutdown complete");
}
