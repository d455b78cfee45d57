//! crypto-feed-hub — Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crypto_feed_hub::api::{self, AppState};
use crypto_feed_hub::cms::CmsClient;
use crypto_feed_hub::feeds::config::FeedConfig;
use crypto_feed_hub::feeds::fetch::HttpFetcher;
use crypto_feed_hub::feeds::types::FeedFetcher;
use crypto_feed_hub::metrics::Metrics;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("crypto_feed_hub=info,warn")),
        )
        .with(fmt::layer().compact())
        .init();

    let config = FeedConfig::load()?;
    info!(
        news_sources = config.news_sources.len(),
        podcast = %config.podcast.name,
        "feed configuration loaded"
    );

    // Recorder must be installed before the first pipeline run.
    let metrics = Metrics::init(config.news_sources.len() + 1);

    let cms_base =
        std::env::var("CMS_BASE_URL").unwrap_or_else(|_| "http://localhost:1337".to_string());
    let fetcher: Arc<dyn FeedFetcher> = Arc::new(HttpFetcher::new(config.settings.timeout_secs));
    let cms = Arc::new(CmsClient::new(cms_base, config.settings.timeout_secs));

    let state = AppState::new(&config, fetcher, cms);
    let app = api::router(state).merge(metrics.router());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
