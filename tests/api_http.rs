// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/news (success + total failure)
// - GET /api/podcasts/{id} (hit, positional hit, 404)
// - GET /api/search (empty query envelope)

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use crypto_feed_hub::api::{self, AppState};
use crypto_feed_hub::cms::CmsClient;
use crypto_feed_hub::feeds::config::FeedConfig;
use crypto_feed_hub::feeds::fetch::StaticFetcher;
use crypto_feed_hub::feeds::types::{FeedFetcher, FeedSource};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

const NEWS_FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Chain Report</title>
<item>
  <title>Bitcoin ETF inflows accelerate</title>
  <link>https://chainreport.example/etf</link>
  <pubDate>Mon, 24 Aug 2026 10:00:00 GMT</pubDate>
  <description>Spot funds post another record week.</description>
</item>
<item>
  <title>Ethereum upgrade ships on mainnet</title>
  <link>https://chainreport.example/upgrade</link>
  <pubDate>Sun, 23 Aug 2026 10:00:00 GMT</pubDate>
  <description>Validators report a smooth rollout.</description>
</item>
</channel></rss>"#;

const PODCAST_FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
<channel><title>Chain Talk</title>
<item>
  <title>Ep 42: Scaling DeFi</title>
  <link>https://pods.example/ep42</link>
  <pubDate>Mon, 24 Aug 2026 08:00:00 GMT</pubDate>
  <description>Rollups, fees, and what comes next.</description>
  <itunes:duration>2700</itunes:duration>
  <enclosure url="https://cdn.example/ep42.mp3" type="audio/mpeg"/>
</item>
</channel></rss>"#;

/// Build the same Router the binary uses, backed by canned feed bodies.
/// The CMS base URL points nowhere; these tests never hit that branch.
fn test_router(fetcher: StaticFetcher) -> Router {
    let config = FeedConfig {
        news_sources: vec![FeedSource::news(
            "Chain Report",
            "https://chainreport.example/rss",
        )],
        podcast: FeedSource::podcast("Chain Talk", "https://pods.example/rss"),
        ..FeedConfig::default()
    };
    let fetcher: Arc<dyn FeedFetcher> = Arc::new(fetcher);
    let cms = Arc::new(CmsClient::new("http://127.0.0.1:1", 1));
    api::router(AppState::new(&config, fetcher, cms))
}

fn full_fixtures() -> StaticFetcher {
    StaticFetcher::new()
        .with_body("Chain Report", NEWS_FEED)
        .with_body("Chain Talk", PODCAST_FEED)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build request");
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    let v: Json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, v)
}

#[tokio::test]
async fn api_health_returns_200_and_ok_body() {
    let app = test_router(full_fixtures());

    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);

    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec();
    assert_eq!(String::from_utf8(bytes).expect("utf8").trim(), "OK");
}

#[tokio::test]
async fn api_news_returns_paginated_articles() {
    let (status, v) = get_json(test_router(full_fixtures()), "/api/news?limit=1").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(v["total"], 2);
    assert_eq!(v["page"], 1);
    let articles = v["articles"].as_array().expect("articles array");
    assert_eq!(articles.len(), 1);
    // Newest first.
    assert_eq!(articles[0]["title"], "Bitcoin ETF inflows accelerate");
    assert_eq!(articles[0]["source"], "Chain Report");
    assert!(articles[0]["featured"].as_bool().unwrap());
}

#[tokio::test]
async fn api_news_category_filter_is_case_insensitive() {
    // Keyword scan tags the second fixture article "Ethereum".
    let (status, v) = get_json(
        test_router(full_fixtures()),
        "/api/news?category=ETHEREUM",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["total"], 1);
    assert_eq!(
        v["articles"][0]["title"],
        "Ethereum upgrade ships on mainnet"
    );
}

#[tokio::test]
async fn api_news_limit_clamps_to_maximum() {
    let (status, v) = get_json(test_router(full_fixtures()), "/api/news?limit=999").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["limit"], 50);
    assert_eq!(v["articles"].as_array().expect("articles array").len(), 2);
}

#[tokio::test]
async fn api_news_with_all_sources_down_is_bad_gateway() {
    let (status, v) = get_json(test_router(StaticFetcher::new()), "/api/news").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(v.get("error").is_some());
}

#[tokio::test]
async fn api_podcast_by_id_returns_normalized_fields() {
    let (status, v) = get_json(test_router(full_fixtures()), "/api/podcasts/ep-42").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(v["id"], "ep-42");
    assert_eq!(v["title"], "Ep 42: Scaling DeFi");
    assert_eq!(v["duration"], "45 min");
    assert_eq!(v["audioUrl"], "https://cdn.example/ep42.mp3");
    assert_eq!(v["episodeNumber"], 42);
}

#[tokio::test]
async fn api_podcast_unknown_id_is_404() {
    let (status, v) = get_json(test_router(full_fixtures()), "/api/podcasts/ep-999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(v["error"], "Podcast not found");
}

#[tokio::test]
async fn api_podcast_upstream_failure_is_500() {
    // News fixture present, podcast body missing: the single-source feed
    // has no fallback and must surface the failure.
    let fetcher = StaticFetcher::new().with_body("Chain Report", NEWS_FEED);
    let (status, v) = get_json(test_router(fetcher), "/api/podcasts/ep-42").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(v.get("error").is_some());
}

#[tokio::test]
async fn api_search_without_query_returns_empty_results() {
    let (status, v) = get_json(test_router(full_fixtures()), "/api/search").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["results"], serde_json::json!([]));
}
