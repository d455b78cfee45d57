// src/api.rs
//! HTTP surface. Handlers are thin: they run the pipeline services held in
//! [`AppState`] and translate outcomes to JSON responses.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tracing::error;

use crate::cms::CmsClient;
use crate::feeds::config::FeedConfig;
use crate::feeds::types::{Article, FeedFetcher};
use crate::feeds::{NewsAggregator, PodcastService};
use crate::search::SearchService;

const DEFAULT_PAGE_SIZE: usize = 12;
const MAX_PAGE_SIZE: usize = 50;

/// Explicitly constructed service instances; built once in the entrypoint
/// and passed by reference to every handler. No module-global state.
#[derive(Clone)]
pub struct AppState {
    pub news: Arc<NewsAggregator>,
    pub podcasts: Arc<PodcastService>,
    pub search: Arc<SearchService>,
}

impl AppState {
    pub fn new(config: &FeedConfig, fetcher: Arc<dyn FeedFetcher>, cms: Arc<CmsClient>) -> Self {
        let news = Arc::new(NewsAggregator::new(
            fetcher.clone(),
            config.news_sources.clone(),
            config.settings.clone(),
        ));
        let podcasts = Arc::new(PodcastService::new(
            fetcher,
            config.podcast.clone(),
            config.settings.featured_count,
        ));
        let search = Arc::new(SearchService::new(cms, news.clone(), podcasts.clone()));
        Self {
            news,
            podcasts,
            search,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/news", get(list_news))
        .route("/api/podcasts", get(list_podcasts))
        .route("/api/podcasts/{id}", get(podcast_by_id))
        .route("/api/search", get(search))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct NewsQuery {
    category: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
}

async fn list_news(
    State(state): State<AppState>,
    Query(params): Query<NewsQuery>,
) -> impl IntoResponse {
    let articles = match state.news.aggregate().await {
        Ok(articles) => articles,
        Err(e) => {
            error!(error = ?e, "news aggregation failed entirely");
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "news sources unavailable" })),
            )
                .into_response();
        }
    };

    let filtered: Vec<Article> = match params.category.as_deref().map(str::trim) {
        Some(cat) if !cat.is_empty() => articles
            .into_iter()
            .filter(|a| a.categories.iter().any(|c| c.eq_ignore_ascii_case(cat)))
            .collect(),
        _ => articles,
    };

    let page = params.page.unwrap_or(1).max(1);
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let total = filtered.len();
    let start = (page - 1).saturating_mul(limit).min(total);
    let end = (start + limit).min(total);
    let page_items = &filtered[start..end];

    (
        StatusCode::OK,
        Json(json!({
            "articles": page_items,
            "total": total,
            "page": page,
            "limit": limit,
        })),
    )
        .into_response()
}

async fn list_podcasts(State(state): State<AppState>) -> impl IntoResponse {
    match state.podcasts.episodes().await {
        Ok(episodes) => (StatusCode::OK, Json(json!({ "episodes": episodes }))).into_response(),
        Err(e) => {
            error!(error = ?e, "podcast feed failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load podcast feed" })),
            )
                .into_response()
        }
    }
}

async fn podcast_by_id(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match state.podcasts.find(&id).await {
        Ok(Some(episode)) => (StatusCode::OK, Json(episode)).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Podcast not found" })),
        )
            .into_response(),
        Err(e) => {
            error!(error = ?e, %id, "podcast lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load podcast feed" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let query = params.q.unwrap_or_default();
    if query.trim().is_empty() {
        // Legacy envelope for the empty query, kept verbatim for the frontend.
        return Json(json!({ "results": [] })).into_response();
    }
    let results = state.search.search(&query).await;
    Json(json!({ "results": results, "query": query })).into_response()
}
