// src/feeds/mod.rs
//! Multi-source feed aggregation: fetch, parse, normalize, categorize,
//! dedup, rank. Everything is recomputed per request; there is no cache or
//! persisted state between runs.

pub mod categorize;
pub mod config;
pub mod dedup;
pub mod fetch;
pub mod normalize;
pub mod parse;
pub mod types;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use tracing::{info, warn};

use crate::feeds::config::PipelineSettings;
use crate::feeds::types::{Article, Episode, FeedFetcher, FeedSource};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("feed_items_total", "Items parsed across all feed sources.");
        describe_counter!(
            "feed_items_kept_total",
            "Articles surviving dedup and the result cap."
        );
        describe_counter!(
            "feed_dedup_removed_total",
            "Articles removed as near-duplicates."
        );
        describe_counter!("feed_source_errors_total", "Feed fetch/parse failures.");
        describe_histogram!("feed_fetch_ms", "Feed HTTP fetch time in milliseconds.");
        describe_histogram!("feed_parse_ms", "Feed parse+normalize time in milliseconds.");
        describe_gauge!(
            "feed_last_run_ts",
            "Unix ts when the aggregation pipeline last ran."
        );
    });
}

/// Merges the configured news feeds into one deduplicated, recency-sorted,
/// capped article list.
pub struct NewsAggregator {
    fetcher: Arc<dyn FeedFetcher>,
    sources: Vec<FeedSource>,
    settings: PipelineSettings,
}

impl NewsAggregator {
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        sources: Vec<FeedSource>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            sources,
            settings,
        }
    }

    /// Run the full pipeline once. Per-source failures are logged and cost
    /// only that source's items; the call errors only when every source
    /// failed.
    pub async fn aggregate(&self) -> Result<Vec<Article>> {
        ensure_metrics_described();
        let now = chrono::Utc::now().timestamp().max(0) as u64;

        let fetches = self.sources.iter().map(|source| async move {
            match self.fetch_source(source, now).await {
                Ok(items) => Some(items),
                Err(e) => {
                    warn!(error = ?e, source = %source.name, "feed source failed");
                    counter!("feed_source_errors_total").increment(1);
                    None
                }
            }
        });
        let results = futures::future::join_all(fetches).await;

        let healthy = results.iter().filter(|r| r.is_some()).count();
        if healthy == 0 && !self.sources.is_empty() {
            bail!("all news sources failed");
        }

        let mut merged: Vec<Article> = results.into_iter().flatten().flatten().collect();
        // Stable sort: ties keep merge order, which keeps the run idempotent.
        merged.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        let before = merged.len();
        let mut kept = dedup::dedup_articles(merged, self.settings.dedup_overlap_threshold);
        let removed = before - kept.len();
        counter!("feed_dedup_removed_total").increment(removed as u64);

        for (i, article) in kept.iter_mut().enumerate() {
            article.featured = i < self.settings.featured_count;
        }
        kept.truncate(self.settings.news_cap);

        counter!("feed_items_kept_total").increment(kept.len() as u64);
        gauge!("feed_last_run_ts").set(now as f64);
        info!(
            sources = self.sources.len(),
            healthy,
            kept = kept.len(),
            removed,
            "news aggregation finished"
        );
        Ok(kept)
    }

    async fn fetch_source(&self, source: &FeedSource, now: u64) -> Result<Vec<Article>> {
        let body = self.fetcher.fetch(source).await?;

        let t0 = std::time::Instant::now();
        let feed = parse::parse_feed(&body)
            .with_context(|| format!("parsing feed '{}'", source.name))?;
        let articles: Vec<Article> = feed
            .items
            .iter()
            .map(|raw| normalize::normalize_article(raw, &feed, source, now))
            .collect();

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("feed_parse_ms").record(ms);
        counter!("feed_items_total").increment(articles.len() as u64);
        Ok(articles)
    }
}

/// The single podcast feed. Unlike news there is no fallback source, so a
/// failure here surfaces to the caller.
pub struct PodcastService {
    fetcher: Arc<dyn FeedFetcher>,
    source: FeedSource,
    featured_count: usize,
}

impl PodcastService {
    pub fn new(fetcher: Arc<dyn FeedFetcher>, source: FeedSource, featured_count: usize) -> Self {
        Self {
            fetcher,
            source,
            featured_count,
        }
    }

    pub async fn episodes(&self) -> Result<Vec<Episode>> {
        ensure_metrics_described();
        let now = chrono::Utc::now().timestamp().max(0) as u64;

        let body = self.fetcher.fetch(&self.source).await?;
        let t0 = std::time::Instant::now();
        let feed = parse::parse_feed(&body)
            .with_context(|| format!("parsing podcast feed '{}'", self.source.name))?;

        let mut episodes: Vec<Episode> = feed
            .items
            .iter()
            .enumerate()
            .map(|(i, raw)| normalize::normalize_episode(raw, &feed, &self.source, i, now))
            .collect();
        for (i, ep) in episodes.iter_mut().enumerate() {
            ep.featured = i < self.featured_count;
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("feed_parse_ms").record(ms);
        counter!("feed_items_total").increment(episodes.len() as u64);
        Ok(episodes)
    }

    /// Scan the full feed for an episode id, either `ep-{n}` or the
    /// positional `episode-{i}` fallback.
    pub async fn find(&self, id: &str) -> Result<Option<Episode>> {
        Ok(self.episodes().await?.into_iter().find(|e| e.id == id))
    }
}
