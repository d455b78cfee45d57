// src/feeds/fetch.rs
//! Outbound feed retrieval. Every source gets its own timeout; a failed or
//! slow source only ever costs its own items.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use metrics::histogram;

use crate::feeds::parse;
use crate::feeds::types::{FeedFetcher, FeedSource};

const USER_AGENT: &str = concat!("crypto-feed-hub/", env!("CARGO_PKG_VERSION"));

pub struct HttpFetcher {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl HttpFetcher {
    pub fn new(default_timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            default_timeout: Duration::from_secs(default_timeout_secs),
        }
    }
}

#[async_trait]
impl FeedFetcher for HttpFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<String> {
        let timeout = source
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(self.default_timeout);

        let t0 = std::time::Instant::now();
        let resp = self
            .client
            .get(&source.url)
            .timeout(timeout)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await
            .with_context(|| format!("fetching feed '{}'", source.name))?;

        if !resp.status().is_success() {
            bail!("feed '{}' returned {}", source.name, resp.status());
        }

        let body = resp
            .text()
            .await
            .with_context(|| format!("reading feed body '{}'", source.name))?;

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("feed_fetch_ms").record(ms);

        match source.item_cap {
            Some(cap) => Ok(parse::bounded_document(&body, cap).into_owned()),
            None => Ok(body),
        }
    }
}

/// Serves canned XML bodies keyed by source name. Sources without a body
/// fail, which tests use to simulate a dead upstream.
#[derive(Default)]
pub struct StaticFetcher {
    bodies: HashMap<String, String>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, source_name: &str, xml: &str) -> Self {
        self.bodies.insert(source_name.to_string(), xml.to_string());
        self
    }
}

#[async_trait]
impl FeedFetcher for StaticFetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<String> {
        let body = self
            .bodies
            .get(&source.name)
            .ok_or_else(|| anyhow!("no body for source '{}'", source.name))?;
        match source.item_cap {
            Some(cap) => Ok(parse::bounded_document(body, cap).into_owned()),
            None => Ok(body.clone()),
        }
    }
}
