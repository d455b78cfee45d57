// src/feeds/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Kind of content a feed source publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    News,
    Podcast,
}

/// One configured upstream feed. Built once at startup and never mutated.
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default = "default_kind")]
    pub kind: SourceKind,
    /// Bounded read: keep only the first N `<item>` blocks of the document.
    #[serde(default)]
    pub item_cap: Option<usize>,
    /// Per-source override of the default fetch timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_kind() -> SourceKind {
    SourceKind::News
}

impl FeedSource {
    pub fn news(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            kind: SourceKind::News,
            item_cap: None,
            timeout_secs: None,
        }
    }

    pub fn podcast(name: &str, url: &str) -> Self {
        Self {
            kind: SourceKind::Podcast,
            ..Self::news(name, url)
        }
    }

    pub fn with_item_cap(mut self, cap: usize) -> Self {
        self.item_cap = Some(cap);
        self
    }
}

/// A `media:content` / `media:thumbnail` / `enclosure` reference.
#[derive(Debug, Clone, Default)]
pub struct MediaRef {
    pub url: Option<String>,
    pub medium: Option<String>,
    pub mime: Option<String>,
}

/// One entry of a source feed, parsed but not yet normalized. Transient;
/// only lives between the parser and the normalizer.
#[derive(Debug, Clone, Default)]
pub struct RawFeedItem {
    pub title: String,
    pub link: Option<String>,
    pub pub_date: Option<String>,
    pub description: Option<String>,
    pub content_encoded: Option<String>,
    pub categories: Vec<String>,
    pub enclosure: Option<MediaRef>,
    pub itunes_image: Option<String>,
    pub itunes_duration: Option<String>,
    pub media_content: Vec<MediaRef>,
    pub media_thumbnail: Vec<MediaRef>,
}

/// A feed document after parsing: channel metadata plus its items.
#[derive(Debug, Clone, Default)]
pub struct ParsedFeed {
    pub channel_title: Option<String>,
    pub channel_image: Option<String>,
    pub items: Vec<RawFeedItem>,
}

/// Canonical news record consumed by everything downstream of the parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub image: String,
    pub publish_date: String,
    /// Unix seconds, used only for recency sorting.
    #[serde(skip_serializing)]
    pub published_at: u64,
    pub categories: Vec<String>,
    pub read_time: String,
    pub source: String,
    pub featured: bool,
    pub link: String,
}

/// Canonical podcast record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Episode {
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub thumbnail: String,
    pub publish_date: String,
    #[serde(skip_serializing)]
    pub published_at: u64,
    pub categories: Vec<String>,
    pub duration: String,
    pub audio_url: String,
    pub link: String,
    pub featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode_number: Option<u32>,
}

/// Retrieves the raw XML body for one source. The HTTP implementation lives
/// in `feeds::fetch`; tests substitute canned bodies.
#[async_trait::async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<String>;
}
