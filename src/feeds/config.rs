// src/feeds/config.rs
//! Feed configuration: compiled-in defaults, optionally overridden by a
//! TOML file (`config/feeds.toml` or $FEED_CONFIG_PATH).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

use crate::feeds::dedup::DEFAULT_OVERLAP_THRESHOLD;
use crate::feeds::types::FeedSource;

pub const ENV_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/feeds.toml";

/// Pipeline tunables. The dedup threshold and featured count are reasonable
/// defaults rather than meaningful constants, hence configurable.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub dedup_overlap_threshold: f64,
    pub featured_count: usize,
    pub news_cap: usize,
    pub timeout_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            dedup_overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            featured_count: 3,
            news_cap: 50,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    #[serde(default)]
    pub settings: PipelineSettings,
    #[serde(default = "default_news_sources", rename = "news_source")]
    pub news_sources: Vec<FeedSource>,
    #[serde(default = "default_podcast_source")]
    pub podcast: FeedSource,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            settings: PipelineSettings::default(),
            news_sources: default_news_sources(),
            podcast: default_podcast_source(),
        }
    }
}

impl FeedConfig {
    /// Resolution order: $FEED_CONFIG_PATH (must exist when set), then
    /// `config/feeds.toml` when present, then compiled-in defaults.
    pub fn load() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            return Self::load_from(&default_path);
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        let cfg: FeedConfig = toml::from_str(&content)
            .with_context(|| format!("parsing feed config {}", path.display()))?;
        Ok(cfg)
    }
}

fn default_news_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::news("CoinDesk", "https://www.coindesk.com/arc/outboundfeeds/rss/"),
        FeedSource::news("Cointelegraph", "https://cointelegraph.com/rss").with_item_cap(30),
        FeedSource::news("Decrypt", "https://decrypt.co/feed").with_item_cap(30),
        FeedSource::news("Bitcoin Magazine", "https://bitcoinmagazine.com/feed"),
    ]
}

fn default_podcast_source() -> FeedSource {
    FeedSource::podcast("Chain Talk", "https://feeds.megaphone.fm/chain-talk")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::types::SourceKind;
    use std::env;

    #[test]
    fn toml_overrides_settings_and_sources() {
        let toml = r#"
[settings]
dedup_overlap_threshold = 0.5
featured_count = 2
news_cap = 20
timeout_secs = 5

[[news_source]]
name = "Chain Report"
url = "https://chainreport.example/rss"
item_cap = 10

[podcast]
name = "Block Hour"
url = "https://pods.example/block-hour.rss"
kind = "podcast"
"#;
        let cfg: FeedConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.settings.featured_count, 2);
        assert_eq!(cfg.settings.news_cap, 20);
        assert_eq!(cfg.news_sources.len(), 1);
        assert_eq!(cfg.news_sources[0].item_cap, Some(10));
        assert_eq!(cfg.podcast.kind, SourceKind::Podcast);
    }

    #[test]
    fn missing_sections_fall_back_to_defaults() {
        let cfg: FeedConfig = toml::from_str("").unwrap();
        assert!(!cfg.news_sources.is_empty());
        assert_eq!(
            cfg.settings.dedup_overlap_threshold,
            DEFAULT_OVERLAP_THRESHOLD
        );
    }

    #[serial_test::serial]
    #[test]
    fn env_path_wins_and_must_exist() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("feeds.toml");
        std::fs::write(&path, "[settings]\nnews_cap = 7\n").unwrap();

        env::set_var(ENV_CONFIG_PATH, path.display().to_string());
        let cfg = FeedConfig::load().unwrap();
        assert_eq!(cfg.settings.news_cap, 7);

        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml"));
        assert!(FeedConfig::load().is_err());
        env::remove_var(ENV_CONFIG_PATH);
    }
}
