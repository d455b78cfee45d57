// src/feeds/normalize.rs
//! Mapping of parsed feed items into the canonical [`Article`] and
//! [`Episode`] records: image fallback chain, summary extraction, synthetic
//! ids, durations, and relative publish dates.

use once_cell::sync::OnceCell;
use regex::Regex;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::{OffsetDateTime, UtcOffset};

use crate::feeds::categorize::resolve_categories;
use crate::feeds::types::{Article, Episode, FeedSource, MediaRef, ParsedFeed, RawFeedItem};

/// Served by the site frontend when no source yields a usable image.
pub const FALLBACK_IMAGE: &str = "/images/feed-placeholder.jpg";

const SUMMARY_MAX_CHARS: usize = 180;
const NO_SUMMARY: &str = "No summary available";
const READ_WORDS_PER_MIN: usize = 200;

pub fn normalize_article(
    raw: &RawFeedItem,
    feed: &ParsedFeed,
    source: &FeedSource,
    now: u64,
) -> Article {
    let summary = summarize(raw);
    let published_at = raw.pub_date.as_deref().map(parse_pub_date).unwrap_or(0);
    Article {
        id: article_id(&raw.title, &source.name),
        title: raw.title.clone(),
        image: resolve_image(raw, feed.channel_image.as_deref()),
        publish_date: relative_date(published_at, now),
        published_at,
        categories: resolve_categories(
            &raw.categories,
            &format!("{} {}", raw.title, summary),
            &source.name,
        ),
        read_time: read_time_label(&summary),
        summary,
        source: source.name.clone(),
        featured: false,
        link: raw.link.clone().unwrap_or_default(),
    }
}

pub fn normalize_episode(
    raw: &RawFeedItem,
    feed: &ParsedFeed,
    source: &FeedSource,
    index: usize,
    now: u64,
) -> Episode {
    let snippet = summarize(raw);
    let description_text = raw
        .description
        .as_deref()
        .or(raw.content_encoded.as_deref())
        .map(strip_html)
        .unwrap_or_default();
    let published_at = raw.pub_date.as_deref().map(parse_pub_date).unwrap_or(0);
    let (id, episode_number) = episode_id(&raw.title, index);
    Episode {
        id,
        title: raw.title.clone(),
        thumbnail: resolve_image(raw, feed.channel_image.as_deref()),
        publish_date: relative_date(published_at, now),
        published_at,
        categories: resolve_categories(
            &raw.categories,
            &format!("{} {}", raw.title, snippet),
            &source.name,
        ),
        snippet,
        duration: duration_label(raw.itunes_duration.as_deref(), &description_text),
        audio_url: raw
            .enclosure
            .as_ref()
            .and_then(|e| e.url.clone())
            .unwrap_or_default(),
        link: raw.link.clone().unwrap_or_default(),
        featured: false,
        episode_number,
    }
}

/// Stable within a run: hash of title + source, rendered as hex.
pub fn article_id(title: &str, source: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(source.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::from("article-");
    for b in digest.iter().take(6) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{b:02x}");
    }
    out
}

/// `ep-{n}` when the title carries an episode number, else a positional
/// `episode-{i}` with 1-based index.
pub fn episode_id(title: &str, index: usize) -> (String, Option<u32>) {
    static EP_RE: OnceCell<Regex> = OnceCell::new();
    let re = EP_RE.get_or_init(|| Regex::new(r"(?i)ep\s*(\d+)").unwrap());
    if let Some(n) = re
        .captures(title)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
    {
        return (format!("ep-{n}"), Some(n));
    }
    (format!("episode-{}", index + 1), None)
}

/// Image fallback chain; each step applies only if the prior yielded nothing.
pub fn resolve_image(raw: &RawFeedItem, channel_image: Option<&str>) -> String {
    if let Some(u) = raw.itunes_image.as_deref().filter(|u| !u.is_empty()) {
        return u.to_string();
    }
    if let Some(u) = raw.media_content.iter().find_map(usable_image_url) {
        return u;
    }
    if let Some(u) = raw
        .media_thumbnail
        .iter()
        .find_map(|m| m.url.clone().filter(|u| !u.is_empty()))
    {
        return u;
    }
    if let Some(u) = raw.enclosure.as_ref().and_then(usable_image_url) {
        return u;
    }
    if let Some(u) = raw
        .content_encoded
        .as_deref()
        .or(raw.description.as_deref())
        .and_then(first_img_src)
    {
        return u;
    }
    if let Some(u) = channel_image.filter(|u| !u.is_empty()) {
        return u.to_string();
    }
    FALLBACK_IMAGE.to_string()
}

/// A media reference is usable as an image unless it declares otherwise.
/// Podcast enclosures are audio and must not win the chain.
fn usable_image_url(m: &MediaRef) -> Option<String> {
    let url = m.url.as_deref().filter(|u| !u.is_empty())?;
    if let Some(medium) = m.medium.as_deref() {
        if !medium.eq_ignore_ascii_case("image") {
            return None;
        }
        return Some(url.to_string());
    }
    if let Some(mime) = m.mime.as_deref() {
        if !mime.starts_with("image/") {
            return None;
        }
        return Some(url.to_string());
    }
    let lower = url.to_lowercase();
    if [".jpg", ".jpeg", ".png", ".webp", ".gif"]
        .iter()
        .any(|ext| lower.ends_with(ext))
    {
        return Some(url.to_string());
    }
    // No type hints at all: trust the feed.
    Some(url.to_string())
}

fn first_img_src(html: &str) -> Option<String> {
    static IMG_RE: OnceCell<Regex> = OnceCell::new();
    let re = IMG_RE.get_or_init(|| Regex::new(r#"<img[^>]+src=["']([^"']+)["']"#).unwrap());
    re.captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Summary extraction: description, then `content:encoded`, both
/// HTML-stripped, else a fixed placeholder. Bounded with an ellipsis.
pub fn summarize(raw: &RawFeedItem) -> String {
    let mut text = raw
        .description
        .as_deref()
        .map(strip_html)
        .filter(|s| !s.is_empty())
        .or_else(|| {
            raw.content_encoded
                .as_deref()
                .map(strip_html)
                .filter(|s| !s.is_empty())
        })
        .unwrap_or_else(|| NO_SUMMARY.to_string());
    if text.chars().count() > SUMMARY_MAX_CHARS {
        text = text.chars().take(SUMMARY_MAX_CHARS).collect::<String>();
        let trimmed = text.trim_end().to_string();
        text = trimmed + "...";
    }
    text
}

/// Decode entities, strip tags, collapse whitespace.
pub fn strip_html(s: &str) -> String {
    let decoded = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| Regex::new(r"(?is)</?[^>]+>").unwrap());
    let stripped = re_tags.replace_all(&decoded, " ");

    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(&stripped, " ").trim().to_string()
}

/// RFC 2822 is the RSS norm; some feeds emit RFC 3339. Unknown formats
/// map to 0, which sorts last and renders as "Recently".
pub fn parse_pub_date(ts: &str) -> u64 {
    let ts = ts.trim();
    OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()
        .map(|dt| dt.to_offset(UtcOffset::UTC).unix_timestamp())
        .and_then(|x| u64::try_from(x).ok())
        .unwrap_or(0)
}

/// Human-relative date, computed against fetch time. Beyond 30 days the
/// absolute date is shown instead.
pub fn relative_date(published_at: u64, now: u64) -> String {
    if published_at == 0 {
        return "Recently".to_string();
    }
    let days = now.saturating_sub(published_at) / 86_400;
    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        7..=13 => "1 week ago".to_string(),
        14..=30 => format!("{} weeks ago", days / 7),
        _ => chrono::DateTime::from_timestamp(published_at as i64, 0)
            .map(|d| d.format("%b %-d, %Y").to_string())
            .unwrap_or_else(|| "Recently".to_string()),
    }
}

/// `itunes:duration` when present (bare seconds or clock forms), else a
/// word-count estimate from the show notes.
pub fn duration_label(itunes_duration: Option<&str>, description_text: &str) -> String {
    if let Some(mins) = itunes_duration.and_then(parse_duration_minutes) {
        return format!("{mins} min");
    }
    let words = description_text.split_whitespace().count();
    if words > 300 {
        "60 min".to_string()
    } else if words > 200 {
        "45 min".to_string()
    } else if words > 100 {
        "30 min".to_string()
    } else {
        "20 min".to_string()
    }
}

fn parse_duration_minutes(d: &str) -> Option<u64> {
    let d = d.trim();
    if d.is_empty() {
        return None;
    }
    if d.contains(':') {
        let parts = d
            .split(':')
            .map(|p| p.trim().parse::<u64>().ok())
            .collect::<Option<Vec<_>>>()?;
        let secs = match parts.as_slice() {
            [h, m, s] => h * 3600 + m * 60 + s,
            [m, s] => m * 60 + s,
            _ => return None,
        };
        return Some((secs / 60).max(1));
    }
    let secs = d.parse::<u64>().ok()?;
    Some((secs / 60).max(1))
}

/// Estimated reading time for news articles.
pub fn read_time_label(text: &str) -> String {
    let words = text.split_whitespace().count();
    let mins = (words / READ_WORDS_PER_MIN).max(1);
    format!("{mins} min read")
}
