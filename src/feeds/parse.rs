// src/feeds/parse.rs
//! RSS 2.0 parsing into [`RawFeedItem`]s, including the namespaced
//! extensions the upstream feeds actually use: `media:content`,
//! `media:thumbnail`, `itunes:*`, `enclosure`, `content:encoded`.

use std::borrow::Cow;

use anyhow::{Context, Result};
use quick_xml::de::from_str;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

use crate::feeds::types::{MediaRef, ParsedFeed, RawFeedItem};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

// quick-xml's serde layer matches elements by their *local* name: the
// namespace prefix is stripped before field lookup. `content:encoded`
// arrives as `encoded`, `itunes:duration` as `duration`, `media:content`
// as `content`, and both `<image>` and `<itunes:image>` as `image`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Channel {
    title: Option<String>,
    #[serde(rename = "image")]
    images: Vec<ImageTag>,
    #[serde(rename = "item")]
    items: Vec<Item>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "encoded")]
    content_encoded: Option<String>,
    #[serde(rename = "category")]
    categories: Vec<CategoryTag>,
    enclosure: Option<MediaTag>,
    #[serde(rename = "image")]
    images: Vec<ImageTag>,
    #[serde(rename = "duration")]
    itunes_duration: Option<String>,
    #[serde(rename = "content")]
    media_content: Vec<MediaTag>,
    #[serde(rename = "thumbnail")]
    media_thumbnail: Vec<MediaTag>,
}

// `<category domain="...">` carries attributes, so a bare String target
// would reject it.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CategoryTag {
    #[serde(rename = "$text")]
    value: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MediaTag {
    #[serde(rename = "@url")]
    url: Option<String>,
    #[serde(rename = "@medium")]
    medium: Option<String>,
    #[serde(rename = "@type")]
    mime: Option<String>,
}

// One shape for every `image` spelling: channel art as
// `<image><url>..</url></image>`, itunes art as `<itunes:image href=".."/>`
// (or with a `url` attribute, or the URL in the element text).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ImageTag {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@url")]
    url_attr: Option<String>,
    url: Option<String>,
    #[serde(rename = "$text")]
    text: Option<String>,
}

impl ImageTag {
    fn url(&self) -> Option<String> {
        self.url
            .as_deref()
            .or(self.href.as_deref())
            .or(self.url_attr.as_deref())
            .or(self.text.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

impl From<MediaTag> for MediaRef {
    fn from(m: MediaTag) -> Self {
        MediaRef {
            url: m.url,
            medium: m.medium,
            mime: m.mime,
        }
    }
}

/// Parse one RSS document. Items without a title are dropped; everything
/// else is carried over verbatim for the normalizer to interpret.
pub fn parse_feed(xml: &str) -> Result<ParsedFeed> {
    let xml_clean = scrub_html_entities_for_xml(xml);
    let rss: Rss = from_str(&xml_clean).context("parsing rss xml")?;

    let channel_image = rss.channel.images.iter().find_map(ImageTag::url);

    let mut items = Vec::with_capacity(rss.channel.items.len());
    for it in rss.channel.items {
        let title = match it.title.map(|t| t.trim().to_string()) {
            Some(t) if !t.is_empty() => t,
            _ => continue,
        };
        items.push(RawFeedItem {
            title,
            link: it.link,
            pub_date: it.pub_date,
            description: it.description,
            content_encoded: it.content_encoded,
            categories: it
                .categories
                .into_iter()
                .filter_map(|c| c.value)
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
            enclosure: it.enclosure.map(Into::into),
            itunes_image: it.images.iter().find_map(ImageTag::url),
            itunes_duration: it.itunes_duration,
            media_content: it.media_content.into_iter().map(Into::into).collect(),
            media_thumbnail: it.media_thumbnail.into_iter().map(Into::into).collect(),
        });
    }

    Ok(ParsedFeed {
        channel_title: rss.channel.title,
        channel_image,
        items,
    })
}

/// Truncate a feed document after its Nth `</item>` so oversized feeds are
/// never parsed in full. The cut point comes from a streaming reader, not a
/// substring scan, so CDATA or nested markup cannot produce a bad split.
/// Malformed input is returned untouched and left to `parse_feed` to report.
pub fn bounded_document(xml: &str, max_items: usize) -> Cow<'_, str> {
    if max_items == 0 {
        return Cow::Borrowed(xml);
    }
    let mut reader = Reader::from_str(xml);
    let mut seen = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::End(e)) if e.name().as_ref() == b"item" => {
                seen += 1;
                if seen >= max_items {
                    let cut = reader.buffer_position() as usize;
                    let mut out = String::with_capacity(cut + 24);
                    out.push_str(&xml[..cut]);
                    out.push_str("</channel></rss>");
                    return Cow::Owned(out);
                }
            }
            Ok(Event::Eof) => return Cow::Borrowed(xml),
            Ok(_) => {}
            Err(_) => return Cow::Borrowed(xml),
        }
    }
}

/// Bare named HTML entities inside element text are invalid XML; feeds emit
/// them anyway. Replace the usual suspects before handing to the parser.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel>
  <title>Chain Report</title>
  <image><url>https://chainreport.example/logo.png</url></image>
  <item>
    <title>Bitcoin hits new high</title>
    <link>https://chainreport.example/a1</link>
    <pubDate>Mon, 24 Aug 2026 10:00:00 GMT</pubDate>
    <description><![CDATA[<p>Markets &ndash; rally continues.</p>]]></description>
    <category domain="https://chainreport.example/tags">markets/bitcoin</category>
    <media:content url="https://img.example/a1.jpg" medium="image" type="image/jpeg"/>
  </item>
  <item>
    <title>  </title>
    <description>untitled, should be dropped</description>
  </item>
</channel>
</rss>"#;

    #[test]
    fn parses_channel_and_namespaced_fields() {
        let feed = parse_feed(FEED).unwrap();
        assert_eq!(feed.channel_title.as_deref(), Some("Chain Report"));
        assert_eq!(
            feed.channel_image.as_deref(),
            Some("https://chainreport.example/logo.png")
        );
        assert_eq!(feed.items.len(), 1, "untitled item must be dropped");

        let item = &feed.items[0];
        assert_eq!(item.title, "Bitcoin hits new high");
        assert_eq!(item.categories, vec!["markets/bitcoin".to_string()]);
        assert_eq!(
            item.media_content[0].url.as_deref(),
            Some("https://img.example/a1.jpg")
        );
    }

    // Prefixes are stripped by the deserializer, so every extension field
    // must be reachable under its local name.
    #[test]
    fn itunes_and_media_extensions_populate() {
        let xml = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/" xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd" xmlns:content="http://purl.org/rss/1.0/modules/content/">
<channel>
  <title>Chain Talk</title>
  <image><url>https://chan.example/logo.png</url></image>
  <itunes:image href="https://chan.example/itunes.png"/>
  <item>
    <title>Ep 1: Genesis</title>
    <itunes:image href="https://img.example/ep1.png"/>
    <itunes:duration>360</itunes:duration>
    <content:encoded><![CDATA[<p>notes <img src="https://img.example/inline.png"></p>]]></content:encoded>
    <media:content url="https://img.example/m.jpg" medium="image" type="image/jpeg"/>
    <media:thumbnail url="https://img.example/th.jpg"/>
  </item>
</channel>
</rss>"#;
        let feed = parse_feed(xml).unwrap();
        // Both channel image spellings coexist; the first usable URL wins.
        assert_eq!(
            feed.channel_image.as_deref(),
            Some("https://chan.example/logo.png")
        );

        let item = &feed.items[0];
        assert_eq!(
            item.itunes_image.as_deref(),
            Some("https://img.example/ep1.png")
        );
        assert_eq!(item.itunes_duration.as_deref(), Some("360"));
        assert!(item
            .content_encoded
            .as_deref()
            .unwrap()
            .contains("inline.png"));
        assert_eq!(
            item.media_content[0].url.as_deref(),
            Some("https://img.example/m.jpg")
        );
        assert_eq!(
            item.media_thumbnail[0].url.as_deref(),
            Some("https://img.example/th.jpg")
        );
    }

    #[test]
    fn bounded_document_keeps_first_n_items() {
        let xml = r#"<rss><channel><title>t</title>
<item><title>one</title><description><![CDATA[x </item> y]]></description></item>
<item><title>two</title></item>
<item><title>three</title></item>
</channel></rss>"#;
        let bounded = bounded_document(xml, 2);
        let feed = parse_feed(&bounded).unwrap();
        assert_eq!(feed.items.len(), 2);
        assert_eq!(feed.items[1].title, "two");
    }

    #[test]
    fn bounded_document_passes_short_feeds_through() {
        let xml = "<rss><channel><item><title>only</title></item></channel></rss>";
        assert!(matches!(bounded_document(xml, 10), Cow::Borrowed(_)));
    }
}
