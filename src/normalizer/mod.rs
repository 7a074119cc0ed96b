use chrono::Utc;
use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{Result, TributaryError};
use crate::domain::Entry;

#[derive(Debug, Clone)]
pub struct FeedMeta {
    pub title: Option<String>,
}

/// Degenerate documents whose root is an RSS or Atom element but which carry
/// no items. These are valid feeds with zero entries.
fn is_empty_feed_document(body: &[u8]) -> bool {
    let text = String::from_utf8_lossy(body);
    let mut doc = text.trim();
    if let Some(rest) = doc.strip_prefix("<?xml") {
        match rest.find("?>") {
            Some(end) => doc = rest[end + 2..].trim_start(),
            None => return false,
        }
    }
    (doc.starts_with("<rss") || doc.starts_with("<feed"))
        && !doc.contains("<item")
        && !doc.contains("<entry")
}

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse an RSS/Atom document into candidate entries for one feed.
    ///
    /// Entries with no source timestamp fall back to the fetch time so that
    /// ordering and retention always have a publication key.
    pub fn normalize(
        &self,
        user_id: i64,
        feed_id: i64,
        subscription: &str,
        body: &[u8],
    ) -> Result<(FeedMeta, Vec<Entry>)> {
        let feed = match parser::parse(body) {
            Ok(feed) => feed,
            // A bare `<rss></rss>` or `<feed/>` is a feed with nothing in it,
            // not a broken one; the parser rejects it for lacking children.
            Err(_) if is_empty_feed_document(body) => {
                return Ok((FeedMeta { title: None }, Vec::new()));
            }
            Err(e) => return Err(TributaryError::FeedParse(e.to_string())),
        };

        let meta = FeedMeta {
            title: feed
                .title
                .map(|t| decode_html_entities(&t.content).to_string()),
        };

        let entries: Vec<Entry> = feed
            .entries
            .into_iter()
            .map(|source| {
                let link = source.links.first().map(|l| l.href.clone());
                let source_id = if source.id.is_empty() {
                    link.clone().unwrap_or_default()
                } else {
                    source.id.clone()
                };

                let fingerprint = Entry::fingerprint(subscription, &source_id);
                let mut entry = Entry::new(user_id, feed_id, fingerprint);

                entry.title = source
                    .title
                    .map(|t| decode_html_entities(&t.content).to_string());
                entry.link = link;
                entry.content = source
                    .content
                    .and_then(|c| c.body)
                    .map(|b| decode_html_entities(&b).to_string());
                entry.summary = source
                    .summary
                    .map(|s| decode_html_entities(&s.content).to_string());
                entry.author = source.authors.first().map(|a| a.name.clone());
                entry.published_at = source
                    .published
                    .or(source.updated)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or(entry.fetched_at);

                entry
            })
            .collect();

        Ok((meta, entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Marker;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Test Feed</title>
    <description>A test feed</description>
    <item>
      <title>Test Item 1</title>
      <link>https://example.com/item1</link>
      <guid>item-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <description>This is item 1</description>
    </item>
    <item>
      <title>Test Item 2</title>
      <link>https://example.com/item2</link>
      <guid>item-2</guid>
      <description>This is item 2</description>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
    <summary>This is Atom entry 1</summary>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let normalizer = Normalizer::new();
        let (meta, entries) = normalizer
            .normalize(1, 1, "https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(meta.title, Some("Test Feed".into()));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, Some("Test Item 1".into()));
        assert_eq!(entries[0].link, Some("https://example.com/item1".into()));
        assert_eq!(entries[0].marker, Marker::Unread);
    }

    #[test]
    fn test_parse_atom() {
        let normalizer = Normalizer::new();
        let (meta, entries) = normalizer
            .normalize(1, 1, "https://example.com/feed.atom", ATOM_SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(meta.title, Some("Atom Test Feed".into()));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, Some("Atom Entry 1".into()));
    }

    #[test]
    fn test_empty_rss_document_has_no_entries() {
        let normalizer = Normalizer::new();
        let (_, entries) = normalizer
            .normalize(1, 1, "https://example.com/feed.xml", b"<rss></rss>")
            .unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_empty_atom_document_has_no_entries() {
        let normalizer = Normalizer::new();
        let (meta, entries) = normalizer
            .normalize(
                1,
                1,
                "https://example.com/feed.atom",
                b"<?xml version=\"1.0\"?>\n<feed xmlns=\"http://www.w3.org/2005/Atom\"/>",
            )
            .unwrap();
        assert!(meta.title.is_none());
        assert!(entries.is_empty());
    }

    #[test]
    fn test_unparsable_body_is_an_error() {
        let normalizer = Normalizer::new();
        let result = normalizer.normalize(1, 1, "https://example.com/feed.xml", b"not xml at all");
        assert!(matches!(result, Err(TributaryError::FeedParse(_))));
    }

    #[test]
    fn test_fingerprint_determinism() {
        let normalizer = Normalizer::new();
        let (_, first) = normalizer
            .normalize(1, 1, "https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();
        let (_, second) = normalizer
            .normalize(1, 1, "https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();

        assert_eq!(first[0].fingerprint, second[0].fingerprint);
        assert_eq!(first[1].fingerprint, second[1].fingerprint);
    }

    #[test]
    fn test_missing_timestamp_falls_back_to_fetch_time() {
        let normalizer = Normalizer::new();
        let (_, entries) = normalizer
            .normalize(1, 1, "https://example.com/feed.xml", RSS_SAMPLE.as_bytes())
            .unwrap();

        // Item 2 carries no pubDate.
        assert_eq!(entries[1].published_at, entries[1].fetched_at);
    }
}
