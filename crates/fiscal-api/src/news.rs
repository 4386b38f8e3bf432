//! Real-world headlines pulled from RSS feeds and filtered to fiscal topics.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use contracts::{NarrativeEvent, NarrativeKind};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

pub const DEFAULT_FEEDS: &[&str] = &[
    "http://feeds.bbci.co.uk/news/politics/rss.xml",
    "http://feeds.bbci.co.uk/news/business/rss.xml",
    "https://www.theguardian.com/uk/money/rss",
    "https://www.theguardian.com/politics/rss",
];

pub const RELEVANT_KEYWORDS: &[&str] = &[
    "economy",
    "tax",
    "budget",
    "spending",
    "chancellor",
    "treasury",
    "inflation",
    "bank of england",
    "deficit",
    "nhs",
    "pension",
    "benefits",
    "debt",
    "gdp",
    "recession",
    "growth",
    "starmer",
    "reeves",
    "sunak",
    "labour",
    "tory",
    "conservative",
    "interest rates",
];

pub const MAX_CACHED_HEADLINES: usize = 20;
/// Headlines pushed to every subscriber after a refresh.
pub const REFRESH_BROADCAST: usize = 5;
/// Headlines replayed to a subscriber when it connects.
pub const CONNECT_REPLAY: usize = 10;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Error)]
pub enum NewsError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned status {0}")]
    Status(u16),
    #[error("feed is not well-formed: {0}")]
    Xml(#[from] quick_xml::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub description: String,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LiveHeadline {
    #[serde(flatten)]
    pub event: NarrativeEvent,
    pub published: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    Description,
    PubDate,
}

/// Items of an RSS 2.0 document. Unknown elements are ignored.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>, NewsError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut items = Vec::new();
    let mut current: Option<FeedItem> = None;
    let mut field: Option<ItemField> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.name().as_ref() {
                b"item" => current = Some(FeedItem::default()),
                b"title" if current.is_some() => field = Some(ItemField::Title),
                b"description" if current.is_some() => field = Some(ItemField::Description),
                b"pubDate" if current.is_some() => field = Some(ItemField::PubDate),
                _ => field = None,
            },
            Event::Text(text) => {
                if let (Some(item), Some(field)) = (current.as_mut(), field) {
                    push_field(item, field, &text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let (Some(item), Some(field)) = (current.as_mut(), field) {
                    push_field(item, field, &String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::End(end) => {
                if end.name().as_ref() == b"item" {
                    if let Some(item) = current.take() {
                        items.push(item);
                    }
                }
                field = None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(items)
}

fn push_field(item: &mut FeedItem, field: ItemField, value: &str) {
    match field {
        ItemField::Title => item.title.push_str(value),
        ItemField::Description => item.description.push_str(&strip_markup(value)),
        ItemField::PubDate => {
            item.published = DateTime::parse_from_rfc2822(value.trim())
                .ok()
                .map(|date| date.with_timezone(&Utc));
        }
    }
}

/// Drop anything between `<` and `>`; descriptions often carry inline HTML.
fn strip_markup(value: &str) -> String {
    let mut plain = String::with_capacity(value.len());
    let mut in_tag = false;
    for ch in value.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => plain.push(ch),
            _ => {}
        }
    }
    plain
}

pub fn is_relevant(item: &FeedItem) -> bool {
    let text = format!("{} {}", item.title, item.description).to_lowercase();
    RELEVANT_KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

pub fn live_headline(item: &FeedItem) -> LiveHeadline {
    LiveHeadline {
        event: NarrativeEvent::new(NarrativeKind::Live, format!("LIVE: {}", item.title.trim())),
        published: item.published,
    }
}

/// Newest first, undated items last, capped at [`MAX_CACHED_HEADLINES`].
pub fn merge_latest(mut headlines: Vec<LiveHeadline>) -> Vec<LiveHeadline> {
    headlines.sort_by(|a, b| b.published.cmp(&a.published));
    headlines.truncate(MAX_CACHED_HEADLINES);
    headlines
}

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, NewsError>;
}

#[derive(Debug, Clone)]
pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Result<Self, NewsError> {
        let client = Client::builder().timeout(FETCH_TIMEOUT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<String, NewsError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(NewsError::Status(response.status().as_u16()));
        }
        Ok(response.text().await?)
    }
}

/// Polls the configured feeds and keeps the freshest relevant headlines.
pub struct LiveNewsDesk {
    feeds: Vec<String>,
    fetcher: Arc<dyn FeedFetcher>,
    cache: RwLock<Vec<LiveHeadline>>,
}

impl LiveNewsDesk {
    pub fn new(feeds: Vec<String>) -> Result<Self, NewsError> {
        Ok(Self::with_fetcher(feeds, Arc::new(HttpFeedFetcher::new()?)))
    }

    pub fn with_fetcher(feeds: Vec<String>, fetcher: Arc<dyn FeedFetcher>) -> Self {
        Self {
            feeds,
            fetcher,
            cache: RwLock::new(Vec::new()),
        }
    }

    /// Re-read every feed and replace the cache. Returns the headlines to
    /// broadcast. A failing feed is logged and skipped.
    pub async fn refresh(&self) -> Vec<NarrativeEvent> {
        let mut collected = Vec::new();

        for feed in &self.feeds {
            let items = match self.fetcher.fetch(feed).await {
                Ok(body) => parse_feed(&body),
                Err(err) => Err(err),
            };
            match items {
                Ok(items) => collected.extend(
                    items
                        .iter()
                        .filter(|item| is_relevant(item))
                        .map(live_headline),
                ),
                Err(err) => {
                    warn!(target: "fiscal::news", feed = %feed, error = %err, "feed skipped");
                }
            }
        }

        let latest = merge_latest(collected);
        info!(target: "fiscal::news", count = latest.len(), "fetched relevant live news");

        let broadcast = latest
            .iter()
            .take(REFRESH_BROADCAST)
            .map(|headline| headline.event.clone())
            .collect();
        *self.cache.write().await = latest;
        broadcast
    }

    pub async fn latest(&self, limit: usize) -> Vec<NarrativeEvent> {
        self.cache
            .read()
            .await
            .iter()
            .take(limit)
            .map(|headline| headline.event.clone())
            .collect()
    }

    pub async fn cached(&self) -> Vec<LiveHeadline> {
        self.cache.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const BBC_FIXTURE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>BBC News - Politics</title>
    <item>
      <title><![CDATA[Chancellor rules out income tax rise]]></title>
      <description><![CDATA[<p>Reeves says the budget will hold.</p>]]></description>
      <pubDate>Tue, 14 Oct 2025 09:30:00 GMT</pubDate>
    </item>
    <item>
      <title>Football club wins cup</title>
      <description>Celebrations in the streets.</description>
      <pubDate>Tue, 14 Oct 2025 11:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Bank of England holds rates &amp; warns on growth</title>
      <description>Policy makers split.</description>
      <pubDate>Tue, 14 Oct 2025 12:15:00 +0100</pubDate>
    </item>
  </channel>
</rss>"#;

    const GUARDIAN_FIXTURE: &str = r#"<rss version="2.0"><channel>
<item><title>Pension triple lock under review</title><description>Ministers weigh options.</description><pubDate>Wed, 15 Oct 2025 07:00:00 GMT</pubDate></item>
<item><title>Undated NHS story</title><description>No date here.</description></item>
</channel></rss>"#;

    struct FixtureFetcher {
        bodies: HashMap<String, String>,
    }

    #[async_trait]
    impl FeedFetcher for FixtureFetcher {
        async fn fetch(&self, url: &str) -> Result<String, NewsError> {
            self.bodies
                .get(url)
                .cloned()
                .ok_or(NewsError::Status(404))
        }
    }

    #[test]
    fn parses_items_with_cdata_entities_and_dates() {
        let items = parse_feed(BBC_FIXTURE).expect("fixture parses");
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Chancellor rules out income tax rise");
        assert_eq!(items[0].description, "Reeves says the budget will hold.");
        assert_eq!(
            items[0].published.map(|date| date.to_rfc3339()),
            Some("2025-10-14T09:30:00+00:00".to_string())
        );
        assert_eq!(items[2].title, "Bank of England holds rates & warns on growth");
        assert_eq!(
            items[2].published.map(|date| date.to_rfc3339()),
            Some("2025-10-14T11:15:00+00:00".to_string())
        );
    }

    #[test]
    fn channel_title_is_not_an_item() {
        let items = parse_feed(BBC_FIXTURE).expect("fixture parses");
        assert!(items.iter().all(|item| item.title != "BBC News - Politics"));
    }

    #[test]
    fn relevance_checks_title_and_description() {
        let items = parse_feed(BBC_FIXTURE).expect("fixture parses");
        let relevant = items.iter().filter(|item| is_relevant(item)).count();
        assert_eq!(relevant, 2);

        let by_description = FeedItem {
            title: "Quiet day in Westminster".to_string(),
            description: "The Treasury published figures".to_string(),
            published: None,
        };
        assert!(is_relevant(&by_description));
    }

    #[test]
    fn merge_sorts_newest_first_and_caps() {
        let mut headlines = Vec::new();
        for hour in 0..30 {
            headlines.push(LiveHeadline {
                event: NarrativeEvent::new(NarrativeKind::Live, format!("LIVE: {hour}")),
                published: DateTime::parse_from_rfc3339(&format!("2025-10-14T{:02}:00:00Z", hour % 24))
                    .ok()
                    .map(|date| date.with_timezone(&Utc)),
            });
        }
        let merged = merge_latest(headlines);
        assert_eq!(merged.len(), MAX_CACHED_HEADLINES);
        assert!(merged
            .windows(2)
            .all(|pair| pair[0].published >= pair[1].published));
    }

    #[tokio::test]
    async fn refresh_merges_feeds_and_skips_failures() {
        let fetcher = FixtureFetcher {
            bodies: HashMap::from([
                ("bbc".to_string(), BBC_FIXTURE.to_string()),
                ("guardian".to_string(), GUARDIAN_FIXTURE.to_string()),
                ("broken".to_string(), "<rss><channel><item></channel>".to_string()),
            ]),
        };
        let desk = LiveNewsDesk::with_fetcher(
            vec![
                "bbc".to_string(),
                "missing".to_string(),
                "guardian".to_string(),
                "broken".to_string(),
            ],
            Arc::new(fetcher),
        );

        let broadcast = desk.refresh().await;
        let texts = broadcast
            .iter()
            .map(|event| event.text.as_str())
            .collect::<Vec<_>>();
        assert_eq!(
            texts,
            vec![
                "LIVE: Pension triple lock under review",
                "LIVE: Bank of England holds rates & warns on growth",
                "LIVE: Chancellor rules out income tax rise",
                "LIVE: Undated NHS story",
            ]
        );
        assert!(broadcast.iter().all(|event| event.kind == NarrativeKind::Live));
        assert_eq!(desk.latest(2).await.len(), 2);
        assert_eq!(desk.cached().await.len(), 4);
    }
}
