use crate::domain::collector::{CollectedFeed, FeedCollector};
use crate::domain::feed::{FeedItem, FeedItemImage};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use feed_rs::model::{Entry, Feed};
use std::time::Duration;

const COLLECT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("rss-collector/", env!("CARGO_PKG_VERSION"));

/// Collects RSS, Atom and JSON Feed documents over HTTP.
pub struct HttpFeedCollector {
    http_client: reqwest::Client,
}

impl HttpFeedCollector {
    pub fn new() -> AppResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(COLLECT_TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .gzip(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl FeedCollector for HttpFeedCollector {
    async fn collect(&self, feed_url: &str) -> AppResult<CollectedFeed> {
        if feed_url.trim().is_empty() || !feed_url.starts_with("http") {
            return Err(AppError::BadRequest(format!(
                "feed URL must be an http(s) address: {}",
                feed_url
            )));
        }

        tracing::debug!(feed_url, "Collecting feed");

        let response = self
            .http_client
            .get(feed_url)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Failed to fetch {}: {}", feed_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::ExternalService(format!(
                "HTTP {} for {}",
                status.as_u16(),
                feed_url
            )));
        }

        let body = response.bytes().await.map_err(|e| {
            AppError::ExternalService(format!("Failed to read body of {}: {}", feed_url, e))
        })?;

        let collected = parse_feed(body.as_ref())?;
        tracing::info!(
            feed_url,
            item_count = collected.items.len(),
            "Feed collected"
        );
        Ok(collected)
    }
}

/// Parses a feed document and maps every entry onto a `FeedItem`.
pub fn parse_feed(body: &[u8]) -> AppResult<CollectedFeed> {
    let feed = feed_rs::parser::parse(body)
        .map_err(|e| AppError::ExternalService(format!("Failed to parse feed: {}", e)))?;

    Ok(collected_from(feed))
}

fn collected_from(feed: Feed) -> CollectedFeed {
    CollectedFeed {
        title: feed.title.map(|t| t.content).unwrap_or_default(),
        items: feed.entries.into_iter().map(item_from_entry).collect(),
        collected_at: Utc::now(),
    }
}

fn item_from_entry(entry: Entry) -> FeedItem {
    let image = entry_image(&entry);

    FeedItem {
        title: entry.title.map(|t| t.content).unwrap_or_default(),
        description: entry.summary.map(|s| s.content).unwrap_or_default(),
        content: entry.content.and_then(|c| c.body).unwrap_or_default(),
        link: entry
            .links
            .into_iter()
            .next()
            .map(|l| l.href)
            .unwrap_or_default(),
        updated: entry.updated,
        published: entry.published,
        author: entry
            .authors
            .into_iter()
            .next()
            .map(|a| a.name)
            .unwrap_or_default(),
        guid: entry.id,
        image,
        categories: entry.categories.into_iter().map(|c| c.term).collect(),
        ..Default::default()
    }
}

/// First media thumbnail, falling back to the first image-typed media content.
fn entry_image(entry: &Entry) -> Option<FeedItemImage> {
    let thumbnail = entry
        .media
        .iter()
        .flat_map(|media| media.thumbnails.iter())
        .next()
        .map(|thumb| FeedItemImage {
            url: thumb.image.uri.clone(),
            title: thumb.image.title.clone().unwrap_or_default(),
        });

    thumbnail.or_else(|| {
        entry.media.iter().find_map(|media| {
            media
                .content
                .iter()
                .filter(|content| {
                    content
                        .content_type
                        .as_ref()
                        .map_or(false, |mime| mime.type_().as_str() == "image")
                })
                .find_map(|content| content.url.as_ref())
                .map(|url| FeedItemImage {
                    url: url.to_string(),
                    title: media.title.as_ref().map(|t| t.content.clone()).unwrap_or_default(),
                })
        })
    })
}
