use crate::domain::feed::FeedItem;
use crate::error::AppResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Result of collecting a remote feed document.
#[derive(Debug, Clone, Default)]
pub struct CollectedFeed {
    pub title: String,
    pub items: Vec<FeedItem>,
    pub collected_at: DateTime<Utc>,
}

/// Fetches and normalizes a remote feed.
///
/// Implementations return items with timestamps, author, image and custom
/// fields already mapped onto `FeedItem`; ids and source ids are left empty
/// for the item store to assign.
#[async_trait]
pub trait FeedCollector: Send + Sync {
    async fn collect(&self, feed_url: &str) -> AppResult<CollectedFeed>;
}
