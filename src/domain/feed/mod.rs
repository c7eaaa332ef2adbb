pub mod error;
pub mod model;
pub mod relations;
pub mod service;
pub mod store;
pub mod validation;

pub use error::FeedServiceError;
pub use model::{
    feed_source_link, sort_by_published, FeedCategory, FeedItem, FeedItemImage, FeedSource,
    FeedSourcePartial, ItemOptions,
};
pub use relations::{diff_relations, RelationDiff};
pub use service::{FeedService, FeedServiceApi};
pub use store::{FeedCategoryStore, FeedItemStore, FeedRepository, FeedSourceStore};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request to start tracking a feed
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFeedRequest {
    #[serde(alias = "feedURL")]
    pub feed_url: String,
}

/// Identifying information for a newly created feed
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateFeedResponse {
    pub id: Uuid,
    pub link: String,
}

/// Request to change a feed's URL and/or its categories.
/// `category_ids: Some(vec![])` clears every category.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeedRequest {
    #[serde(default, alias = "feedURL")]
    pub feed_url: Option<String>,
    #[serde(default, alias = "categoryIDs")]
    pub category_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateFeedResponse {
    pub feed: FeedSourcePartial,
}

/// Canonical list of category ids for an item
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItemRequest {
    #[serde(default, alias = "categoryIDs")]
    pub category_ids: Vec<String>,
}

/// Query string for GET /items
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemQuery {
    pub source_id: Option<String>,
    pub category_id: Option<String>,
}
