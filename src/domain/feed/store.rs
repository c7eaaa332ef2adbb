use super::model::{FeedCategory, FeedItem, FeedSource, FeedSourcePartial, ItemOptions};
use crate::error::AppResult;
use async_trait::async_trait;
use uuid::Uuid;

/// Persistence for feed sources.
///
/// Storing upserts on the presence of `source.id`: an absent id is generated
/// together with the derived link, a present id replaces the stored value.
/// The source's `items` are not written here; they belong to the item store.
#[async_trait]
pub trait FeedSourceStore: Send + Sync {
    async fn store_source(&self, source: &mut FeedSource) -> AppResult<Uuid>;

    /// Returns the source with its items, oldest published first.
    async fn fetch_source(&self, id: Uuid) -> AppResult<FeedSource>;

    async fn fetch_all_sources(&self) -> AppResult<Vec<FeedSourcePartial>>;

    /// Removes the source and every item it owns. Absent ids are not an error.
    async fn delete_source_by_id(&self, id: Uuid) -> AppResult<()>;
}

/// Persistence for collected items.
#[async_trait]
pub trait FeedItemStore: Send + Sync {
    /// Upserts a single item under `source_id`, overwriting `item.source_id`.
    async fn store_item(&self, source_id: Uuid, item: &mut FeedItem) -> AppResult<Uuid>;

    /// Creates every item under `source_id` with a fresh id, even when the
    /// caller supplied one.
    async fn store_items(&self, source_id: Uuid, items: &mut [FeedItem]) -> AppResult<()>;

    async fn fetch_item_by_id(&self, id: Uuid) -> AppResult<FeedItem>;

    /// Returns matching items sorted by `published`. An empty match is
    /// reported as `AppError::NotFound`, not as an empty list.
    async fn fetch_all_items(&self, options: &ItemOptions) -> AppResult<Vec<FeedItem>>;

    async fn delete_item_by_id(&self, id: Uuid) -> AppResult<()>;
}

/// Persistence for the category taxonomy. Names are unique.
#[async_trait]
pub trait FeedCategoryStore: Send + Sync {
    async fn store_category(&self, category: &mut FeedCategory) -> AppResult<Uuid>;

    async fn fetch_category_by_id(&self, id: Uuid) -> AppResult<FeedCategory>;

    async fn fetch_category_by_name(&self, name: &str) -> AppResult<FeedCategory>;

    /// All-or-nothing: any missing id fails the whole lookup.
    async fn fetch_categories_for_ids(&self, ids: &[Uuid]) -> AppResult<Vec<FeedCategory>>;

    async fn fetch_all_categories(&self) -> AppResult<Vec<FeedCategory>>;

    /// Removes the category and its relation to every item and source.
    async fn delete_category_by_id(&self, id: Uuid) -> AppResult<()>;
}

/// A backend satisfying the whole repository contract.
pub trait FeedRepository: FeedSourceStore + FeedItemStore + FeedCategoryStore {}

impl<T> FeedRepository for T where T: FeedSourceStore + FeedItemStore + FeedCategoryStore {}
