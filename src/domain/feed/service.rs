use super::error::FeedServiceError;
use super::store::{FeedCategoryStore, FeedItemStore, FeedSourceStore};
use super::validation::{validate_feed_url, validate_id, validate_ids};
use super::{
    CreateFeedRequest, CreateFeedResponse, FeedItem, FeedRepository, FeedSource,
    FeedSourcePartial, ItemOptions, ItemQuery, UpdateFeedRequest, UpdateFeedResponse,
    UpdateItemRequest,
};
use crate::domain::collector::FeedCollector;
use crate::error::AppError;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub struct FeedService {
    repository: Arc<dyn FeedRepository>,
    collector: Arc<dyn FeedCollector>,
}

impl FeedService {
    pub fn new(repository: Arc<dyn FeedRepository>, collector: Arc<dyn FeedCollector>) -> Self {
        Self {
            repository,
            collector,
        }
    }
}

#[async_trait]
pub trait FeedServiceApi: Send + Sync {
    async fn list_feeds(&self) -> Result<Vec<FeedSourcePartial>, FeedServiceError>;

    async fn create_feed(
        &self,
        request: CreateFeedRequest,
    ) -> Result<CreateFeedResponse, FeedServiceError>;

    async fn get_feed(&self, feed_id: Uuid) -> Result<FeedSource, FeedServiceError>;

    async fn update_feed(
        &self,
        feed_id: Uuid,
        request: UpdateFeedRequest,
    ) -> Result<UpdateFeedResponse, FeedServiceError>;

    async fn delete_feed(&self, feed_id: Uuid) -> Result<(), FeedServiceError>;

    async fn list_items(&self, query: ItemQuery) -> Result<Vec<FeedItem>, FeedServiceError>;

    async fn get_item(&self, item_id: Uuid) -> Result<FeedItem, FeedServiceError>;

    async fn update_item(
        &self,
        item_id: Uuid,
        request: UpdateItemRequest,
    ) -> Result<FeedItem, FeedServiceError>;

    async fn delete_item(&self, item_id: Uuid) -> Result<(), FeedServiceError>;
}

#[async_trait]
impl FeedServiceApi for FeedService {
    async fn list_feeds(&self) -> Result<Vec<FeedSourcePartial>, FeedServiceError> {
        Ok(self.repository.fetch_all_sources().await?)
    }

    async fn create_feed(
        &self,
        request: CreateFeedRequest,
    ) -> Result<CreateFeedResponse, FeedServiceError> {
        validate_feed_url(&request.feed_url)?;

        let collected = self.collector.collect(&request.feed_url).await?;

        let mut source = FeedSource::new(request.feed_url);
        source.title = collected.title;
        source.last_collected = Some(collected.collected_at);
        let source_id = self.repository.store_source(&mut source).await?;

        let mut items = collected.items;
        if !items.is_empty() {
            self.repository.store_items(source_id, &mut items).await?;
        }

        tracing::info!(
            source_id = %source_id,
            feed_url = %source.feed_url,
            item_count = items.len(),
            "Feed source created"
        );

        Ok(CreateFeedResponse {
            id: source_id,
            link: source.link,
        })
    }

    async fn get_feed(&self, feed_id: Uuid) -> Result<FeedSource, FeedServiceError> {
        Ok(self.repository.fetch_source(feed_id).await?)
    }

    async fn update_feed(
        &self,
        feed_id: Uuid,
        request: UpdateFeedRequest,
    ) -> Result<UpdateFeedResponse, FeedServiceError> {
        let mut source = self.repository.fetch_source(feed_id).await?;

        if let Some(feed_url) = request.feed_url.filter(|url| !url.is_empty()) {
            if feed_url != source.feed_url {
                validate_feed_url(&feed_url)?;
                source.feed_url = feed_url;
            }
        }

        if let Some(category_ids) = request.category_ids {
            source.category_ids = self.known_category_ids(&category_ids).await?;
        }

        self.repository.store_source(&mut source).await?;

        Ok(UpdateFeedResponse {
            feed: source.partial(),
        })
    }

    async fn delete_feed(&self, feed_id: Uuid) -> Result<(), FeedServiceError> {
        self.repository.delete_source_by_id(feed_id).await?;
        tracing::info!(source_id = %feed_id, "Feed source deleted");
        Ok(())
    }

    async fn list_items(&self, query: ItemQuery) -> Result<Vec<FeedItem>, FeedServiceError> {
        let mut options = ItemOptions::default();
        if let Some(source_id) = query.source_id.filter(|id| !id.is_empty()) {
            options.source_id = Some(validate_id(&source_id)?);
        }
        if let Some(category_id) = query.category_id.filter(|id| !id.is_empty()) {
            options.category_ids = vec![validate_id(&category_id)?];
        }

        Ok(self.repository.fetch_all_items(&options).await?)
    }

    async fn get_item(&self, item_id: Uuid) -> Result<FeedItem, FeedServiceError> {
        Ok(self.repository.fetch_item_by_id(item_id).await?)
    }

    async fn update_item(
        &self,
        item_id: Uuid,
        request: UpdateItemRequest,
    ) -> Result<FeedItem, FeedServiceError> {
        let category_ids = self.known_category_ids(&request.category_ids).await?;

        let mut item = self.repository.fetch_item_by_id(item_id).await?;
        let source_id = item.source_id.ok_or_else(|| {
            FeedServiceError::Dependency(format!("item {} has no source", item_id))
        })?;

        item.category_ids = category_ids;
        self.repository.store_item(source_id, &mut item).await?;

        Ok(item)
    }

    async fn delete_item(&self, item_id: Uuid) -> Result<(), FeedServiceError> {
        self.repository.delete_item_by_id(item_id).await?;
        Ok(())
    }
}

impl FeedService {
    /// Parses the ids and checks every one names a stored category.
    async fn known_category_ids(&self, raw: &[String]) -> Result<Vec<Uuid>, FeedServiceError> {
        let ids = validate_ids(raw)?;
        if ids.is_empty() {
            return Ok(ids);
        }

        self.repository
            .fetch_categories_for_ids(&ids)
            .await
            .map_err(|e| match e {
                AppError::NotFound(msg) => FeedServiceError::Invalid(msg),
                other => FeedServiceError::from(other),
            })?;

        Ok(ids)
    }
}
