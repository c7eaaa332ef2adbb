use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    domain::feed::{
        validation::validate_id, FeedItem, FeedService, FeedServiceApi, ItemQuery,
        UpdateItemRequest,
    },
    error::AppResult,
};

pub struct ItemController {
    feed_service: Arc<FeedService>,
}

impl ItemController {
    pub fn new(feed_service: Arc<FeedService>) -> Self {
        Self { feed_service }
    }

    /// GET /items?sourceId=&categoryId= - Items sorted by publication time
    pub async fn list_items(
        State(controller): State<Arc<ItemController>>,
        Query(query): Query<ItemQuery>,
    ) -> AppResult<Json<Vec<FeedItem>>> {
        let items = controller.feed_service.list_items(query).await?;
        Ok(Json(items))
    }

    /// GET /items/{itemId}
    pub async fn get_item(
        State(controller): State<Arc<ItemController>>,
        Path(item_id): Path<String>,
    ) -> AppResult<Json<FeedItem>> {
        let item_id = validate_id(&item_id)?;
        let item = controller.feed_service.get_item(item_id).await?;
        Ok(Json(item))
    }

    /// PUT /items/{itemId} - Replace the item's categories
    pub async fn update_item(
        State(controller): State<Arc<ItemController>>,
        Path(item_id): Path<String>,
        Json(request): Json<UpdateItemRequest>,
    ) -> AppResult<Json<FeedItem>> {
        let item_id = validate_id(&item_id)?;
        let item = controller
            .feed_service
            .update_item(item_id, request)
            .await?;
        Ok(Json(item))
    }

    /// DELETE /items/{itemId}
    pub async fn delete_item(
        State(controller): State<Arc<ItemController>>,
        Path(item_id): Path<String>,
    ) -> AppResult<Json<Value>> {
        let item_id = validate_id(&item_id)?;
        controller.feed_service.delete_item(item_id).await?;
        Ok(Json(json!({ "id": item_id })))
    }
}
