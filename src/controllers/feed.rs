use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::domain::feed::{
    validation::validate_id, CreateFeedRequest, CreateFeedResponse, FeedSource,
    FeedSourcePartial, UpdateFeedRequest, UpdateFeedResponse,
};
use crate::{
    domain::feed::{FeedService, FeedServiceApi},
    error::AppResult,
};

pub struct FeedController {
    feed_service: Arc<FeedService>,
}

impl FeedController {
    pub fn new(feed_service: Arc<FeedService>) -> Self {
        Self { feed_service }
    }

    /// GET /feeds - List tracked feed sources
    pub async fn list_feeds(
        State(controller): State<Arc<FeedController>>,
    ) -> AppResult<Json<Vec<FeedSourcePartial>>> {
        let feeds = controller.feed_service.list_feeds().await?;
        Ok(Json(feeds))
    }

    /// POST /feeds - Collect a feed and start tracking it
    pub async fn create_feed(
        State(controller): State<Arc<FeedController>>,
        Json(request): Json<CreateFeedRequest>,
    ) -> AppResult<(StatusCode, Json<CreateFeedResponse>)> {
        let created = controller.feed_service.create_feed(request).await?;
        Ok((StatusCode::CREATED, Json(created)))
    }

    /// GET /feeds/{feedId} - Feed source with its items
    pub async fn get_feed(
        State(controller): State<Arc<FeedController>>,
        Path(feed_id): Path<String>,
    ) -> AppResult<Json<FeedSource>> {
        let feed_id = validate_id(&feed_id)?;
        let feed = controller.feed_service.get_feed(feed_id).await?;
        Ok(Json(feed))
    }

    /// PUT /feeds/{feedId} - Replace URL and/or categories
    pub async fn update_feed(
        State(controller): State<Arc<FeedController>>,
        Path(feed_id): Path<String>,
        Json(request): Json<UpdateFeedRequest>,
    ) -> AppResult<Json<UpdateFeedResponse>> {
        let feed_id = validate_id(&feed_id)?;
        let updated = controller
            .feed_service
            .update_feed(feed_id, request)
            .await?;
        Ok(Json(updated))
    }

    /// DELETE /feeds/{feedId} - Delete feed and its items
    pub async fn delete_feed(
        State(controller): State<Arc<FeedController>>,
        Path(feed_id): Path<String>,
    ) -> AppResult<Json<Value>> {
        let feed_id = validate_id(&feed_id)?;
        controller.feed_service.delete_feed(feed_id).await?;
        Ok(Json(json!({ "id": feed_id })))
    }
}
