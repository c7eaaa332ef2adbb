use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::{
    domain::category::{CategoryService, CreateCategoryRequest, UpdateCategoryRequest},
    domain::feed::{validation::validate_id, FeedCategory},
    error::AppResult,
};

pub struct CategoryController {
    category_service: Arc<CategoryService>,
}

impl CategoryController {
    pub fn new(category_service: Arc<CategoryService>) -> Self {
        Self { category_service }
    }

    /// GET /categories - All categories ordered by name
    pub async fn list_categories(
        State(controller): State<Arc<CategoryController>>,
    ) -> AppResult<Json<Vec<FeedCategory>>> {
        let categories = controller.category_service.list_categories().await?;
        Ok(Json(categories))
    }

    /// POST /categories - Create category; names are unique
    pub async fn create_category(
        State(controller): State<Arc<CategoryController>>,
        Json(request): Json<CreateCategoryRequest>,
    ) -> AppResult<(StatusCode, Json<FeedCategory>)> {
        let category = controller.category_service.create_category(request).await?;
        Ok((StatusCode::CREATED, Json(category)))
    }

    /// GET /categories/{categoryId}
    pub async fn get_category(
        State(controller): State<Arc<CategoryController>>,
        Path(category_id): Path<String>,
    ) -> AppResult<Json<FeedCategory>> {
        let category_id = validate_id(&category_id)?;
        let category = controller.category_service.get_category(category_id).await?;
        Ok(Json(category))
    }

    /// PUT /categories/{categoryId} - Rename
    pub async fn update_category(
        State(controller): State<Arc<CategoryController>>,
        Path(category_id): Path<String>,
        Json(request): Json<UpdateCategoryRequest>,
    ) -> AppResult<Json<FeedCategory>> {
        let category_id = validate_id(&category_id)?;
        let category = controller
            .category_service
            .rename_category(category_id, request)
            .await?;
        Ok(Json(category))
    }

    /// DELETE /categories/{categoryId} - Also detaches it from items and feeds
    pub async fn delete_category(
        State(controller): State<Arc<CategoryController>>,
        Path(category_id): Path<String>,
    ) -> AppResult<Json<Value>> {
        let category_id = validate_id(&category_id)?;
        controller
            .category_service
            .delete_category(category_id)
            .await?;
        Ok(Json(json!({ "id": category_id })))
    }
}
