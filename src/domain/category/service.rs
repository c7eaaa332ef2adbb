use super::{CreateCategoryRequest, UpdateCategoryRequest};
use crate::{
    domain::feed::{validation::validate_name, FeedCategory, FeedCategoryStore, FeedRepository},
    error::AppResult,
};
use std::sync::Arc;
use uuid::Uuid;

pub struct CategoryService {
    repository: Arc<dyn FeedRepository>,
}

impl CategoryService {
    pub fn new(repository: Arc<dyn FeedRepository>) -> Self {
        Self { repository }
    }

    pub async fn list_categories(&self) -> AppResult<Vec<FeedCategory>> {
        self.repository.fetch_all_categories().await
    }

    pub async fn create_category(&self, request: CreateCategoryRequest) -> AppResult<FeedCategory> {
        validate_name(&request.name)?;

        let mut category = FeedCategory::new(request.name.trim());
        let id = self.repository.store_category(&mut category).await?;
        tracing::info!(category_id = %id, name = %category.name, "Category created");

        Ok(category)
    }

    pub async fn get_category(&self, id: Uuid) -> AppResult<FeedCategory> {
        self.repository.fetch_category_by_id(id).await
    }

    /// Renames in place; the old name becomes available again.
    pub async fn rename_category(
        &self,
        id: Uuid,
        request: UpdateCategoryRequest,
    ) -> AppResult<FeedCategory> {
        validate_name(&request.name)?;

        let mut category = self.repository.fetch_category_by_id(id).await?;
        category.name = request.name.trim().to_string();
        self.repository.store_category(&mut category).await?;

        Ok(category)
    }

    /// Removes the category and every item/source relation pointing at it.
    pub async fn delete_category(&self, id: Uuid) -> AppResult<()> {
        self.repository.delete_category_by_id(id).await?;
        tracing::info!(category_id = %id, "Category deleted");
        Ok(())
    }
}
