use crate::domain::feed::model::assign_id;
use crate::domain::feed::{
    feed_source_link, sort_by_published, FeedCategory, FeedCategoryStore, FeedItem,
    FeedItemStore, FeedSource, FeedSourcePartial, FeedSourceStore, ItemOptions,
};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    sources: HashMap<Uuid, FeedSourcePartial>,
    /// Item ids per source, in insertion order.
    items_by_source: HashMap<Uuid, Vec<Uuid>>,
    items: HashMap<Uuid, FeedItem>,
    category_names: HashMap<Uuid, String>,
    category_ids: HashMap<String, Uuid>,
}

impl MemoryState {
    fn detach_item(&mut self, item_id: Uuid, source_id: Uuid) {
        if let Some(ids) = self.items_by_source.get_mut(&source_id) {
            ids.retain(|id| *id != item_id);
        }
    }

    fn attach_item(&mut self, item_id: Uuid, source_id: Uuid) {
        let ids = self.items_by_source.entry(source_id).or_default();
        if !ids.contains(&item_id) {
            ids.push(item_id);
        }
    }

    fn category(&self, id: Uuid) -> AppResult<FeedCategory> {
        self.category_names
            .get(&id)
            .map(|name| FeedCategory {
                id: Some(id),
                name: name.clone(),
            })
            .ok_or_else(|| AppError::NotFound(format!("no category found with id: {}", id)))
    }
}

/// Process-local store. One reader/writer lock guards every map, so each
/// call is atomic with respect to every other call on the same instance.
#[derive(Debug, Default)]
pub struct MemoryFeedStore {
    state: RwLock<MemoryState>,
}

impl MemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FeedSourceStore for MemoryFeedStore {
    async fn store_source(&self, source: &mut FeedSource) -> AppResult<Uuid> {
        let mut state = self.state.write();
        let (id, _) = assign_id(&mut source.id);
        source.link = feed_source_link(id);
        state.sources.insert(id, source.partial());
        Ok(id)
    }

    async fn fetch_source(&self, id: Uuid) -> AppResult<FeedSource> {
        let state = self.state.read();
        let partial = state
            .sources
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no feed found for id: {}", id)))?;

        let mut items: Vec<FeedItem> = state
            .items_by_source
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|item_id| state.items.get(item_id).cloned())
            .collect();
        sort_by_published(&mut items);

        Ok(partial.into_source(items))
    }

    async fn fetch_all_sources(&self) -> AppResult<Vec<FeedSourcePartial>> {
        let state = self.state.read();
        let mut sources: Vec<FeedSourcePartial> = state.sources.values().cloned().collect();
        sources.sort_by(|a, b| a.feed_url.cmp(&b.feed_url).then(a.id.cmp(&b.id)));
        Ok(sources)
    }

    async fn delete_source_by_id(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write();
        if let Some(item_ids) = state.items_by_source.remove(&id) {
            for item_id in item_ids {
                state.items.remove(&item_id);
            }
        }
        state.items.retain(|_, item| item.source_id != Some(id));
        state.sources.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl FeedItemStore for MemoryFeedStore {
    async fn store_item(&self, source_id: Uuid, item: &mut FeedItem) -> AppResult<Uuid> {
        let mut state = self.state.write();
        item.source_id = Some(source_id);
        let (id, created) = assign_id(&mut item.id);

        if !created {
            let previous_source = state.items.get(&id).and_then(|stored| stored.source_id);
            if let Some(previous_source) = previous_source.filter(|s| *s != source_id) {
                state.detach_item(id, previous_source);
            }
        }

        state.attach_item(id, source_id);
        state.items.insert(id, item.clone());
        Ok(id)
    }

    async fn store_items(&self, source_id: Uuid, items: &mut [FeedItem]) -> AppResult<()> {
        let mut state = self.state.write();
        for item in items.iter_mut() {
            let id = Uuid::new_v4();
            item.id = Some(id);
            item.source_id = Some(source_id);
            state.attach_item(id, source_id);
            state.items.insert(id, item.clone());
        }
        Ok(())
    }

    async fn fetch_item_by_id(&self, id: Uuid) -> AppResult<FeedItem> {
        self.state
            .read()
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("no feed item found with id: {}", id)))
    }

    async fn fetch_all_items(&self, options: &ItemOptions) -> AppResult<Vec<FeedItem>> {
        let state = self.state.read();
        let mut results: Vec<FeedItem> = state
            .items_by_source
            .iter()
            .filter(|(source_id, _)| options.source_id.map_or(true, |id| id == **source_id))
            .flat_map(|(_, item_ids)| item_ids.iter())
            .filter_map(|item_id| state.items.get(item_id))
            .filter(|item| options.matches(item))
            .cloned()
            .collect();

        if results.is_empty() {
            return Err(AppError::NotFound(format!(
                "no items found for options: {:?}",
                options
            )));
        }

        sort_by_published(&mut results);
        Ok(results)
    }

    async fn delete_item_by_id(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write();
        if let Some(source_id) = state.items.remove(&id).and_then(|item| item.source_id) {
            state.detach_item(id, source_id);
        }
        Ok(())
    }
}

#[async_trait]
impl FeedCategoryStore for MemoryFeedStore {
    async fn store_category(&self, category: &mut FeedCategory) -> AppResult<Uuid> {
        if category.name.trim().is_empty() {
            return Err(AppError::BadRequest("category name is empty".to_string()));
        }

        let mut state = self.state.write();
        if let Some(&owner) = state.category_ids.get(&category.name) {
            if category.id != Some(owner) {
                return Err(AppError::Conflict(format!(
                    "category name already exists: {}",
                    category.name
                )));
            }
        }

        let (id, _) = assign_id(&mut category.id);
        if let Some(old_name) = state.category_names.insert(id, category.name.clone()) {
            if old_name != category.name {
                state.category_ids.remove(&old_name);
            }
        }
        state.category_ids.insert(category.name.clone(), id);
        Ok(id)
    }

    async fn fetch_category_by_id(&self, id: Uuid) -> AppResult<FeedCategory> {
        self.state.read().category(id)
    }

    async fn fetch_category_by_name(&self, name: &str) -> AppResult<FeedCategory> {
        self.state
            .read()
            .category_ids
            .get(name)
            .map(|id| FeedCategory {
                id: Some(*id),
                name: name.to_string(),
            })
            .ok_or_else(|| AppError::NotFound(format!("no category found with name: {}", name)))
    }

    async fn fetch_categories_for_ids(&self, ids: &[Uuid]) -> AppResult<Vec<FeedCategory>> {
        let state = self.state.read();
        let mut seen = HashSet::new();
        ids.iter()
            .filter(|id| seen.insert(**id))
            .map(|id| state.category(*id))
            .collect()
    }

    async fn fetch_all_categories(&self) -> AppResult<Vec<FeedCategory>> {
        let state = self.state.read();
        let mut categories: Vec<FeedCategory> = state
            .category_names
            .iter()
            .map(|(id, name)| FeedCategory {
                id: Some(*id),
                name: name.clone(),
            })
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn delete_category_by_id(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write();
        let Some(name) = state.category_names.remove(&id) else {
            return Ok(());
        };
        state.category_ids.remove(&name);

        for item in state.items.values_mut() {
            item.category_ids.retain(|category_id| *category_id != id);
        }
        for source in state.sources.values_mut() {
            source.category_ids.retain(|category_id| *category_id != id);
        }

        tracing::debug!(category_id = %id, "Category removed from items and sources");
        Ok(())
    }
}
