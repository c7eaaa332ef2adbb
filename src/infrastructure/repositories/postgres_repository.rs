use crate::domain::feed::model::assign_id;
use crate::domain::feed::{
    diff_relations, feed_source_link, sort_by_published, FeedCategory, FeedCategoryStore,
    FeedItem, FeedItemStore, FeedSource, FeedSourcePartial, FeedSourceStore, ItemOptions,
};
use crate::error::{AppError, AppResult};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, Postgres, Transaction};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

/// Join table linking an entity to the category taxonomy.
#[derive(Debug, Clone, Copy)]
enum CategoryRelation {
    Feed,
    Item,
}

impl CategoryRelation {
    fn select_sql(self) -> &'static str {
        match self {
            Self::Feed => "SELECT category_id FROM feed_categories WHERE feed_id = $1",
            Self::Item => "SELECT category_id FROM item_categories WHERE item_id = $1",
        }
    }

    fn select_many_sql(self) -> &'static str {
        match self {
            Self::Feed => {
                "SELECT feed_id, category_id FROM feed_categories WHERE feed_id = ANY($1)"
            }
            Self::Item => {
                "SELECT item_id, category_id FROM item_categories WHERE item_id = ANY($1)"
            }
        }
    }

    fn insert_sql(self) -> &'static str {
        match self {
            Self::Feed => {
                "INSERT INTO feed_categories (feed_id, category_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
            }
            Self::Item => {
                "INSERT INTO item_categories (item_id, category_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
            }
        }
    }

    fn delete_sql(self) -> &'static str {
        match self {
            Self::Feed => "DELETE FROM feed_categories WHERE feed_id = $1 AND category_id = $2",
            Self::Item => "DELETE FROM item_categories WHERE item_id = $1 AND category_id = $2",
        }
    }
}

#[derive(Debug, FromRow)]
struct SourceRow {
    id: Uuid,
    feed_data: Json<FeedSourcePartial>,
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    source_id: Uuid,
    item_data: Json<FeedItem>,
}

#[derive(Debug, FromRow)]
struct CategoryRow {
    id: Uuid,
    category_name: String,
}

impl From<CategoryRow> for FeedCategory {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: Some(row.id),
            name: row.category_name,
        }
    }
}

/// Relational store. Sources and items live as JSON documents next to their
/// id; category relations live in join tables, which are authoritative.
pub struct PostgresFeedStore {
    pool: Arc<DbPool>,
}

impl PostgresFeedStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Brings the join table rows for `owner` to exactly `desired`.
    async fn converge_categories(
        tx: &mut Transaction<'_, Postgres>,
        relation: CategoryRelation,
        owner: Uuid,
        desired: &[Uuid],
    ) -> AppResult<()> {
        let stored: Vec<Uuid> = sqlx::query_scalar(relation.select_sql())
            .bind(owner)
            .fetch_all(&mut **tx)
            .await?;

        let diff = diff_relations(desired, &stored);
        if diff.is_empty() {
            return Ok(());
        }

        for category_id in &diff.to_add {
            sqlx::query(relation.insert_sql())
                .bind(owner)
                .bind(category_id)
                .execute(&mut **tx)
                .await?;
        }
        for category_id in &diff.to_remove {
            sqlx::query(relation.delete_sql())
                .bind(owner)
                .bind(category_id)
                .execute(&mut **tx)
                .await?;
        }

        tracing::debug!(
            owner = %owner,
            relation = ?relation,
            added = diff.to_add.len(),
            removed = diff.to_remove.len(),
            "Category relations converged"
        );
        Ok(())
    }

    async fn insert_item(
        tx: &mut Transaction<'_, Postgres>,
        id: Uuid,
        source_id: Uuid,
        item: &FeedItem,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO items (id, source_id, item_data)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET source_id = EXCLUDED.source_id, item_data = EXCLUDED.item_data
            "#,
        )
        .bind(id)
        .bind(source_id)
        .bind(Json(item))
        .execute(&mut **tx)
        .await?;

        Self::converge_categories(tx, CategoryRelation::Item, id, &item.category_ids).await
    }

    /// Opens a read-only transaction on one snapshot, so values assembled
    /// from several queries never mix states from concurrent writes.
    async fn begin_snapshot(&self) -> AppResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        Ok(tx)
    }

    async fn category_edges(
        conn: &mut PgConnection,
        relation: CategoryRelation,
        owners: &[Uuid],
    ) -> AppResult<HashMap<Uuid, Vec<Uuid>>> {
        if owners.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, (Uuid, Uuid)>(relation.select_many_sql())
            .bind(owners)
            .fetch_all(&mut *conn)
            .await?;

        let mut edges: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (owner, category_id) in rows {
            edges.entry(owner).or_default().push(category_id);
        }
        Ok(edges)
    }

    /// Rebuilds items from their rows, with categories read from the join table.
    async fn items_from_rows(
        conn: &mut PgConnection,
        rows: Vec<ItemRow>,
    ) -> AppResult<Vec<FeedItem>> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut edges = Self::category_edges(conn, CategoryRelation::Item, &ids).await?;

        let mut items: Vec<FeedItem> = rows
            .into_iter()
            .map(|row| {
                let mut item = row.item_data.0;
                item.id = Some(row.id);
                item.source_id = Some(row.source_id);
                item.category_ids =
                    overlay_categories(&item.category_ids, edges.remove(&row.id).unwrap_or_default());
                item
            })
            .collect();
        sort_by_published(&mut items);
        Ok(items)
    }

    async fn query_items(
        conn: &mut PgConnection,
        options: &ItemOptions,
    ) -> AppResult<Vec<FeedItem>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT i.id, i.source_id, i.item_data
            FROM items i
            WHERE ($1::uuid IS NULL OR i.source_id = $1)
              AND (
                cardinality($2::uuid[]) = 0
                OR EXISTS (
                    SELECT 1 FROM item_categories ic
                    WHERE ic.item_id = i.id AND ic.category_id = ANY($2)
                )
              )
            "#,
        )
        .bind(options.source_id)
        .bind(&options.category_ids)
        .fetch_all(&mut *conn)
        .await?;

        Self::items_from_rows(conn, rows).await
    }

    fn source_from_row(row: SourceRow, edges: Vec<Uuid>) -> FeedSourcePartial {
        let mut source = row.feed_data.0;
        source.id = Some(row.id);
        source.link = feed_source_link(row.id);
        source.category_ids = overlay_categories(&source.category_ids, edges);
        source
    }
}

/// Orders the authoritative edge set by the caller's ordering where
/// the document still records it; edges the document does not mention follow.
fn overlay_categories(document: &[Uuid], edges: Vec<Uuid>) -> Vec<Uuid> {
    let edge_set: HashSet<Uuid> = edges.iter().copied().collect();
    let mut seen = HashSet::new();
    let mut result: Vec<Uuid> = document
        .iter()
        .copied()
        .filter(|id| edge_set.contains(id) && seen.insert(*id))
        .collect();
    result.extend(edges.into_iter().filter(|id| seen.insert(*id)));
    result
}

fn map_category_conflict(e: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return AppError::Conflict(format!("category name already exists: {}", name));
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl FeedSourceStore for PostgresFeedStore {
    async fn store_source(&self, source: &mut FeedSource) -> AppResult<Uuid> {
        let (id, created) = assign_id(&mut source.id);
        source.link = feed_source_link(id);
        let document = source.partial();

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO feeds (id, feed_url, feed_data)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
            SET feed_url = EXCLUDED.feed_url, feed_data = EXCLUDED.feed_data
            "#,
        )
        .bind(id)
        .bind(&document.feed_url)
        .bind(Json(&document))
        .execute(&mut *tx)
        .await?;

        Self::converge_categories(&mut tx, CategoryRelation::Feed, id, &source.category_ids)
            .await?;
        tx.commit().await?;

        tracing::debug!(source_id = %id, created, "Feed source stored");
        Ok(id)
    }

    async fn fetch_source(&self, id: Uuid) -> AppResult<FeedSource> {
        let mut tx = self.begin_snapshot().await?;

        let row = sqlx::query_as::<_, SourceRow>("SELECT id, feed_data FROM feeds WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no feed source found for id: {}", id)))?;

        let edges = Self::category_edges(&mut tx, CategoryRelation::Feed, &[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        let items = Self::query_items(&mut tx, &ItemOptions::for_source(id)).await?;
        tx.commit().await?;

        Ok(Self::source_from_row(row, edges).into_source(items))
    }

    async fn fetch_all_sources(&self) -> AppResult<Vec<FeedSourcePartial>> {
        let mut tx = self.begin_snapshot().await?;

        let rows = sqlx::query_as::<_, SourceRow>(
            "SELECT id, feed_data FROM feeds ORDER BY feed_url, id",
        )
        .fetch_all(&mut *tx)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
        let mut edges = Self::category_edges(&mut tx, CategoryRelation::Feed, &ids).await?;
        tx.commit().await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let row_edges = edges.remove(&row.id).unwrap_or_default();
                Self::source_from_row(row, row_edges)
            })
            .collect())
    }

    async fn delete_source_by_id(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let item_ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM items WHERE source_id = $1")
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM item_categories WHERE item_id = ANY($1)")
            .bind(&item_ids)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM items WHERE source_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM feed_categories WHERE feed_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM feeds WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(source_id = %id, items = item_ids.len(), "Feed source deleted");
        Ok(())
    }
}

#[async_trait]
impl FeedItemStore for PostgresFeedStore {
    async fn store_item(&self, source_id: Uuid, item: &mut FeedItem) -> AppResult<Uuid> {
        item.source_id = Some(source_id);
        let (id, _) = assign_id(&mut item.id);

        let mut tx = self.pool.begin().await?;
        Self::insert_item(&mut tx, id, source_id, item).await?;
        tx.commit().await?;

        Ok(id)
    }

    async fn store_items(&self, source_id: Uuid, items: &mut [FeedItem]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        for item in items.iter_mut() {
            let id = Uuid::new_v4();
            item.id = Some(id);
            item.source_id = Some(source_id);
            Self::insert_item(&mut tx, id, source_id, item).await?;
        }
        tx.commit().await?;

        tracing::debug!(source_id = %source_id, count = items.len(), "Feed items stored");
        Ok(())
    }

    async fn fetch_item_by_id(&self, id: Uuid) -> AppResult<FeedItem> {
        let mut tx = self.begin_snapshot().await?;
        let row = sqlx::query_as::<_, ItemRow>(
            "SELECT id, source_id, item_data FROM items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no item found with id: {}", id)))?;

        let mut items = Self::items_from_rows(&mut tx, vec![row]).await?;
        tx.commit().await?;
        items
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("no item found with id: {}", id)))
    }

    async fn fetch_all_items(&self, options: &ItemOptions) -> AppResult<Vec<FeedItem>> {
        let mut tx = self.begin_snapshot().await?;
        let items = Self::query_items(&mut tx, options).await?;
        tx.commit().await?;
        if items.is_empty() {
            return Err(AppError::NotFound(format!(
                "no items found for options: {:?}",
                options
            )));
        }
        Ok(items)
    }

    async fn delete_item_by_id(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM item_categories WHERE item_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl FeedCategoryStore for PostgresFeedStore {
    async fn store_category(&self, category: &mut FeedCategory) -> AppResult<Uuid> {
        if category.name.trim().is_empty() {
            return Err(AppError::BadRequest("category name is empty".to_string()));
        }

        // The id is only handed back once the name is known to be free.
        let id = category.id.unwrap_or_else(Uuid::new_v4);
        let pool = self.pool.as_ref();
        sqlx::query(
            r#"
            INSERT INTO categories (id, category_name)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE
            SET category_name = EXCLUDED.category_name
            "#,
        )
        .bind(id)
        .bind(&category.name)
        .execute(pool)
        .await
        .map_err(|e| map_category_conflict(e, &category.name))?;

        category.id = Some(id);
        Ok(id)
    }

    async fn fetch_category_by_id(&self, id: Uuid) -> AppResult<FeedCategory> {
        let pool = self.pool.as_ref();
        sqlx::query_as::<_, CategoryRow>(
            "SELECT id, category_name FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(FeedCategory::from)
        .ok_or_else(|| AppError::NotFound(format!("no category found with id: {}", id)))
    }

    async fn fetch_category_by_name(&self, name: &str) -> AppResult<FeedCategory> {
        let pool = self.pool.as_ref();
        sqlx::query_as::<_, CategoryRow>(
            "SELECT id, category_name FROM categories WHERE category_name = $1",
        )
        .bind(name)
        .fetch_optional(pool)
        .await?
        .map(FeedCategory::from)
        .ok_or_else(|| AppError::NotFound(format!("no category found with name: {}", name)))
    }

    async fn fetch_categories_for_ids(&self, ids: &[Uuid]) -> AppResult<Vec<FeedCategory>> {
        let mut seen = HashSet::new();
        let unique: Vec<Uuid> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();
        if unique.is_empty() {
            return Ok(Vec::new());
        }

        let pool = self.pool.as_ref();
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, category_name FROM categories WHERE id = ANY($1)",
        )
        .bind(&unique)
        .fetch_all(pool)
        .await?;

        let mut by_id: HashMap<Uuid, FeedCategory> = rows
            .into_iter()
            .map(|row| (row.id, FeedCategory::from(row)))
            .collect();

        let missing: Vec<String> = unique
            .iter()
            .filter(|id| !by_id.contains_key(id))
            .map(|id| id.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AppError::NotFound(format!(
                "no category found with id: {}",
                missing.join(", ")
            )));
        }

        Ok(unique.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    async fn fetch_all_categories(&self) -> AppResult<Vec<FeedCategory>> {
        let pool = self.pool.as_ref();
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, category_name FROM categories ORDER BY category_name",
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(FeedCategory::from).collect())
    }

    async fn delete_category_by_id(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM item_categories WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM feed_categories WHERE category_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
