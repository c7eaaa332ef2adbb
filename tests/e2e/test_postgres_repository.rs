// Relational backend tests, run against the shared PostgreSQL container.

use crate::e2e::helpers;

use chrono::{TimeZone, Utc};
use helpers::db_pool::PostgresContext;
use helpers::fixtures::item;
use pretty_assertions::assert_eq;
use rss_collector::domain::feed::{
    FeedCategory, FeedCategoryStore, FeedItemStore, FeedSource, FeedSourceStore, ItemOptions,
};
use rss_collector::error::AppError;
use rss_collector::infrastructure::db::{check_connection, connect_with_retry, run_migrations};
use rss_collector::infrastructure::repositories::PostgresFeedStore;
use std::sync::Arc;
use std::time::Duration;
use test_context::test_context;
use uuid::Uuid;

async fn edge_count(ctx: &PostgresContext, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(ctx.pool.as_ref())
        .await
        .unwrap()
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_store_and_fetch_category_source_and_items(ctx: &PostgresContext) {
    let store = &ctx.store;

    let mut tech = FeedCategory::new("Tech");
    let c1 = store.store_category(&mut tech).await.unwrap();
    assert_eq!(tech.id, Some(c1));

    let mut source = FeedSource::new("http://example.com/rss");
    source.title = "Example".to_string();
    source.category_ids = vec![c1];
    let f1 = store.store_source(&mut source).await.unwrap();
    assert_eq!(source.link, format!("/feeds/{}", f1));

    let mut later = item("later", 12);
    later.category_ids = vec![c1];
    let mut earlier = item("earlier", 8);
    let i_later = store.store_item(f1, &mut later).await.unwrap();
    store.store_item(f1, &mut earlier).await.unwrap();

    let fetched = store.fetch_source(f1).await.unwrap();
    assert_eq!(fetched.title, "Example");
    assert_eq!(fetched.category_ids, vec![c1]);
    let titles: Vec<&str> = fetched.items.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["earlier", "later"]);

    let tagged = store
        .fetch_all_items(&ItemOptions::for_category(c1))
        .await
        .unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].id, Some(i_later));
    assert_eq!(tagged[0].source_id, Some(f1));
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_converge_category_relations_to_the_desired_set(ctx: &PostgresContext) {
    let store = &ctx.store;
    let mut ids = Vec::new();
    for name in ["a", "b", "c"] {
        let mut category = FeedCategory::new(name);
        ids.push(store.store_category(&mut category).await.unwrap());
    }

    let mut source = FeedSource::new("http://example.com/rss");
    source.category_ids = vec![ids[0], ids[1]];
    let f1 = store.store_source(&mut source).await.unwrap();

    source.category_ids = vec![ids[1], ids[2]];
    store.store_source(&mut source).await.unwrap();
    assert_eq!(
        store.fetch_source(f1).await.unwrap().category_ids,
        vec![ids[1], ids[2]]
    );
    assert_eq!(edge_count(ctx, "feed_categories").await, 2);

    source.category_ids = vec![];
    store.store_source(&mut source).await.unwrap();
    assert!(store.fetch_source(f1).await.unwrap().category_ids.is_empty());
    assert_eq!(edge_count(ctx, "feed_categories").await, 0);
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_collapse_duplicate_category_ids(ctx: &PostgresContext) {
    let store = &ctx.store;
    let mut tech = FeedCategory::new("Tech");
    let c1 = store.store_category(&mut tech).await.unwrap();

    let mut source = FeedSource::new("http://example.com/rss");
    let f1 = store.store_source(&mut source).await.unwrap();
    let mut entry = item("dup", 9);
    entry.category_ids = vec![c1, c1];
    let i1 = store.store_item(f1, &mut entry).await.unwrap();

    assert_eq!(store.fetch_item_by_id(i1).await.unwrap().category_ids, vec![c1]);
    assert_eq!(edge_count(ctx, "item_categories").await, 1);
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_append_batches_with_fresh_ids(ctx: &PostgresContext) {
    let store = &ctx.store;
    let mut source = FeedSource::new("http://example.com/rss");
    let f1 = store.store_source(&mut source).await.unwrap();
    let other = Uuid::new_v4();

    let mut first = vec![item("one", 1), item("two", 2)];
    first[0].source_id = Some(other);
    store.store_items(f1, &mut first).await.unwrap();
    assert!(first.iter().all(|i| i.id.is_some() && i.source_id == Some(f1)));

    let mut second = vec![item("three", 3)];
    second[0].id = first[0].id;
    store.store_items(f1, &mut second).await.unwrap();
    assert_ne!(second[0].id, first[0].id);

    let items = store
        .fetch_all_items(&ItemOptions::for_source(f1))
        .await
        .unwrap();
    assert_eq!(items.len(), 3);
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_cascade_source_deletion(ctx: &PostgresContext) {
    let store = &ctx.store;
    let mut tech = FeedCategory::new("Tech");
    let c1 = store.store_category(&mut tech).await.unwrap();

    let mut source = FeedSource::new("http://example.com/rss");
    source.category_ids = vec![c1];
    let f1 = store.store_source(&mut source).await.unwrap();
    let mut entry = item("gone", 9);
    entry.category_ids = vec![c1];
    let i1 = store.store_item(f1, &mut entry).await.unwrap();

    store.delete_source_by_id(f1).await.unwrap();

    assert!(store.fetch_source(f1).await.unwrap_err().is_not_found());
    assert!(store.fetch_item_by_id(i1).await.unwrap_err().is_not_found());
    assert_eq!(edge_count(ctx, "feed_categories").await, 0);
    assert_eq!(edge_count(ctx, "item_categories").await, 0);
    // Categories outlive the sources that referenced them
    assert_eq!(store.fetch_category_by_id(c1).await.unwrap().name, "Tech");
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_detach_deleted_categories(ctx: &PostgresContext) {
    let store = &ctx.store;
    let mut tech = FeedCategory::new("Tech");
    let c1 = store.store_category(&mut tech).await.unwrap();
    let mut news = FeedCategory::new("News");
    let c2 = store.store_category(&mut news).await.unwrap();

    let mut source = FeedSource::new("http://example.com/rss");
    source.category_ids = vec![c1, c2];
    let f1 = store.store_source(&mut source).await.unwrap();
    let mut entry = item("tagged", 9);
    entry.category_ids = vec![c1, c2];
    let i1 = store.store_item(f1, &mut entry).await.unwrap();

    store.delete_category_by_id(c1).await.unwrap();

    assert_eq!(store.fetch_item_by_id(i1).await.unwrap().category_ids, vec![c2]);
    assert_eq!(store.fetch_source(f1).await.unwrap().category_ids, vec![c2]);
    assert!(store
        .fetch_all_items(&ItemOptions::for_category(c1))
        .await
        .unwrap_err()
        .is_not_found());
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_enforce_unique_category_names(ctx: &PostgresContext) {
    let store = &ctx.store;
    let mut tech = FeedCategory::new("Tech");
    let c1 = store.store_category(&mut tech).await.unwrap();

    let mut duplicate = FeedCategory::new("Tech");
    let err = store.store_category(&mut duplicate).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    assert!(duplicate.id.is_none());

    tech.name = "Technology".to_string();
    assert_eq!(store.store_category(&mut tech).await.unwrap(), c1);
    assert_eq!(store.fetch_category_by_name("Technology").await.unwrap().id, Some(c1));
    assert!(store.fetch_category_by_name("Tech").await.unwrap_err().is_not_found());

    let mut reused = FeedCategory::new("Tech");
    store.store_category(&mut reused).await.unwrap();
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_fetch_categories_all_or_nothing(ctx: &PostgresContext) {
    let store = &ctx.store;
    let mut art = FeedCategory::new("Art");
    let c1 = store.store_category(&mut art).await.unwrap();
    let mut tech = FeedCategory::new("Tech");
    let c2 = store.store_category(&mut tech).await.unwrap();

    let found = store.fetch_categories_for_ids(&[c2, c1]).await.unwrap();
    let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Tech", "Art"]);

    let missing = Uuid::new_v4();
    let err = store
        .fetch_categories_for_ids(&[c1, missing])
        .await
        .unwrap_err();
    assert!(err.to_string().contains(&missing.to_string()));

    let all: Vec<String> = store
        .fetch_all_categories()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(all, vec!["Art", "Tech"]);
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_keep_item_payload_fields(ctx: &PostgresContext) {
    let store = &ctx.store;
    let mut source = FeedSource::new("http://example.com/rss");
    let f1 = store.store_source(&mut source).await.unwrap();

    let mut entry = item("payload", 9);
    entry.updated = Some(Utc.with_ymd_and_hms(2024, 3, 15, 10, 0, 0).unwrap());
    entry.author = "Editor".to_string();
    entry.categories = vec!["rust".to_string()];
    entry.custom.insert("comments".to_string(), "12".to_string());
    let i1 = store.store_item(f1, &mut entry).await.unwrap();

    let fetched = store.fetch_item_by_id(i1).await.unwrap();
    assert_eq!(fetched, entry);
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_rerun_migrations_without_changes(ctx: &PostgresContext) {
    run_migrations(ctx.pool.as_ref(), None).await.unwrap();
    assert!(check_connection(ctx.pool.as_ref()).await.unwrap());

    let pool = connect_with_retry(&ctx.database_url, 1, Duration::from_millis(10))
        .await
        .unwrap();
    run_migrations(&pool, None).await.unwrap();
}

#[test_context(PostgresContext)]
#[tokio::test]
async fn it_should_never_fetch_a_partially_deleted_source(ctx: &PostgresContext) {
    let store = Arc::new(PostgresFeedStore::new(ctx.pool.clone()));

    for round in 0..20 {
        let mut source = FeedSource::new(format!("http://example.com/{}/rss", round));
        let source_id = store.store_source(&mut source).await.unwrap();
        let mut items: Vec<_> = (0..10).map(|hour| item("entry", hour)).collect();
        store.store_items(source_id, &mut items).await.unwrap();

        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..5 {
                    match store.fetch_source(source_id).await {
                        Ok(fetched) => seen.push(fetched.items.len()),
                        Err(e) => assert!(e.is_not_found(), "unexpected error: {}", e),
                    }
                }
                seen
            })
        };
        store.delete_source_by_id(source_id).await.unwrap();

        for count in reader.await.unwrap() {
            assert_eq!(count, 10, "fetched a source with a partial item list");
        }
    }
}
